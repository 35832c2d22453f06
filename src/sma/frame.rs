use crate::prelude::*;

use nom_derive::{Nom, Parse};

/// Fixed length of an energy meter telegram.
pub const FRAME_LEN: usize = 608;

/// The slice of a meter telegram the limiter cares about.
///
/// Telegrams are big-endian. The serial number sits at offset 28,
/// grid import power at 32 and grid export power at 52, both reported
/// in tenths of a watt.
#[derive(PartialEq, Clone, Debug, Nom)]
#[nom(BigEndian)]
pub struct MeterReading {
    #[nom(SkipBefore(28))]
    pub meter_id: u32,

    #[nom(Parse = "Utils::be_u32_div10")]
    pub import_w: f64,

    #[nom(SkipBefore(16))]
    #[nom(Parse = "Utils::be_u32_div10")]
    pub export_w: f64,
}

impl MeterReading {
    /// Power flowing towards the grid. Negative while importing.
    pub fn net_export_w(&self) -> f64 {
        self.export_w - self.import_w
    }

    /// Decode one datagram, keeping only telegrams from `target_id`.
    pub fn decode(buf: &[u8], target_id: u32) -> Result<Option<Self>, DecodeError> {
        if buf.len() != FRAME_LEN {
            return Err(DecodeError::Length(buf.len()));
        }

        let (_, reading) = Self::parse(buf).map_err(|_| DecodeError::Truncated)?;

        if reading.meter_id != target_id {
            return Ok(None);
        }

        Ok(Some(reading))
    }
}
