use crate::prelude::*;

use serde::Deserialize;

/// Which export signal arms and disarms the control band.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum GateSignal {
    #[default]
    Raw,
    Filtered,
}

/// Outcome of one control evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decision {
    pub target_pct: u8,
    pub actuate: bool,
}

/// Everything `decide` needs for one evaluation.
#[derive(Clone, Copy, Debug)]
pub struct ControlInput {
    pub raw_export_w: f64,
    pub filtered_export_w: f64,
    pub inverter_power_w: f64,
    pub capacity_w: f64,
    pub last_pct: u8,
}

/// Work out the active power limit the inverter should run at.
///
/// The target is the output percentage which, at the current production
/// level, would bring the filtered export back down to `max_export_w`.
/// Outside the hysteresis band, or within `deadband_pct` of the last
/// commanded value, the limit is left where it is. A lower limit is
/// always applied immediately.
pub fn decide(input: &ControlInput, control: &config::Control) -> Decision {
    let hold = Decision {
        target_pct: input.last_pct,
        actuate: false,
    };

    if !input.capacity_w.is_finite() || input.capacity_w <= 0.0 {
        debug!(
            "control:capacity {}W unusable, holding limit at {}%",
            input.capacity_w, input.last_pct
        );
        return hold;
    }

    let over_w = input.filtered_export_w - control.max_export_w();
    let desired_w = input.inverter_power_w - over_w;
    let target_pct = (desired_w / input.capacity_w * 100.0).round().clamp(0.0, 100.0) as u8;

    let gate_w = match control.gate_signal() {
        GateSignal::Raw => input.raw_export_w,
        GateSignal::Filtered => input.filtered_export_w,
    };

    let in_band =
        gate_w > control.start_threshold_w() || gate_w < control.reset_threshold_w();
    if !in_band {
        return hold;
    }

    let delta = target_pct as i16 - input.last_pct as i16;
    let actuate = delta < 0 || delta > control.deadband_pct() as i16;

    Decision {
        target_pct: if actuate { target_pct } else { input.last_pct },
        actuate,
    }
}
