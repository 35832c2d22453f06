use crate::prelude::*;

use crate::solaredge::registers;
use crate::solaredge::transport::{Connector, RegisterTransport};

enum Session {
    Disconnected,
    Connected(Box<dyn RegisterTransport>),
}

/// One inverter, one session. Any failed register call drops the session
/// back to `Disconnected`; reconnecting is the caller's decision.
pub struct Inverter {
    connector: Arc<dyn Connector>,
    session: Session,
}

impl Inverter {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            session: Session::Disconnected,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.session, Session::Connected(_))
    }

    pub async fn connect(&mut self) -> Result<(), ConnectionError> {
        let transport = self.connector.connect().await?;
        self.session = Session::Connected(transport);

        Ok(())
    }

    pub fn disconnect(&mut self) {
        self.session = Session::Disconnected;
    }

    pub async fn read_inverter_power(&mut self) -> Result<f64, DeviceError> {
        let words = self.read_registers(registers::AC_POWER, 2).await?;

        Ok(registers::decode_scaled_i16(words[0], words[1]))
    }

    pub async fn read_control_enabled(&mut self) -> Result<bool, DeviceError> {
        let words = self
            .read_registers(registers::ADVANCED_POWER_CONTROL_ENABLE, 2)
            .await?;

        Ok(registers::decode_control_enabled(&words))
    }

    pub async fn set_control_enabled(&mut self, on: bool) -> Result<(), DeviceError> {
        self.write_registers(
            registers::ADVANCED_POWER_CONTROL_ENABLE,
            &registers::encode_control_enabled(on),
        )
        .await
    }

    pub async fn set_power_limit_percent(&mut self, pct: u8) -> Result<(), DeviceError> {
        self.write_registers(registers::ACTIVE_POWER_LIMIT, &[pct.min(100) as u16])
            .await
    }

    pub async fn read_max_active_power(&mut self) -> Result<f64, DeviceError> {
        let words = self.read_registers(registers::MAX_ACTIVE_POWER, 2).await?;

        Ok(registers::decode_float32(words[0], words[1]))
    }

    async fn read_registers(&mut self, register: u16, count: u16) -> Result<Vec<u16>, DeviceError> {
        let result = match &mut self.session {
            Session::Connected(transport) => transport.read_holding_registers(register, count).await,
            Session::Disconnected => return Err(DeviceError::NotConnected),
        };

        match result {
            Ok(words) if words.len() == count as usize => Ok(words),
            Ok(words) => {
                self.session = Session::Disconnected;
                Err(DeviceError::ShortResponse {
                    register,
                    expected: count as usize,
                    got: words.len(),
                })
            }
            Err(err) => {
                self.session = Session::Disconnected;
                Err(err)
            }
        }
    }

    async fn write_registers(&mut self, register: u16, values: &[u16]) -> Result<(), DeviceError> {
        let result = match &mut self.session {
            Session::Connected(transport) => {
                if values.len() == 1 {
                    transport.write_single_register(register, values[0]).await
                } else {
                    transport.write_multiple_registers(register, values).await
                }
            }
            Session::Disconnected => return Err(DeviceError::NotConnected),
        };

        if result.is_err() {
            self.session = Session::Disconnected;
        }

        result
    }
}
