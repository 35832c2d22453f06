#![allow(dead_code)]

use export_limiter::prelude::*;

use {
    async_trait::async_trait,
    export_limiter::control::GateSignal,
    export_limiter::filter::FilterKind,
    export_limiter::sma::frame::{MeterReading, FRAME_LEN},
    export_limiter::solaredge::transport::{Connector, RegisterTransport},
    std::collections::HashMap,
    std::net::Ipv4Addr,
    std::sync::Mutex,
    std::time::Duration,
};

// A register bank standing in for the inverter. Writes are applied to
// the bank as well as recorded, so a later read sees what was written.
#[derive(Default)]
pub struct FakeDevice {
    pub holdings: HashMap<u16, Vec<u16>>,
    pub writes: Vec<(u16, Vec<u16>)>,
    pub fail_reads: bool,
    pub fail_writes: bool,
    pub fail_connect: bool,
    pub connects: u64,
}

impl FakeDevice {
    pub fn set_holding(&mut self, register: u16, words: Vec<u16>) {
        self.holdings.insert(register, words);
    }
}

pub struct FakeTransport {
    device: Arc<Mutex<FakeDevice>>,
}

impl FakeTransport {
    fn record_write(&self, register: u16, values: Vec<u16>) -> Result<(), DeviceError> {
        let mut device = self.device.lock().unwrap();
        if device.fail_writes {
            return Err(DeviceError::Io("connection reset by peer".to_string()));
        }
        device.writes.push((register, values.clone()));
        device.holdings.insert(register, values);
        Ok(())
    }
}

#[async_trait]
impl RegisterTransport for FakeTransport {
    async fn read_holding_registers(
        &mut self,
        register: u16,
        count: u16,
    ) -> Result<Vec<u16>, DeviceError> {
        let device = self.device.lock().unwrap();
        if device.fail_reads {
            return Err(DeviceError::Io("connection reset by peer".to_string()));
        }
        match device.holdings.get(&register) {
            Some(words) => Ok(words.iter().take(count as usize).cloned().collect()),
            None => Err(DeviceError::Exception("illegal data address".to_string())),
        }
    }

    async fn write_single_register(
        &mut self,
        register: u16,
        value: u16,
    ) -> Result<(), DeviceError> {
        self.record_write(register, vec![value])
    }

    async fn write_multiple_registers(
        &mut self,
        register: u16,
        values: &[u16],
    ) -> Result<(), DeviceError> {
        self.record_write(register, values.to_vec())
    }
}

pub struct FakeConnector {
    device: Arc<Mutex<FakeDevice>>,
}

impl FakeConnector {
    pub fn new(device: Arc<Mutex<FakeDevice>>) -> Self {
        Self { device }
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self) -> Result<Box<dyn RegisterTransport>, ConnectionError> {
        let mut device = self.device.lock().unwrap();
        if device.fail_connect {
            return Err(ConnectionError::Refused {
                addr: "localhost:1502".to_string(),
                detail: "connection refused".to_string(),
            });
        }
        device.connects += 1;

        Ok(Box::new(FakeTransport {
            device: self.device.clone(),
        }))
    }
}

pub fn test_config() -> Config {
    Config {
        meter: config::Meter {
            group: Ipv4Addr::new(239, 12, 255, 254),
            port: 9522,
            target_id: 66560,
        },
        inverter: config::Inverter {
            host: "localhost".to_string(),
            port: 1502,
            unit_id: 1,
            register_timeout: Duration::from_millis(2000),
        },
        control: config::Control {
            max_export_w: 6500.0,
            start_threshold_w: 1000.0,
            reset_threshold_w: 0.0,
            deadband_pct: 2,
            gate_signal: GateSignal::Raw,
        },
        filter: FilterKind::MovingAverage,
        loglevel: "info".to_string(),
    }
}

// Build a meter telegram with the given powers in tenths of a watt.
pub fn meter_frame(meter_id: u32, import_dw: u32, export_dw: u32) -> Vec<u8> {
    let mut buf = vec![0u8; FRAME_LEN];
    buf[28..32].copy_from_slice(&meter_id.to_be_bytes());
    buf[32..36].copy_from_slice(&import_dw.to_be_bytes());
    buf[52..56].copy_from_slice(&export_dw.to_be_bytes());
    buf
}

pub fn reading(export_w: f64) -> MeterReading {
    MeterReading {
        meter_id: 66560,
        import_w: 0.0,
        export_w,
    }
}

pub async fn wait_for<F: Fn() -> bool>(what: &str, condition: F) {
    let deadline = std::time::Instant::now() + Duration::from_secs(2);

    while !condition() {
        if std::time::Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
