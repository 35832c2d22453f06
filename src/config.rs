use crate::prelude::*;

use serde::Deserialize;
use serde_with::{serde_as, DurationMilliSeconds};
use std::net::Ipv4Addr;
use std::time::Duration;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub meter: Meter,

    pub inverter: Inverter,

    #[serde(default)]
    pub control: Control,

    #[serde(default)]
    pub filter: filter::FilterKind,

    #[serde(default = "Config::default_loglevel")]
    pub loglevel: String,
}

// Meter {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Meter {
    #[serde(default = "Config::default_meter_group")]
    pub group: Ipv4Addr,

    #[serde(default = "Config::default_meter_port")]
    pub port: u16,

    #[serde(default = "Config::default_meter_target_id")]
    pub target_id: u32,
}

impl Default for Meter {
    fn default() -> Self {
        Self {
            group: Config::default_meter_group(),
            port: Config::default_meter_port(),
            target_id: Config::default_meter_target_id(),
        }
    }
}

impl Meter {
    pub fn group(&self) -> Ipv4Addr {
        self.group
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn target_id(&self) -> u32 {
        self.target_id
    }
} // }}}

// Inverter {{{
#[serde_as]
#[derive(Clone, Debug, Deserialize)]
pub struct Inverter {
    pub host: String,

    #[serde(default = "Config::default_inverter_port")]
    pub port: u16,

    #[serde(default = "Config::default_inverter_unit_id")]
    pub unit_id: u8,

    #[serde_as(as = "DurationMilliSeconds")]
    #[serde(default = "Config::default_register_timeout")]
    pub register_timeout: Duration,
}

impl Inverter {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn unit_id(&self) -> u8 {
        self.unit_id
    }

    pub fn register_timeout(&self) -> Duration {
        self.register_timeout
    }
} // }}}

// Control {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Control {
    #[serde(default = "Config::default_max_export_w")]
    pub max_export_w: f64,

    #[serde(default = "Config::default_start_threshold_w")]
    pub start_threshold_w: f64,

    #[serde(default = "Config::default_reset_threshold_w")]
    pub reset_threshold_w: f64,

    #[serde(default = "Config::default_deadband_pct")]
    pub deadband_pct: u8,

    #[serde(default)]
    pub gate_signal: control::GateSignal,
}

impl Default for Control {
    fn default() -> Self {
        Self {
            max_export_w: Config::default_max_export_w(),
            start_threshold_w: Config::default_start_threshold_w(),
            reset_threshold_w: Config::default_reset_threshold_w(),
            deadband_pct: Config::default_deadband_pct(),
            gate_signal: control::GateSignal::default(),
        }
    }
}

impl Control {
    pub fn max_export_w(&self) -> f64 {
        self.max_export_w
    }

    pub fn start_threshold_w(&self) -> f64 {
        self.start_threshold_w
    }

    pub fn reset_threshold_w(&self) -> f64 {
        self.reset_threshold_w
    }

    pub fn deadband_pct(&self) -> u8 {
        self.deadband_pct
    }

    pub fn gate_signal(&self) -> control::GateSignal {
        self.gate_signal
    }
} // }}}

impl Config {
    pub fn new(file: String) -> Result<Self> {
        let content = std::fs::read_to_string(&file)
            .map_err(|err| anyhow!("config.rs:error reading {}: {}", file, err))?;

        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    pub fn meter(&self) -> &Meter {
        &self.meter
    }

    pub fn inverter(&self) -> &Inverter {
        &self.inverter
    }

    pub fn control(&self) -> &Control {
        &self.control
    }

    pub fn filter(&self) -> filter::FilterKind {
        self.filter
    }

    pub fn loglevel(&self) -> String {
        self.loglevel.clone()
    }

    pub fn log_summary(&self) {
        info!("Configuration:");
        info!("  Meter: {}:{}", self.meter.group, self.meter.port);
        info!("    Target id: {}", self.meter.target_id);
        info!("  Inverter: {}:{} unit {}", self.inverter.host, self.inverter.port, self.inverter.unit_id);
        info!("    Register timeout: {}ms", self.inverter.register_timeout.as_millis());
        info!("  Control:");
        info!("    Max export: {}W", self.control.max_export_w);
        info!("    Start threshold: {}W", self.control.start_threshold_w);
        info!("    Reset threshold: {}W", self.control.reset_threshold_w);
        info!("    Deadband: {}%", self.control.deadband_pct);
        info!("    Gate signal: {:?}", self.control.gate_signal);
        info!("  Filter: {:?}", self.filter);
        info!("  Log Level: {}", self.loglevel);
    }

    fn validate(&self) -> Result<()> {
        if self.inverter.host.is_empty() {
            return Err(anyhow!("config.rs:inverter.host cannot be empty"));
        }
        if self.inverter.port == 0 {
            bail!("inverter.port must be between 1 and 65535");
        }
        if self.inverter.register_timeout.is_zero() {
            return Err(anyhow!("config.rs:Invalid register timeout: 0"));
        }

        if self.meter.port == 0 {
            bail!("meter.port must be between 1 and 65535");
        }
        if !self.meter.group.is_multicast() {
            bail!("meter.group {} is not a multicast address", self.meter.group);
        }

        if self.control.start_threshold_w < self.control.reset_threshold_w {
            bail!(
                "control.start_threshold_w ({}) must not be below control.reset_threshold_w ({})",
                self.control.start_threshold_w,
                self.control.reset_threshold_w
            );
        }
        if self.control.deadband_pct > 100 {
            bail!("control.deadband_pct must be between 0 and 100");
        }

        Ok(())
    }

    fn default_meter_group() -> Ipv4Addr {
        Ipv4Addr::new(239, 12, 255, 254)
    }

    fn default_meter_port() -> u16 {
        9522
    }

    fn default_meter_target_id() -> u32 {
        66560
    }

    fn default_inverter_port() -> u16 {
        1502
    }

    fn default_inverter_unit_id() -> u8 {
        1
    }

    fn default_register_timeout() -> Duration {
        Duration::from_millis(2000)
    }

    fn default_max_export_w() -> f64 {
        6600.0
    }

    fn default_start_threshold_w() -> f64 {
        5000.0
    }

    fn default_reset_threshold_w() -> f64 {
        0.0
    }

    fn default_deadband_pct() -> u8 {
        2
    }

    fn default_loglevel() -> String {
        "info".to_string()
    }
}
