use crate::prelude::*;

use {
    crate::control::ControlInput,
    crate::filter::{Filter, SignalFilter},
    crate::sma::frame::MeterReading,
    crate::sma::meter::ChannelData,
    crate::solaredge::inverter::Inverter,
    crate::solaredge::transport::{Connector, ModbusConnector},
    std::sync::Mutex,
};

#[derive(Default)]
pub struct LoopStats {
    pub frames_processed: u64,
    pub frames_skipped: u64,
    // Register write counters
    pub limit_writes: u64,
    pub enable_writes: u64,
    // Connection counters
    pub connects: u64,
    pub connect_errors: u64,
    pub device_errors: u64,
}

impl LoopStats {
    pub fn print_summary(&self) {
        info!("Control Loop Statistics:");
        info!("  Frames processed: {}", self.frames_processed);
        info!("  Frames skipped: {}", self.frames_skipped);
        info!("  Register Writes:");
        info!("    Power limit: {}", self.limit_writes);
        info!("    Control enable: {}", self.enable_writes);
        info!("  Connection Stats:");
        info!("    Connects: {}", self.connects);
        info!("    Connect errors: {}", self.connect_errors);
        info!("    Device errors: {}", self.device_errors);
    }
}

#[derive(Default)]
struct ControlState {
    last_pct: u8,
    control_enabled: bool,
}

#[derive(Clone)]
pub struct Coordinator {
    config: Config,
    channels: Channels,
    connector: Arc<dyn Connector>,
    pub shared_stats: Arc<Mutex<LoopStats>>,
}

impl Coordinator {
    pub fn new(config: Config, channels: Channels) -> Self {
        let inverter = config.inverter();
        let connector = Arc::new(ModbusConnector::new(
            inverter.host().to_string(),
            inverter.port(),
            inverter.unit_id(),
            inverter.register_timeout(),
        ));

        Self::new_with_connector(config, channels, connector)
    }

    pub fn new_with_connector(
        config: Config,
        channels: Channels,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            config,
            channels,
            connector,
            shared_stats: Arc::new(Mutex::new(LoopStats::default())),
        }
    }

    pub async fn start(&self) -> Result<()> {
        let mut from_meter = self.channels.from_meter.subscribe();

        let mut inverter = Inverter::new(self.connector.clone());
        let mut filter: Filter = self.config.filter().into();
        let mut state = ControlState::default();
        let mut capacity_w: Option<f64> = None;

        self.establish(&mut inverter, &mut state, &mut capacity_w)
            .await;

        loop {
            match from_meter.recv().await {
                Ok(ChannelData::Reading(reading)) => {
                    self.process_reading(
                        &reading,
                        &mut inverter,
                        &mut filter,
                        &mut state,
                        &mut capacity_w,
                    )
                    .await;
                }
                Ok(ChannelData::Shutdown) => {
                    info!("coordinator:exiting");
                    break;
                }
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!("coordinator:lagged behind meter, dropped {} readings", count);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }

        Ok(())
    }

    pub fn stop(&self) {
        let _ = self.channels.from_meter.send(ChannelData::Shutdown);
    }

    // Bring the session to a usable state. Reconnecting invalidates the
    // last known power control flag; capacity is read once and kept.
    async fn establish(
        &self,
        inverter: &mut Inverter,
        state: &mut ControlState,
        capacity_w: &mut Option<f64>,
    ) -> bool {
        if !inverter.is_connected() {
            match inverter.connect().await {
                Ok(()) => {
                    state.control_enabled = false;
                    if let Ok(mut stats) = self.shared_stats.lock() {
                        stats.connects += 1;
                    }
                    info!(
                        "inverter:connected to {}:{}",
                        self.config.inverter().host(),
                        self.config.inverter().port()
                    );
                }
                Err(err) => {
                    if let Ok(mut stats) = self.shared_stats.lock() {
                        stats.connect_errors += 1;
                    }
                    error!("inverter:connect failed: {}", err);
                    return false;
                }
            }
        }

        if capacity_w.is_none() {
            match inverter.read_max_active_power().await {
                Ok(watts) => {
                    info!("inverter:max active power: {}W", watts);
                    *capacity_w = Some(watts);
                }
                Err(err) => {
                    if let Ok(mut stats) = self.shared_stats.lock() {
                        stats.device_errors += 1;
                    }
                    error!("inverter:reading max active power failed: {}", err);
                    return false;
                }
            }
        }

        true
    }

    async fn process_reading(
        &self,
        reading: &MeterReading,
        inverter: &mut Inverter,
        filter: &mut Filter,
        state: &mut ControlState,
        capacity_w: &mut Option<f64>,
    ) {
        let raw_w = reading.net_export_w();
        let filtered_w = filter.apply(raw_w);

        if !self.establish(inverter, state, capacity_w).await {
            if let Ok(mut stats) = self.shared_stats.lock() {
                stats.frames_skipped += 1;
            }
            return;
        }

        let inverter_power_w = match inverter.read_inverter_power().await {
            Ok(watts) => watts,
            Err(err) => {
                self.device_error("reading inverter power", &err);
                return;
            }
        };

        let input = ControlInput {
            raw_export_w: raw_w,
            filtered_export_w: filtered_w,
            inverter_power_w,
            capacity_w: capacity_w.unwrap_or(f64::NAN),
            last_pct: state.last_pct,
        };
        let decision = control::decide(&input, self.config.control());

        let mut enabled_now = false;
        if decision.actuate {
            if !state.control_enabled {
                match inverter.read_control_enabled().await {
                    Ok(true) => state.control_enabled = true,
                    Ok(false) => {
                        if let Err(err) = inverter.set_control_enabled(true).await {
                            self.device_error("enabling power control", &err);
                            return;
                        }
                        state.control_enabled = true;
                        enabled_now = true;
                        if let Ok(mut stats) = self.shared_stats.lock() {
                            stats.enable_writes += 1;
                        }
                        info!("inverter:enabled advanced power control");
                    }
                    Err(err) => {
                        self.device_error("reading power control state", &err);
                        return;
                    }
                }
            }

            if let Err(err) = inverter.set_power_limit_percent(decision.target_pct).await {
                self.device_error("writing power limit", &err);
                return;
            }

            state.last_pct = decision.target_pct;
            if let Ok(mut stats) = self.shared_stats.lock() {
                stats.limit_writes += 1;
            }
        }

        if let Ok(mut stats) = self.shared_stats.lock() {
            stats.frames_processed += 1;
        }

        let limit = if decision.actuate {
            format!("{}%", decision.target_pct)
        } else {
            "-".to_string()
        };
        info!(
            "export {:.1}W\tfiltered {:.1}W\tinverter {:.1}W\tover {:.1}W\tlimit {}{}",
            raw_w,
            filtered_w,
            inverter_power_w,
            filtered_w - self.config.control().max_export_w(),
            limit,
            if enabled_now { " [enabled power control]" } else { "" },
        );
    }

    fn device_error(&self, what: &str, err: &DeviceError) {
        if let Ok(mut stats) = self.shared_stats.lock() {
            stats.device_errors += 1;
            stats.frames_skipped += 1;
        }
        error!("inverter:{} failed: {}", what, err);
    }
}
