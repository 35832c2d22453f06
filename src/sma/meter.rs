use crate::prelude::*;

use {
    crate::sma::frame::MeterReading,
    bytes::BytesMut,
    net2::UdpBuilder,
    std::net::Ipv4Addr,
    tokio::net::UdpSocket,
};

#[derive(Clone, Debug, PartialEq)]
pub enum ChannelData {
    Reading(MeterReading),
    Shutdown,
}

#[derive(Clone)]
pub struct Meter {
    config: Config,
    channels: Channels,
}

impl Meter {
    pub fn new(config: Config, channels: Channels) -> Self {
        Self { config, channels }
    }

    pub async fn start(&self) -> Result<()> {
        let meter = self.config.meter();
        let socket = Self::bind(meter.group(), meter.port())?;

        info!(
            "meter:listening for {} on {}:{}",
            meter.target_id(),
            meter.group(),
            meter.port()
        );

        self.receiver(socket).await
    }

    pub fn stop(&self) {
        let _ = self.channels.to_meter.send(ChannelData::Shutdown);
    }

    fn bind(group: Ipv4Addr, port: u16) -> Result<UdpSocket> {
        let socket = UdpBuilder::new_v4()?
            .reuse_address(true)?
            .bind((Ipv4Addr::UNSPECIFIED, port))?;
        socket.set_nonblocking(true)?;

        let socket = UdpSocket::from_std(socket)?;
        socket.join_multicast_v4(group, Ipv4Addr::UNSPECIFIED)?;

        Ok(socket)
    }

    async fn receiver(&self, socket: UdpSocket) -> Result<()> {
        let mut shutdown_rx = self.channels.to_meter.subscribe();
        let target_id = self.config.meter().target_id();
        let mut buf = BytesMut::with_capacity(2048);

        loop {
            buf.clear();

            tokio::select! {
                result = socket.recv_buf_from(&mut buf) => {
                    let (_, addr) = result?;

                    match MeterReading::decode(&buf, target_id) {
                        Ok(Some(reading)) => {
                            trace!("meter:{} -> {:?}", addr, reading);

                            if self.channels.from_meter.send(ChannelData::Reading(reading)).is_err() {
                                bail!("send(from_meter) failed - channel closed?");
                            }
                        }
                        Ok(None) => trace!("meter:ignoring telegram from other meter at {}", addr),
                        Err(err) => trace!("meter:ignoring datagram from {}: {}", addr, err),
                    }
                }
                message = shutdown_rx.recv() => {
                    match message {
                        Ok(ChannelData::Shutdown) => {
                            info!("meter:receiver exiting");
                            break;
                        }
                        Ok(_) => {}
                        Err(_) => break,
                    }
                }
            }
        }

        Ok(())
    }
}
