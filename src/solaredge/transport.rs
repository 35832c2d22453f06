use crate::prelude::*;

use {
    async_trait::async_trait,
    std::net::SocketAddr,
    std::time::Duration,
    tokio_modbus::client::{tcp, Context, Reader, Writer},
    tokio_modbus::Slave,
};

/// Register-level operations on an established session. Every call is
/// bounded by the configured timeout.
#[async_trait]
pub trait RegisterTransport: Send {
    async fn read_holding_registers(
        &mut self,
        register: u16,
        count: u16,
    ) -> Result<Vec<u16>, DeviceError>;

    async fn write_single_register(
        &mut self,
        register: u16,
        value: u16,
    ) -> Result<(), DeviceError>;

    async fn write_multiple_registers(
        &mut self,
        register: u16,
        values: &[u16],
    ) -> Result<(), DeviceError>;
}

/// Produces fresh transports. The session layer calls this once per
/// reconnect attempt.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn RegisterTransport>, ConnectionError>;
}

// ModbusTransport {{{
pub struct ModbusTransport {
    ctx: Context,
    timeout: Duration,
}

impl ModbusTransport {
    pub fn new(ctx: Context, timeout: Duration) -> Self {
        Self { ctx, timeout }
    }
}

#[async_trait]
impl RegisterTransport for ModbusTransport {
    async fn read_holding_registers(
        &mut self,
        register: u16,
        count: u16,
    ) -> Result<Vec<u16>, DeviceError> {
        let call = self.ctx.read_holding_registers(register, count);

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(Ok(words))) => Ok(words),
            Ok(Ok(Err(exception))) => Err(DeviceError::Exception(exception.to_string())),
            Ok(Err(err)) => Err(DeviceError::Io(err.to_string())),
            Err(_) => Err(DeviceError::Timeout(self.timeout)),
        }
    }

    async fn write_single_register(
        &mut self,
        register: u16,
        value: u16,
    ) -> Result<(), DeviceError> {
        let call = self.ctx.write_single_register(register, value);

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(exception))) => Err(DeviceError::Exception(exception.to_string())),
            Ok(Err(err)) => Err(DeviceError::Io(err.to_string())),
            Err(_) => Err(DeviceError::Timeout(self.timeout)),
        }
    }

    async fn write_multiple_registers(
        &mut self,
        register: u16,
        values: &[u16],
    ) -> Result<(), DeviceError> {
        let call = self.ctx.write_multiple_registers(register, values);

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(exception))) => Err(DeviceError::Exception(exception.to_string())),
            Ok(Err(err)) => Err(DeviceError::Io(err.to_string())),
            Err(_) => Err(DeviceError::Timeout(self.timeout)),
        }
    }
} // }}}

// ModbusConnector {{{
pub struct ModbusConnector {
    host: String,
    port: u16,
    slave: Slave,
    timeout: Duration,
}

impl ModbusConnector {
    pub fn new(host: String, port: u16, unit_id: u8, timeout: Duration) -> Self {
        Self {
            host,
            port,
            slave: Slave(unit_id),
            timeout,
        }
    }

    async fn resolve(&self) -> Result<SocketAddr, ConnectionError> {
        let addr = format!("{}:{}", self.host, self.port);

        let first = tokio::net::lookup_host(&addr)
            .await
            .map_err(|err| ConnectionError::Refused {
                addr: addr.clone(),
                detail: err.to_string(),
            })?
            .next();

        first.ok_or(ConnectionError::Refused {
            addr,
            detail: "no addresses resolved".to_string(),
        })
    }
}

#[async_trait]
impl Connector for ModbusConnector {
    async fn connect(&self) -> Result<Box<dyn RegisterTransport>, ConnectionError> {
        let socket_addr = self.resolve().await?;
        let addr = format!("{}:{}", self.host, self.port);

        match tokio::time::timeout(self.timeout, tcp::connect_slave(socket_addr, self.slave)).await
        {
            Ok(Ok(ctx)) => Ok(Box::new(ModbusTransport::new(ctx, self.timeout))),
            Ok(Err(err)) => Err(ConnectionError::Refused {
                addr,
                detail: err.to_string(),
            }),
            Err(_) => Err(ConnectionError::Timeout {
                addr,
                timeout: self.timeout,
            }),
        }
    }
} // }}}
