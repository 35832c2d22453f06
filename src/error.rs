use std::time::Duration;

use thiserror::Error;

/// Failures while decoding a meter telegram. Always recovered locally;
/// the datagram is dropped and the receive loop carries on.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("frame length {0} is not a meter telegram")]
    Length(usize),

    #[error("meter telegram truncated")]
    Truncated,
}

/// Failures while establishing an inverter session.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connect to {addr} timed out after {timeout:?}")]
    Timeout { addr: String, timeout: Duration },

    #[error("connect to {addr} failed: {detail}")]
    Refused { addr: String, detail: String },
}

/// Failures during a register call on a live session. Any of these tears
/// the session down; the next control cycle reconnects.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("register call timed out after {0:?}")]
    Timeout(Duration),

    #[error("register call failed: {0}")]
    Io(String),

    #[error("device exception: {0}")]
    Exception(String),

    #[error("register {register}: expected {expected} words, got {got}")]
    ShortResponse {
        register: u16,
        expected: usize,
        got: usize,
    },

    #[error("no active connection")]
    NotConnected,
}
