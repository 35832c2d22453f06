pub use std::io::Write;
pub use std::sync::Arc;

pub use anyhow::{anyhow, bail, Error, Result};
pub use log::{debug, error, info, trace, warn};
pub use tokio::sync::broadcast;

pub use crate::channels::Channels;
pub use crate::config::{self, Config};
pub use crate::control;
pub use crate::coordinator::{self, Coordinator};
pub use crate::error::{ConnectionError, DecodeError, DeviceError};
pub use crate::filter;
pub use crate::options::Options;
pub use crate::sma;
pub use crate::solaredge;
pub use crate::utils::Utils;
