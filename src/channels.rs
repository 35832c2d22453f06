use crate::prelude::*;
use crate::sma::meter::ChannelData;

#[derive(Debug, Clone)]
pub struct Channels {
    pub from_meter: broadcast::Sender<ChannelData>,
    pub to_meter: broadcast::Sender<ChannelData>,
}

impl Default for Channels {
    fn default() -> Self {
        Self::new()
    }
}

impl Channels {
    pub fn new() -> Self {
        Self {
            from_meter: Self::channel(),
            to_meter: Self::channel(),
        }
    }

    fn channel<T: Clone>() -> broadcast::Sender<T> {
        broadcast::channel(2048).0
    }
}
