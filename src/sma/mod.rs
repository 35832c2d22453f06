pub mod frame;
pub mod meter;
