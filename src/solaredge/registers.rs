/// AC power output, (value, scale factor) pair per the SunSpec inverter model.
pub const AC_POWER: u16 = 40083;

/// Two-register advanced power control block. Enable flag in the second word.
pub const ADVANCED_POWER_CONTROL_ENABLE: u16 = 61762;

/// Active power limit in percent of rated output, 0 to 100.
pub const ACTIVE_POWER_LIMIT: u16 = 61441;

/// Rated active power as a float32, low word first.
pub const MAX_ACTIVE_POWER: u16 = 0xF304;

/// Decode a (value, scale factor) register pair. Both words are signed.
pub fn decode_scaled_i16(value: u16, scale: u16) -> f64 {
    (value as i16 as f64) * 10f64.powi(scale as i16 as i32)
}

/// Decode a float32 spread over two registers, low word first.
pub fn decode_float32(low: u16, high: u16) -> f64 {
    f32::from_bits(((high as u32) << 16) | low as u32) as f64
}

/// Register image for the advanced power control block. The first word
/// is reserved and always written as zero.
pub fn encode_control_enabled(on: bool) -> [u16; 2] {
    [0, on as u16]
}

pub fn decode_control_enabled(words: &[u16]) -> bool {
    words.get(1).map(|w| *w != 0).unwrap_or(false)
}
