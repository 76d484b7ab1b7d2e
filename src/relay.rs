/// Relay model - channels, pin mapping and values
///
/// The HAT carries four relays on fixed BCM pins. Channel numbers seen by the
/// user are 1-based; index 0 of `RELAY_PINS` is channel 1.

use anyhow::{anyhow, Result};
use std::fmt;

pub const RELAY_COUNT: usize = 4;

/// BCM pin driving each relay, indexed by channel - 1
pub const RELAY_PINS: [u32; RELAY_COUNT] = [22, 23, 25, 24];

/// Access to the GPIO lines behind the relays.
/// Implemented by the sysfs and gpiod backends, and by test fakes.
pub trait RelayIo {
    fn write(&mut self, pin: u32, value: RelayValue) -> Result<()>;
    /// Raw line level as reported by the backend
    fn read(&mut self, pin: u32) -> Result<u8>;
}

/// Hands out the relay lines on first use, so commands that never touch
/// the hardware do not depend on settings or backend availability.
pub trait BoardSource {
    fn board(&mut self) -> Result<&mut dyn RelayIo>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayChannel(u8);

impl RelayChannel {
    pub fn new(channel: i64) -> Result<Self> {
        if (1..=RELAY_COUNT as i64).contains(&channel) {
            Ok(Self(channel as u8))
        } else {
            Err(anyhow!("! Invalid pin number [1..{}]", RELAY_COUNT))
        }
    }

    /// All channels in physical sequence order
    pub fn all() -> impl Iterator<Item = RelayChannel> {
        (1..=RELAY_COUNT as u8).map(RelayChannel)
    }

    pub fn pin(self) -> u32 {
        RELAY_PINS[usize::from(self.0) - 1]
    }
}

impl fmt::Display for RelayChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayValue {
    Off,
    On,
}

impl RelayValue {
    /// Out-of-range input is clamped, never rejected: negative is Off, anything above 1 is On.
    pub fn clamped(value: i64) -> Self {
        if value >= 1 {
            RelayValue::On
        } else {
            RelayValue::Off
        }
    }

    pub fn level(self) -> u8 {
        match self {
            RelayValue::Off => 0,
            RelayValue::On => 1,
        }
    }
}

/// Parse an integer the way C `atoi` does: skip leading whitespace, take an
/// optional sign and as many digits as follow. Anything unparsable is 0.
pub fn parse_lenient(text: &str) -> i64 {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut value: i64 = 0;
    for digit in rest.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add(i64::from(digit - b'0'));
    }

    if negative { -value } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_map_to_hat_pins() {
        let pins: Vec<u32> = RelayChannel::all().map(RelayChannel::pin).collect();
        assert_eq!(pins, vec![22, 23, 25, 24]);
    }

    #[test]
    fn channel_bounds() {
        assert!(RelayChannel::new(0).is_err());
        assert!(RelayChannel::new(5).is_err());
        assert!(RelayChannel::new(-1).is_err());
        assert_eq!(RelayChannel::new(4).unwrap().pin(), 24);
        assert_eq!(
            RelayChannel::new(9).unwrap_err().to_string(),
            "! Invalid pin number [1..4]"
        );
    }

    #[test]
    fn values_are_clamped() {
        assert_eq!(RelayValue::clamped(-7), RelayValue::Off);
        assert_eq!(RelayValue::clamped(0), RelayValue::Off);
        assert_eq!(RelayValue::clamped(1), RelayValue::On);
        assert_eq!(RelayValue::clamped(42), RelayValue::On);
    }

    #[test]
    fn lenient_parse_matches_atoi() {
        assert_eq!(parse_lenient("3"), 3);
        assert_eq!(parse_lenient("  -12"), -12);
        assert_eq!(parse_lenient("+2"), 2);
        assert_eq!(parse_lenient("2abc"), 2);
        assert_eq!(parse_lenient("on"), 0);
        assert_eq!(parse_lenient(""), 0);
        assert_eq!(parse_lenient("-"), 0);
    }
}
