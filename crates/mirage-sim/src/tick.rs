//! The tick clock.
//!
//! Every engine computes against an explicit [`TickClock`] value rather than
//! wall time: the economy advances in `current_tick` steps, armies refill
//! stamina on the coarser `armies_tick` cadence, and battle decay runs on raw
//! block seconds.

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;

// ---------------------------------------------------------------------------
// TickClock
// ---------------------------------------------------------------------------

/// A snapshot of game time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickClock {
    /// Economy tick: production and consumption rates are per this tick.
    pub current_tick: u64,
    /// Armies tick: stamina refills once per boundary.
    pub armies_tick: u64,
    /// Block timestamp in seconds, used by battle decay and tile reveals.
    pub block_timestamp: u64,
}

impl TickClock {
    pub fn new(current_tick: u64, armies_tick: u64, block_timestamp: u64) -> Self {
        Self {
            current_tick,
            armies_tick,
            block_timestamp,
        }
    }

    /// Derive both tick counters from a block timestamp and the configured
    /// tick intervals.
    pub fn from_timestamp(block_timestamp: u64, config: &SimConfig) -> Self {
        Self {
            current_tick: block_timestamp / config.tick_interval_secs,
            armies_tick: block_timestamp / config.armies_tick_interval_secs,
            block_timestamp,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_derive_from_timestamp() {
        let config = SimConfig {
            tick_interval_secs: 60,
            armies_tick_interval_secs: 3_600,
            ..SimConfig::default()
        };
        let clock = TickClock::from_timestamp(7_260, &config);
        assert_eq!(clock.current_tick, 121);
        assert_eq!(clock.armies_tick, 2);
        assert_eq!(clock.block_timestamp, 7_260);
    }

    #[test]
    fn armies_tick_is_coarser() {
        let config = SimConfig::default();
        let a = TickClock::from_timestamp(0, &config);
        let b = TickClock::from_timestamp(config.tick_interval_secs, &config);
        assert!(b.current_tick > a.current_tick);
        assert_eq!(b.armies_tick, a.armies_tick);
    }
}
