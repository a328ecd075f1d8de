//! Monotonic counter synthesis
//!
//! Absolute readings scraped from endpoints (heights, timestamps, nonces) are
//! not naturally monotonic: an endpoint swap, a reorg, or a restart can move
//! them backward. Exported counters must never decrease, so every reading is
//! folded into its counter as a non-negative delta against the last value
//! recorded for the same key. Backward or equal readings are absorbed without
//! touching the counter or the recorded value.
//!
//! One `Accumulator` instance exists per metric family, holding that family's
//! last-value table behind a single lock. The delta computation and the table
//! update happen inside the same critical section.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use parking_lot::Mutex;
use prometheus::IntCounter;

/// A quantity read from a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    Height,
    Timestamp,
    Nonce,
}

impl Quantity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quantity::Height => "height",
            Quantity::Timestamp => "timestamp",
            Quantity::Nonce => "nonce",
        }
    }

    /// Whether an uninitialized key treats its first reading as a delta from
    /// zero. With zero visibility the whole first reading is exported (a
    /// first reading of `0` still pins the series at `0`); without it the
    /// first reading only seeds the table and exports nothing.
    pub fn zero_visibility(&self) -> bool {
        matches!(self, Quantity::Nonce)
    }
}

/// Per-family last-value table. Converts absolute readings into counter
/// increments that never go negative.
pub struct Accumulator {
    last: Mutex<HashMap<(Quantity, String), u64>>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(HashMap::new()),
        }
    }

    /// Folds one absolute reading into the exported counter.
    ///
    /// Returns the increment applied, or `None` when the reading was absorbed
    /// (silent first-reading seed, equal value, or backward movement).
    pub fn apply(
        &self,
        quantity: Quantity,
        key: &str,
        value: u64,
        counter: &IntCounter,
    ) -> Option<u64> {
        let mut last = self.last.lock();
        match last.entry((quantity, key.to_owned())) {
            Entry::Vacant(slot) => {
                slot.insert(value);
                if quantity.zero_visibility() {
                    counter.inc_by(value);
                    Some(value)
                } else {
                    None
                }
            }
            Entry::Occupied(mut slot) => {
                let prev = *slot.get();
                if value > prev {
                    let delta = value - prev;
                    counter.inc_by(delta);
                    slot.insert(value);
                    Some(delta)
                } else {
                    None
                }
            }
        }
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> IntCounter {
        IntCounter::new("test_counter", "test").unwrap()
    }

    #[test]
    fn silent_seed_absorbs_backward_jump() {
        let accum = Accumulator::new();
        let c = counter();

        assert_eq!(accum.apply(Quantity::Height, "seq0", 100, &c), None);
        assert_eq!(accum.apply(Quantity::Height, "seq0", 60, &c), None);
        assert_eq!(accum.apply(Quantity::Height, "seq0", 130, &c), Some(30));
        assert_eq!(c.get(), 30);
    }

    #[test]
    fn zero_visibility_exports_first_reading_whole() {
        let accum = Accumulator::new();
        let c = counter();

        assert_eq!(accum.apply(Quantity::Nonce, "ops", 100, &c), Some(100));
        assert_eq!(accum.apply(Quantity::Nonce, "ops", 60, &c), None);
        assert_eq!(accum.apply(Quantity::Nonce, "ops", 130, &c), Some(30));
        assert_eq!(c.get(), 130);
    }

    #[test]
    fn zero_visibility_pins_series_at_zero() {
        let accum = Accumulator::new();
        let c = counter();

        assert_eq!(accum.apply(Quantity::Nonce, "ops", 0, &c), Some(0));
        assert_eq!(c.get(), 0);

        assert_eq!(accum.apply(Quantity::Nonce, "ops", 5, &c), Some(5));
        assert_eq!(c.get(), 5);
    }

    #[test]
    fn conservation_over_monotone_sequence() {
        let accum = Accumulator::new();
        let c = counter();

        for value in [7u64, 7, 9, 12] {
            accum.apply(Quantity::Height, "seq0", value, &c);
        }
        assert_eq!(c.get(), 12 - 7);
    }

    #[test]
    fn counter_is_monotonic_under_arbitrary_readings() {
        let accum = Accumulator::new();
        let c = counter();

        let mut exported = 0;
        for value in [50u64, 10, 10, 80, 0, 80, 81, 3] {
            accum.apply(Quantity::Timestamp, "seq0", value, &c);
            assert!(c.get() >= exported);
            exported = c.get();
        }
        assert_eq!(exported, 81 - 50);
    }

    #[test]
    fn equal_reading_is_a_no_op() {
        let accum = Accumulator::new();
        let c = counter();

        accum.apply(Quantity::Height, "seq0", 40, &c);
        assert_eq!(accum.apply(Quantity::Height, "seq0", 40, &c), None);
        assert_eq!(c.get(), 0);
    }

    #[test]
    fn keys_are_tracked_independently() {
        let accum = Accumulator::new();
        let c0 = counter();
        let c1 = counter();

        accum.apply(Quantity::Height, "seq0", 100, &c0);
        accum.apply(Quantity::Height, "seq1", 5, &c1);
        assert_eq!(accum.apply(Quantity::Height, "seq0", 110, &c0), Some(10));
        assert_eq!(accum.apply(Quantity::Height, "seq1", 6, &c1), Some(1));
        assert_eq!(c0.get(), 10);
        assert_eq!(c1.get(), 1);
    }

    #[test]
    fn quantities_do_not_share_slots() {
        let accum = Accumulator::new();
        let heights = counter();
        let timestamps = counter();

        accum.apply(Quantity::Height, "seq0", 100, &heights);
        accum.apply(Quantity::Timestamp, "seq0", 1_700_000_000, &timestamps);
        assert_eq!(
            accum.apply(Quantity::Height, "seq0", 101, &heights),
            Some(1)
        );
        assert_eq!(
            accum.apply(Quantity::Timestamp, "seq0", 1_700_000_012, &timestamps),
            Some(12)
        );
    }
}
