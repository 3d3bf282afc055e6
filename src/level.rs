//! Power level type and the shared level store.
//!
//! The store is the only shared-mutable state in the controller: external
//! setters (UDP listener thread, HTTP handler, PID loop) write it, the duty-cycle
//! scheduler reads it once per period.  Both sides go through single atomic
//! operations, so a reader never observes a torn value.
//!
//! ```text
//!  UDP listener ──┐
//!  HTTP handler ──┤
//!  PID loop ──────┼──▶ LevelStore (AtomicU8) ──▶ DutyCycleScheduler
//!  Supervisor ────┘      (override, no generation bump; lock on shutdown)
//! ```

use core::fmt;
use core::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

/// Desired fraction of each period the relay is on, in whole percent.
///
/// Always within `0..=PowerLevel::MAX`; every constructor clamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct PowerLevel(u8);

impl PowerLevel {
    /// Full scale.
    pub const MAX: u8 = 100;

    pub const OFF: Self = Self(0);
    pub const FULL: Self = Self(Self::MAX);

    /// Clamp `percent` into range.
    pub const fn new(percent: u8) -> Self {
        if percent > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(percent)
        }
    }

    /// Clamp a signed value into range.
    pub fn clamped(value: i32) -> Self {
        Self(value.clamp(0, Self::MAX as i32) as u8)
    }

    /// Quantise a fractional percentage, rounding half up.  NaN maps to 0.
    pub fn from_percent(percent: f32) -> Self {
        if percent.is_nan() {
            return Self::OFF;
        }
        let rounded = (percent + 0.5).floor();
        Self(rounded.clamp(0.0, Self::MAX as f32) as u8)
    }

    pub const fn percent(self) -> u8 {
        self.0
    }

    pub const fn is_off(self) -> bool {
        self.0 == 0
    }

    pub const fn is_full(self) -> bool {
        self.0 == Self::MAX
    }
}

impl From<u8> for PowerLevel {
    fn from(v: u8) -> Self {
        Self::new(v)
    }
}

impl From<PowerLevel> for u8 {
    fn from(level: PowerLevel) -> Self {
        level.0
    }
}

impl fmt::Display for PowerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Level store
// ═══════════════════════════════════════════════════════════════

/// Atomic holder for the requested power level.
///
/// `generation` counts external writes.  The supervisor watches it to
/// detect setpoint activity; its own standby override does not bump it.
///
/// The top bit of the level byte is the shutdown latch.  Once
/// [`LevelStore::lock`] sets it, every later write is refused, so no setter
/// thread can revive the output after a shutdown.
pub struct LevelStore {
    level: AtomicU8,
    generation: AtomicU32,
}

const LOCKED: u8 = 0x80;

impl LevelStore {
    pub const fn new(initial: PowerLevel) -> Self {
        Self {
            level: AtomicU8::new(initial.0),
            generation: AtomicU32::new(0),
        }
    }

    /// Current requested level (single atomic load).
    pub fn level(&self) -> PowerLevel {
        PowerLevel(self.level.load(Ordering::Acquire) & !LOCKED)
    }

    /// External write.  Callable from any thread at any time; returns
    /// `false` when the store is locked and the write was dropped.
    pub fn set_level(&self, level: PowerLevel) -> bool {
        let stored = self
            .level
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                (cur & LOCKED == 0).then_some(level.0)
            })
            .is_ok();
        if stored {
            self.generation.fetch_add(1, Ordering::AcqRel);
        }
        stored
    }

    /// External write of a fractional percentage.  Returns the stored value,
    /// or `None` once the store is locked.
    pub fn set_percent(&self, percent: f32) -> Option<PowerLevel> {
        let level = PowerLevel::from_percent(percent);
        self.set_level(level).then_some(level)
    }

    /// Number of external writes since construction (wrapping).
    pub fn generation(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    /// Whether [`LevelStore::lock`] has been called.
    pub fn is_locked(&self) -> bool {
        self.level.load(Ordering::Acquire) & LOCKED != 0
    }

    /// Internal write that does not count as setpoint activity.  Ignored
    /// once locked.
    pub(crate) fn override_level(&self, level: PowerLevel) {
        let _ = self
            .level
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                (cur & LOCKED == 0).then_some(level.0)
            });
    }

    /// Force `level` and refuse all later writes.  Permanent.
    pub(crate) fn lock(&self, level: PowerLevel) {
        self.level.store(level.0 | LOCKED, Ordering::Release);
    }
}

impl Default for LevelStore {
    fn default() -> Self {
        Self::new(PowerLevel::OFF)
    }
}

impl fmt::Debug for LevelStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelStore")
            .field("level", &self.level())
            .field("generation", &self.generation())
            .field("locked", &self.is_locked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn out_of_range_inputs_are_clamped() {
        assert_eq!(PowerLevel::new(250).percent(), 100);
        assert_eq!(PowerLevel::clamped(-20), PowerLevel::OFF);
        assert_eq!(PowerLevel::clamped(1000), PowerLevel::FULL);
        assert_eq!(PowerLevel::from_percent(-3.5), PowerLevel::OFF);
        assert_eq!(PowerLevel::from_percent(142.2), PowerLevel::FULL);
        assert_eq!(PowerLevel::from_percent(f32::NAN), PowerLevel::OFF);
        assert_eq!(PowerLevel::from_percent(f32::INFINITY), PowerLevel::FULL);
    }

    #[test]
    fn fractional_percent_rounds_half_up() {
        assert_eq!(PowerLevel::from_percent(42.2).percent(), 42);
        assert_eq!(PowerLevel::from_percent(42.5).percent(), 43);
        assert_eq!(PowerLevel::from_percent(0.5).percent(), 1);
        assert_eq!(PowerLevel::from_percent(0.49).percent(), 0);
        assert_eq!(PowerLevel::from_percent(99.5).percent(), 100);
    }

    #[test]
    fn serde_clamps_on_deserialize() {
        let level: PowerLevel = serde_json::from_str("180").unwrap();
        assert_eq!(level, PowerLevel::FULL);
        assert_eq!(serde_json::to_string(&PowerLevel::new(33)).unwrap(), "33");
    }

    #[test]
    fn external_writes_bump_generation() {
        let store = LevelStore::new(PowerLevel::new(10));
        assert_eq!(store.level().percent(), 10);
        assert_eq!(store.generation(), 0);

        assert!(store.set_level(PowerLevel::new(60)));
        assert_eq!(store.level().percent(), 60);
        assert_eq!(store.generation(), 1);

        assert_eq!(store.set_percent(250.0), Some(PowerLevel::FULL));
        assert_eq!(store.generation(), 2);
    }

    #[test]
    fn override_does_not_count_as_activity() {
        let store = LevelStore::new(PowerLevel::new(80));
        store.override_level(PowerLevel::new(20));
        assert_eq!(store.level().percent(), 20);
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn lock_refuses_every_later_write() {
        let store = LevelStore::new(PowerLevel::new(70));
        store.lock(PowerLevel::OFF);
        assert!(store.is_locked());
        assert_eq!(store.level(), PowerLevel::OFF);

        assert!(!store.set_level(PowerLevel::FULL));
        assert_eq!(store.set_percent(55.0), None);
        store.override_level(PowerLevel::new(20));
        assert_eq!(store.level(), PowerLevel::OFF);
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn lock_wins_against_racing_setters() {
        let store = Arc::new(LevelStore::new(PowerLevel::new(50)));
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let s = Arc::clone(&store);
                std::thread::spawn(move || {
                    for v in 0..2000u32 {
                        s.set_level(PowerLevel::new((v % 101) as u8));
                    }
                })
            })
            .collect();
        store.lock(PowerLevel::OFF);
        for w in writers {
            w.join().unwrap();
        }
        assert_eq!(store.level(), PowerLevel::OFF);
    }

    #[test]
    fn concurrent_writers_never_tear() {
        let store = Arc::new(LevelStore::default());
        let writers: Vec<_> = [0u8, 100]
            .into_iter()
            .map(|v| {
                let s = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        s.set_level(PowerLevel::new(v));
                    }
                })
            })
            .collect();

        for _ in 0..1000 {
            let seen = store.level().percent();
            assert!(seen == 0 || seen == 100, "observed torn value {seen}");
        }
        for w in writers {
            w.join().unwrap();
        }
        assert_eq!(store.generation(), 2000);
    }
}
