//! Time-indexed sample caches.
//!
//! Times are canonicalized to integer multiples of [`TIME_KEY_RESOLUTION`] before they are
//! used as map keys, so two requests for "the same" time hit the same entry even when they
//! were produced by different floating-point paths, and the nearest-neighbour search runs on
//! exact integer distances.

use crate::error::{EngineError, EngineResult};
use std::collections::BTreeMap;

/// Granularity of cache keys, in time units.
pub const TIME_KEY_RESOLUTION: f64 = 1e-9;

/// A canonicalized time value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeKey(i64);

impl TimeKey {
    pub fn new(t: f64) -> EngineResult<Self> {
        let ticks = (t / TIME_KEY_RESOLUTION).round();
        // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
        if !ticks.is_finite() || ticks >= i64::MAX as f64 || ticks < i64::MIN as f64 {
            return Err(EngineError::UnrepresentableTime(t));
        }
        Ok(Self(ticks as i64))
    }

    pub fn time(self) -> f64 {
        self.0 as f64 * TIME_KEY_RESOLUTION
    }

    fn distance(self, other: TimeKey) -> u64 {
        self.0.abs_diff(other.0)
    }
}

/// Which of two equally distant anchors the integrator starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum AnchorTieBreak {
    /// The anchor with the smaller time.
    #[default]
    Earlier,
    /// The anchor with the larger time.
    Later,
}

/// A cached `(t, x, x')` triple used as the starting point of an integration pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub key: TimeKey,
    pub position: f64,
    pub velocity: f64,
}

/// Parallel position and velocity maps keyed by canonical time.
#[derive(Debug, Clone, Default)]
pub struct SampleCache {
    positions: BTreeMap<TimeKey, f64>,
    velocities: BTreeMap<TimeKey, f64>,
}

impl SampleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache holding the single sample `(t0, x0, v0)`.
    pub fn seeded(t0: TimeKey, x0: f64, v0: f64) -> Self {
        let mut cache = Self::new();
        cache.insert(t0, x0, v0);
        cache
    }

    pub fn position(&self, key: TimeKey) -> Option<f64> {
        self.positions.get(&key).copied()
    }

    pub fn velocity(&self, key: TimeKey) -> Option<f64> {
        self.velocities.get(&key).copied()
    }

    pub fn insert_position(&mut self, key: TimeKey, position: f64) {
        self.positions.insert(key, position);
    }

    pub fn insert_velocity(&mut self, key: TimeKey, velocity: f64) {
        self.velocities.insert(key, velocity);
    }

    pub fn insert(&mut self, key: TimeKey, position: f64, velocity: f64) {
        self.insert_position(key, position);
        self.insert_velocity(key, velocity);
    }

    /// Number of cached positions.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The key with both a position and a velocity that is closest to `target`.
    pub fn nearest_anchor(&self, target: TimeKey, tie_break: AnchorTieBreak) -> Option<Anchor> {
        let below = self
            .positions
            .range(..=target)
            .rev()
            .find_map(|(&key, &x)| self.anchor_at(key, x));
        let above = self
            .positions
            .range(target..)
            .find_map(|(&key, &x)| self.anchor_at(key, x));

        match (below, above) {
            (Some(below), Some(above)) => {
                let d_below = below.key.distance(target);
                let d_above = above.key.distance(target);
                if d_below < d_above {
                    Some(below)
                } else if d_above < d_below {
                    Some(above)
                } else {
                    match tie_break {
                        AnchorTieBreak::Earlier => Some(below),
                        AnchorTieBreak::Later => Some(above),
                    }
                }
            }
            (below, above) => below.or(above),
        }
    }

    fn anchor_at(&self, key: TimeKey, position: f64) -> Option<Anchor> {
        self.velocity(key).map(|velocity| Anchor {
            key,
            position,
            velocity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(t: f64) -> TimeKey {
        TimeKey::new(t).expect("finite time")
    }

    #[test]
    fn time_key_canonicalizes_rounding_noise() {
        assert_eq!(key(0.1 + 0.2), key(0.3));
        assert_ne!(key(0.3), key(0.31));
        assert!((key(12.5).time() - 12.5).abs() < 1e-12);
        assert!(key(-1.0) < key(0.0));
    }

    #[test]
    fn time_key_rejects_non_finite_and_huge_times() {
        assert!(matches!(
            TimeKey::new(f64::NAN),
            Err(EngineError::UnrepresentableTime(_))
        ));
        assert!(TimeKey::new(f64::INFINITY).is_err());
        assert!(TimeKey::new(1e12).is_err());
        assert!(TimeKey::new(-1e12).is_err());
    }

    #[test]
    fn seeded_cache_serves_its_anchor() {
        let cache = SampleCache::seeded(key(2.0), 5.0, -1.0);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.position(key(2.0)), Some(5.0));
        assert_eq!(cache.velocity(key(2.0)), Some(-1.0));
        assert_eq!(cache.position(key(2.5)), None);

        let anchor = cache
            .nearest_anchor(key(-10.0), AnchorTieBreak::Earlier)
            .expect("anchor");
        assert_eq!(anchor.key, key(2.0));
    }

    #[test]
    fn nearest_anchor_picks_closest_key() {
        let mut cache = SampleCache::new();
        cache.insert(key(0.0), 1.0, 0.0);
        cache.insert(key(10.0), 2.0, 0.0);
        cache.insert(key(4.0), 3.0, 0.0);

        let anchor = cache
            .nearest_anchor(key(6.5), AnchorTieBreak::Earlier)
            .expect("anchor");
        assert_eq!(anchor.key, key(4.0));
        assert_eq!(anchor.position, 3.0);

        let anchor = cache
            .nearest_anchor(key(8.0), AnchorTieBreak::Earlier)
            .expect("anchor");
        assert_eq!(anchor.key, key(10.0));
    }

    #[test]
    fn nearest_anchor_tie_break_is_explicit() {
        let mut cache = SampleCache::new();
        cache.insert(key(1.0), 1.0, 0.0);
        cache.insert(key(3.0), 3.0, 0.0);

        let earlier = cache
            .nearest_anchor(key(2.0), AnchorTieBreak::Earlier)
            .expect("anchor");
        let later = cache
            .nearest_anchor(key(2.0), AnchorTieBreak::Later)
            .expect("anchor");
        assert_eq!(earlier.key, key(1.0));
        assert_eq!(later.key, key(3.0));
    }

    #[test]
    fn nearest_anchor_skips_positions_without_velocity() {
        let mut cache = SampleCache::new();
        cache.insert(key(0.0), 1.0, 0.5);
        cache.insert_position(key(5.0), 9.0);

        let anchor = cache
            .nearest_anchor(key(5.0), AnchorTieBreak::Earlier)
            .expect("anchor");
        assert_eq!(anchor.key, key(0.0));
        assert!(SampleCache::new()
            .nearest_anchor(key(1.0), AnchorTieBreak::Earlier)
            .is_none());
    }
}
