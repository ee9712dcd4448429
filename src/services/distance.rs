// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Distance accumulation from location fixes.

use crate::models::LocationFix;
use geo::{Distance, Haversine, Point};

/// Sums great-circle distance between accurate consecutive fixes.
#[derive(Debug, Clone)]
pub struct DistanceAccumulator {
    max_accuracy_m: f32,
    min_delta_m: f64,
    last_fix: Option<LocationFix>,
    total_m: f64,
}

impl DistanceAccumulator {
    pub fn new(max_accuracy_m: f32, min_delta_m: f64) -> Self {
        Self {
            max_accuracy_m,
            min_delta_m,
            last_fix: None,
            total_m: 0.0,
        }
    }

    /// Start from an already accumulated distance (resumed session).
    pub fn with_total(mut self, total_m: f64) -> Self {
        self.total_m = total_m.max(0.0);
        self
    }

    /// Feed one fix; returns the distance added to the total, if any.
    ///
    /// Fixes at or above the accuracy limit are ignored entirely. Any fix that
    /// passes the accuracy filter becomes the new reference point, even when
    /// the movement is too small to count.
    pub fn on_location_fix(&mut self, fix: &LocationFix) -> Option<f64> {
        if fix.accuracy_m.is_nan() || fix.accuracy_m >= self.max_accuracy_m {
            return None;
        }

        let delta = self
            .last_fix
            .replace(*fix)
            .map(|previous| great_circle_m(&previous, fix))
            .filter(|d| *d > self.min_delta_m)?;

        self.total_m += delta;
        Some(delta)
    }

    pub fn total_m(&self) -> f64 {
        self.total_m
    }

    pub fn reset(&mut self) {
        self.last_fix = None;
        self.total_m = 0.0;
    }
}

/// Haversine distance in meters between two fixes.
pub fn great_circle_m(a: &LocationFix, b: &LocationFix) -> f64 {
    let from = Point::new(a.longitude, a.latitude);
    let to = Point::new(b.longitude, b.latitude);
    Haversine.distance(from, to)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(latitude: f64, longitude: f64, accuracy_m: f32) -> LocationFix {
        LocationFix {
            latitude,
            longitude,
            accuracy_m,
            timestamp_ms: 0,
        }
    }

    // ~11.1 m per 0.0001° of latitude
    const STEP_NORTH: f64 = 0.0001;

    #[test]
    fn test_first_fix_only_sets_reference() {
        let mut acc = DistanceAccumulator::new(20.0, 1.0);
        assert_eq!(acc.on_location_fix(&fix(37.0, -122.0, 5.0)), None);
        assert_eq!(acc.total_m(), 0.0);
    }

    #[test]
    fn test_accurate_movement_accumulates() {
        let mut acc = DistanceAccumulator::new(20.0, 1.0);
        acc.on_location_fix(&fix(37.0, -122.0, 5.0));
        let delta = acc
            .on_location_fix(&fix(37.0 + STEP_NORTH, -122.0, 5.0))
            .expect("movement should count");

        assert!((delta - 11.1).abs() < 0.2, "delta was {}", delta);
        assert_eq!(acc.total_m(), delta);
    }

    #[test]
    fn test_inaccurate_fix_is_ignored() {
        let mut acc = DistanceAccumulator::new(20.0, 1.0);
        acc.on_location_fix(&fix(37.0, -122.0, 5.0));
        // Accuracy of exactly 20 m does not pass.
        assert_eq!(acc.on_location_fix(&fix(37.01, -122.0, 20.0)), None);
        // The rejected fix did not become the reference point.
        let delta = acc.on_location_fix(&fix(37.0 + STEP_NORTH, -122.0, 5.0));
        assert!(delta.is_some_and(|d| d < 12.0));
    }

    #[test]
    fn test_small_movement_is_noise_but_moves_reference() {
        let mut acc = DistanceAccumulator::new(20.0, 1.0);
        acc.on_location_fix(&fix(37.0, -122.0, 5.0));
        // ~0.55 m
        assert_eq!(acc.on_location_fix(&fix(37.000005, -122.0, 5.0)), None);
        assert_eq!(acc.total_m(), 0.0);

        // Measured from the noisy fix, not the original one.
        let delta = acc
            .on_location_fix(&fix(37.000005 + STEP_NORTH, -122.0, 5.0))
            .unwrap();
        assert!((delta - 11.1).abs() < 0.2);
    }

    #[test]
    fn test_total_never_decreases() {
        let mut acc = DistanceAccumulator::new(20.0, 1.0).with_total(500.0);
        let mut last_total = acc.total_m();
        let path = [
            fix(37.0, -122.0, 3.0),
            fix(37.0002, -122.0, 3.0),
            fix(37.0, -122.0, 3.0),
            fix(37.0, -122.0, 50.0),
            fix(37.0001, -122.0001, 3.0),
        ];
        for f in &path {
            acc.on_location_fix(f);
            assert!(acc.total_m() >= last_total);
            last_total = acc.total_m();
        }
        assert!(acc.total_m() > 500.0);
    }
}
