// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Raw sensor readings delivered by the device.

use serde::{Deserialize, Serialize};

/// One 3-axis accelerometer reading (m/s²).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SampleVector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Sensor timestamp in milliseconds (monotonic within a session)
    pub timestamp_ms: u64,
}

impl SampleVector {
    pub fn new(x: f32, y: f32, z: f32, timestamp_ms: u64) -> Self {
        Self {
            x,
            y,
            z,
            timestamp_ms,
        }
    }

    /// Euclidean magnitude of the per-axis difference to `previous`.
    pub fn delta_magnitude(&self, previous: &SampleVector) -> f32 {
        let dx = self.x - previous.x;
        let dy = self.y - previous.y;
        let dz = self.z - previous.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// A position fix from the location provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Reported accuracy radius in meters (smaller is better)
    pub accuracy_m: f32,
    pub timestamp_ms: u64,
}

/// Event fed into a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SensorEvent {
    Accelerometer(SampleVector),
    Location(LocationFix),
}

/// A single detected step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepEvent {
    pub timestamp_ms: u64,
    /// Delta magnitude that triggered the step
    pub magnitude: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_magnitude() {
        let previous = SampleVector::new(1.0, 1.0, 1.0, 0);
        let current = SampleVector::new(4.0, 5.0, 1.0, 20);
        assert_eq!(current.delta_magnitude(&previous), 5.0);
    }

    #[test]
    fn test_sensor_event_wire_format() {
        let json = r#"[
            {"type": "accelerometer", "x": 0.5, "y": 9.7, "z": 0.1, "timestamp_ms": 1200},
            {"type": "location", "latitude": 37.42, "longitude": -122.08, "accuracy_m": 8.0, "timestamp_ms": 1300}
        ]"#;

        let events: Vec<SensorEvent> = serde_json::from_str(json).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            SensorEvent::Accelerometer(SampleVector {
                timestamp_ms: 1200,
                ..
            })
        ));
        assert!(matches!(events[1], SensorEvent::Location(fix) if fix.accuracy_m == 8.0));
    }
}
