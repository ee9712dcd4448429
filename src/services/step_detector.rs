// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Step detection from raw accelerometer samples.
//!
//! A debounced edge detector: a step is counted when the change between two
//! consecutive samples is large enough and the previous step is far enough
//! in the past. It is not a true pedometer and both over- and under-counts
//! under real-world conditions.

use crate::config::DetectorSettings;
use crate::models::{SampleVector, StepEvent};

/// Magnitude-threshold + cooldown step filter.
#[derive(Debug, Clone)]
pub struct StepDetector {
    settings: DetectorSettings,
    /// Last sample seen (starts at the zero vector)
    previous: SampleVector,
    /// Timestamp of the last accepted step
    last_step_ms: Option<u64>,
}

impl StepDetector {
    pub fn new(settings: DetectorSettings) -> Self {
        Self {
            settings,
            previous: SampleVector::default(),
            last_step_ms: None,
        }
    }

    /// Feed one sample; returns a step if this sample completes one.
    pub fn on_sample(&mut self, sample: &SampleVector) -> Option<StepEvent> {
        let magnitude = sample.delta_magnitude(&self.previous);
        self.previous = *sample;

        if magnitude.is_nan()
            || magnitude <= self.settings.threshold
            || !self.cooled_down(sample.timestamp_ms)
        {
            return None;
        }

        self.last_step_ms = Some(sample.timestamp_ms);
        Some(StepEvent {
            timestamp_ms: sample.timestamp_ms,
            magnitude,
        })
    }

    fn cooled_down(&self, now_ms: u64) -> bool {
        match self.last_step_ms {
            None => true,
            // Out-of-order timestamps never satisfy the cooldown.
            Some(last) => now_ms.saturating_sub(last) > self.settings.cooldown_ms,
        }
    }

    /// Forget the previous sample and the last step.
    pub fn reset(&mut self) {
        self.previous = SampleVector::default();
        self.last_step_ms = None;
    }
}

impl Default for StepDetector {
    fn default() -> Self {
        Self::new(DetectorSettings::default())
    }
}
