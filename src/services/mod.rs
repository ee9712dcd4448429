// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod achievements;
pub mod aggregator;
pub mod collector;
pub mod distance;
pub mod notifier;
pub mod profile;
pub mod session;
pub mod step_detector;

pub use achievements::AchievementService;
pub use aggregator::DailyAggregator;
pub use collector::{Clock, TrackingService};
pub use distance::DistanceAccumulator;
pub use notifier::{Notifier, TrackerNotification};
pub use profile::ProfileService;
pub use session::SessionContext;
pub use step_detector::StepDetector;
