// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod achievement;
pub mod daily;
pub mod sensor;
pub mod user;

pub use achievement::{Achievement, AchievementId, AchievementUnlock};
pub use daily::{DailyRecord, History, TotalsSnapshot};
pub use sensor::{LocationFix, SampleVector, SensorEvent, StepEvent};
pub use user::UserProfile;
