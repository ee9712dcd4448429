// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fire-and-forget notifications for UI listeners.

use crate::models::{Achievement, TotalsSnapshot};
use tokio::sync::broadcast;

const NOTIFICATION_CAPACITY: usize = 64;

/// Something a listener may want to show.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerNotification {
    TotalsUpdated(TotalsSnapshot),
    AchievementUnlocked {
        user_id: u64,
        achievement: Achievement,
    },
}

/// Broadcasts notifications; sending never blocks and never fails.
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<TrackerNotification>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerNotification> {
        self.tx.subscribe()
    }

    pub fn notify(&self, notification: TrackerNotification) {
        // No subscribers is fine.
        let _ = self.tx.send(notification);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
