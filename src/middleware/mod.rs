// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request middleware.

pub mod auth;

pub use auth::{require_user, CurrentUser};
