// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publication-subscription and access-control core for a
//! cluster-controller-side pub/sub middleware: an in-memory, wildcard-aware
//! access store (C1), the master/mediator/owner validation algorithm (C2),
//! a caching local domain access controller (C3), a per-message access
//! controller (C4), and a subscription/publication scheduler (C5).

pub mod algorithm;
pub mod config;
pub mod controller;
pub mod error;
pub mod ldac;
pub mod model;
pub mod publication;
pub mod store;
pub mod types;

pub use config::CoreConfig;
pub use error::CoreError;
pub use store::AccessStore;
