// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Colony Core
//!
//! Agent runtime: capability registries, agent lifecycle, trigger dispatch
//! and the execution log the swarm engine analyses.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Build agents from blueprints and run them

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
