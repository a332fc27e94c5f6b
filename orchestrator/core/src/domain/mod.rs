// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Agents, their capabilities and the records their runs leave behind.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Entities, value objects and repository traits

pub mod agent;
pub mod analytics;
pub mod capability;
pub mod context;
pub mod events;
pub mod execution;
pub mod node_config;
pub mod repository;
