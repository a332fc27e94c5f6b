// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Swarm Application Layer
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Detection, clustering and scoring use cases

pub mod coordination;
pub mod detector;
pub mod scorer;
pub mod topology_builder;

pub use coordination::{SwarmAnalysisConfig, SwarmAnalysisTask, SwarmCoordinationService, SwarmService};
pub use detector::InteractionDetector;
pub use scorer::PerformanceScorer;
pub use topology_builder::TopologyBuilder;
