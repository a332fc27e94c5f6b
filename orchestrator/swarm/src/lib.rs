// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `colony-swarm` - Swarm Inference Crate
//!
//! Infers which agents coordinate with each other from the timing of their
//! runs, groups them into swarms and scores how well each swarm works.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `AgentConnection`, `SwarmTopology`, `ConnectionRepository` |
//! | [`application`] | Application | `InteractionDetector`, `TopologyBuilder`, `PerformanceScorer`, `SwarmService` |
//! | [`infrastructure`] | Infrastructure | `InMemoryConnectionRepository` |
//!
//! ## Key Concepts
//!
//! - **Connection**: a directed edge A → B inferred when B repeatedly starts
//!   shortly after A finishes. Persisted by upsert on `(source, target, type)`.
//! - **Swarm**: a connected component of agents joined by edges of strength
//!   ≥ 0.3, with at least two members.
//! - **Coordination pattern**: hierarchical, collaborative or pipeline,
//!   whichever scores highest on the swarm's internal edges.
//!
//! Swarms are never stored; each analysis pass recomputes them from the
//! execution log and the active connections.

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
