// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Domain Layer
//!
//! Pure domain types for swarm inference. No I/O dependencies.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`connection`] | `AgentConnection`, `ConnectionType`, `ConnectionRepository` |
//! | [`topology`] | `SwarmTopology`, `SwarmId`, `CoordinationPattern`, `PatternScores`, `SwarmPerformance` |

pub mod connection;
pub mod topology;

pub use connection::*;
pub use topology::*;
