// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`colony-core`)
//!
//! HTTP surface that translates external requests into `AgentRuntime`
//! calls. **No business logic lives here**; every operation is delegated to
//! `crate::application`.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | Agent management endpoints and webhook triggers |

pub mod api;
