// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! # tcm-server-db
//!
//! SQLite persistence for the authorization engine, via sqlx.
//!
//! [`AuthzRepository`] holds a `SqlitePool` and implements the engine's
//! `MembershipStore`, `ContainmentResolver` and `UserDirectory` contracts by
//! delegating to its inherent, instrumented methods. Failures convert from
//! [`DbError`] into the engine's `StoreError`, so a database outage surfaces
//! as an indeterminate decision.
//!
//! ## Testing
//!
//! [`testing::create_test_pool`] returns a migrated single-connection
//! in-memory pool:
//!
//! ```rust,ignore
//! #[tokio::test]
//! async fn test_example() {
//!     let repo = AuthzRepository::new(create_test_pool().await.unwrap());
//!     // test operations...
//! }
//! ```

mod error;
pub mod migrations;
pub mod pool;
pub mod store;
pub mod testing;

pub use error::{DbError, Result};
pub use migrations::run_migrations;
pub use pool::create_pool;
pub use store::AuthzRepository;
