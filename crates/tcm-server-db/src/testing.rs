// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pools for tests.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::error::DbError;
use crate::migrations::run_migrations;

/// A migrated in-memory database.
///
/// Every connection to `:memory:` opens a fresh database, so the pool is
/// capped at one connection.
pub async fn create_test_pool() -> Result<SqlitePool, DbError> {
	let options = SqliteConnectOptions::from_str(":memory:")?
		.foreign_keys(true)
		.create_if_missing(true);

	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect_with(options)
		.await?;

	run_migrations(&pool).await?;
	Ok(pool)
}
