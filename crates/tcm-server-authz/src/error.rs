// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::store::StoreError;
use crate::types::ModelError;

/// Errors returned by policy evaluation and member management.
///
/// A negative decision is never an error. These variants mean the engine
/// could not decide at all.
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
	/// A collaborator failed, so the decision is unknown.
	#[error("authorization indeterminate: {0}")]
	Indeterminate(#[from] StoreError),

	/// The caller supplied input the engine cannot interpret.
	#[error("invalid input: {0}")]
	InvalidInput(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, AuthzError>;
