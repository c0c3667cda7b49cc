// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization configuration section.

use serde::Deserialize;
use tcm_server_authz::GlobalRole;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthzConfig {
	/// The global role whose holders bypass every check.
	pub system_admin_role: GlobalRole,
}

impl Default for AuthzConfig {
	fn default() -> Self {
		Self {
			system_admin_role: GlobalRole::Admin,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthzConfigLayer {
	#[serde(default)]
	pub system_admin_role: Option<String>,
}

impl AuthzConfigLayer {
	pub fn merge(&mut self, other: AuthzConfigLayer) {
		if other.system_admin_role.is_some() {
			self.system_admin_role = other.system_admin_role;
		}
	}

	pub fn finalize(self) -> Result<AuthzConfig, ConfigError> {
		let system_admin_role = match self.system_admin_role {
			Some(raw) => raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
				key: "authz.system_admin_role".to_string(),
				message: format!("{e}"),
			})?,
			None => GlobalRole::Admin,
		};
		Ok(AuthzConfig { system_admin_role })
	}
}
