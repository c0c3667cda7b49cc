// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The acting principal of an authorization request.
//!
//! Policies take a [`Principal`] value explicitly. The transport layer turns
//! its ambient session into one through a [`PrincipalProvider`] once per
//! request and passes it down.

use serde::{Deserialize, Serialize};

use crate::store::UserRecord;
use crate::types::{GlobalRole, ModelError, UserId};

/// The actor of an authorization request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Principal {
	user_id: Option<UserId>,
	display_name: Option<String>,
	is_system_admin: bool,
}

impl Principal {
	/// A principal with no identity. Fails every check.
	pub fn anonymous() -> Self {
		Self::default()
	}

	pub fn authenticated(user_id: UserId) -> Self {
		Self {
			user_id: Some(user_id),
			display_name: None,
			is_system_admin: false,
		}
	}

	pub fn system_admin(user_id: UserId) -> Self {
		Self {
			user_id: Some(user_id),
			display_name: None,
			is_system_admin: true,
		}
	}

	pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
		self.display_name = Some(name.into());
		self
	}

	/// Build the principal for a stored user account.
	pub fn from_user(user: &UserRecord, system_admin_role: GlobalRole) -> Self {
		Self {
			user_id: Some(user.id),
			display_name: Some(user.display_name.clone()),
			is_system_admin: user.global_role == system_admin_role,
		}
	}

	/// Resolve the ambient request identity.
	///
	/// An unauthenticated provider, or one without a principal id, yields an
	/// anonymous principal. A present but malformed id is a caller bug and is
	/// returned as an error.
	pub fn resolve(
		provider: &dyn PrincipalProvider,
		system_admin_role: GlobalRole,
	) -> Result<Self, ModelError> {
		if !provider.is_authenticated() {
			return Ok(Self::anonymous());
		}
		let Some(raw_id) = provider.current_principal_id() else {
			return Ok(Self::anonymous());
		};
		let user_id: UserId = raw_id.parse()?;

		Ok(Self {
			user_id: Some(user_id),
			display_name: provider.current_principal_name(),
			is_system_admin: provider.has_global_role(system_admin_role.as_str()),
		})
	}

	pub fn user_id(&self) -> Option<&UserId> {
		self.user_id.as_ref()
	}

	pub fn display_name(&self) -> Option<&str> {
		self.display_name.as_deref()
	}

	pub fn is_authenticated(&self) -> bool {
		self.user_id.is_some()
	}

	/// Anonymous principals are never system administrators.
	pub fn is_system_admin(&self) -> bool {
		self.is_system_admin && self.is_authenticated()
	}

	/// Returns true if this principal is the given user.
	pub fn is(&self, user_id: &UserId) -> bool {
		self.user_id.as_ref() == Some(user_id)
	}
}

/// Supplies the identity of the current request, e.g. from a session.
pub trait PrincipalProvider: Send + Sync {
	fn current_principal_id(&self) -> Option<String>;

	fn current_principal_name(&self) -> Option<String>;

	fn is_authenticated(&self) -> bool;

	fn has_global_role(&self, role: &str) -> bool;
}
