// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions for the authorization engine.
//!
//! - **ID newtypes**: UUID wrappers for users and the three container levels
//!   ([`UserId`], [`OrgId`], [`ProjectId`], [`GroupId`])
//! - **Global role**: the system-wide role carried on a user ([`GlobalRole`])
//! - **Containment**: a project's optional organization ([`Project`]) and a
//!   group's owner ([`GroupOwner`])
//!
//! All ID types serialize transparently as UUID strings and parse from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Errors raised while constructing model values from untyped input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
	#[error("unknown {level} role: {value:?}")]
	UnknownRole { level: &'static str, value: String },

	#[error("invalid {kind} id {value:?}: {reason}")]
	InvalidId {
		kind: &'static str,
		value: String,
		reason: String,
	},

	#[error("group is owned by both organization {organization} and project {project}")]
	InvalidGroupOwner {
		organization: OrgId,
		project: ProjectId,
	},
}

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $kind:literal, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl FromStr for $name {
			type Err = ModelError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Uuid::parse_str(s.trim())
					.map(Self)
					.map_err(|e| ModelError::InvalidId {
						kind: $kind,
						value: s.to_string(),
						reason: e.to_string(),
					})
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(UserId, "user", "Unique identifier for a user.");
define_id_type!(OrgId, "organization", "Unique identifier for an organization.");
define_id_type!(ProjectId, "project", "Unique identifier for a project.");
define_id_type!(GroupId, "group", "Unique identifier for a group.");

// =============================================================================
// Global Roles
// =============================================================================

/// System-wide role stored on every user account.
///
/// Only [`GlobalRole::Admin`] carries authorization weight: it marks the user
/// as a system administrator, which satisfies every policy predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GlobalRole {
	Admin,
	Manager,
	Tester,
	#[default]
	User,
}

impl GlobalRole {
	/// Returns all available global roles.
	pub fn all() -> &'static [GlobalRole] {
		&[
			GlobalRole::Admin,
			GlobalRole::Manager,
			GlobalRole::Tester,
			GlobalRole::User,
		]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			GlobalRole::Admin => "ADMIN",
			GlobalRole::Manager => "MANAGER",
			GlobalRole::Tester => "TESTER",
			GlobalRole::User => "USER",
		}
	}
}

impl fmt::Display for GlobalRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for GlobalRole {
	type Err = ModelError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::all()
			.iter()
			.copied()
			.find(|role| role.as_str() == s)
			.ok_or_else(|| ModelError::UnknownRole {
				level: "global",
				value: s.to_string(),
			})
	}
}

// =============================================================================
// Containment
// =============================================================================

/// A project and the organization that contains it, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
	pub id: ProjectId,
	pub organization_id: Option<OrgId>,
}

impl Project {
	pub fn independent(id: ProjectId) -> Self {
		Self {
			id,
			organization_id: None,
		}
	}

	pub fn in_organization(id: ProjectId, org_id: OrgId) -> Self {
		Self {
			id,
			organization_id: Some(org_id),
		}
	}

	pub fn is_independent(&self) -> bool {
		self.organization_id.is_none()
	}
}

/// The container a group belongs to.
///
/// A group has at most one owner. Storage that keeps the owner as two
/// nullable columns goes through [`GroupOwner::from_columns`], which rejects
/// rows where both are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum GroupOwner {
	Organization(OrgId),
	Project(ProjectId),
	Independent,
}

/// Where a new group would be created. Same shape as [`GroupOwner`].
pub type GroupParent = GroupOwner;

impl GroupOwner {
	pub fn from_columns(
		organization_id: Option<OrgId>,
		project_id: Option<ProjectId>,
	) -> Result<Self, ModelError> {
		match (organization_id, project_id) {
			(Some(organization), Some(project)) => Err(ModelError::InvalidGroupOwner {
				organization,
				project,
			}),
			(Some(org_id), None) => Ok(GroupOwner::Organization(org_id)),
			(None, Some(project_id)) => Ok(GroupOwner::Project(project_id)),
			(None, None) => Ok(GroupOwner::Independent),
		}
	}

	pub fn organization_id(&self) -> Option<OrgId> {
		match self {
			GroupOwner::Organization(id) => Some(*id),
			_ => None,
		}
	}

	pub fn project_id(&self) -> Option<ProjectId> {
		match self {
			GroupOwner::Project(id) => Some(*id),
			_ => None,
		}
	}

	pub fn is_independent(&self) -> bool {
		matches!(self, GroupOwner::Independent)
	}
}
