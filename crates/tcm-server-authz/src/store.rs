// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Collaborator contracts the engine reads and writes through.
//!
//! The engine never owns storage. It asks a [`MembershipStore`] for the role
//! a user holds in a container, a [`ContainmentResolver`] for what contains
//! what, and a [`UserDirectory`] for account lookups. Implementations live in
//! [`crate::memory`] and in the `tcm-server-db` crate.

use async_trait::async_trait;
use std::error::Error as StdError;

use crate::roles::{GroupRole, Level, OrgRole, ProjectRole};
use crate::types::{GlobalRole, GroupId, GroupOwner, OrgId, ProjectId, UserId};

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A collaborator failed to answer.
///
/// Never treated as a deny: the policies surface it as
/// [`crate::AuthzError::Indeterminate`].
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct StoreError {
	message: String,
	#[source]
	source: Option<BoxError>,
}

impl StoreError {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			source: None,
		}
	}

	pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
		Self {
			message: message.into(),
			source: Some(source.into()),
		}
	}

	pub fn message(&self) -> &str {
		&self.message
	}
}

/// A membership edge to create or overwrite, tagged by level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipEdge {
	Organization {
		org_id: OrgId,
		user_id: UserId,
		role: OrgRole,
	},
	Project {
		project_id: ProjectId,
		user_id: UserId,
		role: ProjectRole,
	},
	Group {
		group_id: GroupId,
		user_id: UserId,
		role: GroupRole,
	},
}

impl MembershipEdge {
	pub fn level(&self) -> Level {
		match self {
			MembershipEdge::Organization { .. } => Level::Organization,
			MembershipEdge::Project { .. } => Level::Project,
			MembershipEdge::Group { .. } => Level::Group,
		}
	}

	pub fn user_id(&self) -> UserId {
		match self {
			MembershipEdge::Organization { user_id, .. }
			| MembershipEdge::Project { user_id, .. }
			| MembershipEdge::Group { user_id, .. } => *user_id,
		}
	}

	pub fn key(&self) -> MembershipKey {
		match *self {
			MembershipEdge::Organization { org_id, user_id, .. } => {
				MembershipKey::Organization { org_id, user_id }
			}
			MembershipEdge::Project {
				project_id,
				user_id,
				..
			} => MembershipKey::Project {
				project_id,
				user_id,
			},
			MembershipEdge::Group {
				group_id, user_id, ..
			} => MembershipKey::Group { group_id, user_id },
		}
	}

	pub fn role_str(&self) -> &'static str {
		match self {
			MembershipEdge::Organization { role, .. } => role.as_str(),
			MembershipEdge::Project { role, .. } => role.as_str(),
			MembershipEdge::Group { role, .. } => role.as_str(),
		}
	}
}

/// Identifies one membership edge, tagged by level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MembershipKey {
	Organization { org_id: OrgId, user_id: UserId },
	Project { project_id: ProjectId, user_id: UserId },
	Group { group_id: GroupId, user_id: UserId },
}

impl MembershipKey {
	pub fn level(&self) -> Level {
		match self {
			MembershipKey::Organization { .. } => Level::Organization,
			MembershipKey::Project { .. } => Level::Project,
			MembershipKey::Group { .. } => Level::Group,
		}
	}

	pub fn user_id(&self) -> UserId {
		match self {
			MembershipKey::Organization { user_id, .. }
			| MembershipKey::Project { user_id, .. }
			| MembershipKey::Group { user_id, .. } => *user_id,
		}
	}

	/// The container id as a string, for logging.
	pub fn container(&self) -> String {
		match self {
			MembershipKey::Organization { org_id, .. } => org_id.to_string(),
			MembershipKey::Project { project_id, .. } => project_id.to_string(),
			MembershipKey::Group { group_id, .. } => group_id.to_string(),
		}
	}
}

/// Read/write access to the three membership relations.
#[async_trait]
pub trait MembershipStore: Send + Sync {
	async fn find_org_membership(
		&self,
		org_id: &OrgId,
		user_id: &UserId,
	) -> Result<Option<OrgRole>, StoreError>;

	async fn find_project_membership(
		&self,
		project_id: &ProjectId,
		user_id: &UserId,
	) -> Result<Option<ProjectRole>, StoreError>;

	async fn find_group_membership(
		&self,
		group_id: &GroupId,
		user_id: &UserId,
	) -> Result<Option<GroupRole>, StoreError>;

	/// Create the edge, or replace the role of an existing one.
	async fn upsert_membership(&self, edge: MembershipEdge) -> Result<(), StoreError>;

	/// Delete the edge. Returns whether it existed; absence is not an error.
	async fn delete_membership(&self, key: MembershipKey) -> Result<bool, StoreError>;

	/// Make `new_owner` the organization's owner and demote every other owner
	/// to admin, as one atomic write. `new_owner` must already be a member.
	async fn transfer_org_ownership(
		&self,
		org_id: &OrgId,
		new_owner: &UserId,
	) -> Result<(), StoreError>;
}

/// Answers containment questions about projects, groups and users.
#[async_trait]
pub trait ContainmentResolver: Send + Sync {
	/// The organization containing `project_id`. `None` for an independent or
	/// unknown project.
	async fn project_organization(&self, project_id: &ProjectId)
		-> Result<Option<OrgId>, StoreError>;

	/// The owner of `group_id`, or `None` if the group does not exist.
	async fn group_owner(&self, group_id: &GroupId) -> Result<Option<GroupOwner>, StoreError>;

	async fn organization_exists(&self, org_id: &OrgId) -> Result<bool, StoreError>;

	async fn project_exists(&self, project_id: &ProjectId) -> Result<bool, StoreError>;

	async fn group_exists(&self, group_id: &GroupId) -> Result<bool, StoreError>;

	async fn user_exists(&self, user_id: &UserId) -> Result<bool, StoreError>;
}

/// A user account as seen by principal resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
	pub id: UserId,
	pub username: String,
	pub display_name: String,
	pub global_role: GlobalRole,
}

/// Account lookups by login name.
#[async_trait]
pub trait UserDirectory: Send + Sync {
	async fn find_user_by_username(&self, username: &str)
		-> Result<Option<UserRecord>, StoreError>;
}
