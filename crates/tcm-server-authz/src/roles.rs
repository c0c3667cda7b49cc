// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role enums for the three container levels and their capability table.
//!
//! Every role maps to a fixed [`Capabilities`] set. The predicates on each
//! role enum are lookups in that table, and the policies only ever ask the
//! table, never match on role variants directly. [`Capabilities::TOP_RANK`]
//! marks the single role per level that is protected from removal by
//! non-peers: [`OrgRole::Owner`], [`ProjectRole::ProjectManager`] and
//! [`GroupRole::Leader`].

use bitflags::bitflags;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use crate::store::{MembershipEdge, MembershipKey, MembershipStore, StoreError};
use crate::types::{GroupId, ModelError, OrgId, ProjectId, UserId};

bitflags! {
	/// What a membership role allows at its own level.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct Capabilities: u8 {
		/// Read the container and participate in it.
		const ACCESS = 0b0000_0001;
		/// Modify content inside the container.
		const EDIT = 0b0000_0010;
		/// Run and record test executions.
		const EXECUTE = 0b0000_0100;
		/// Add new members.
		const INVITE = 0b0000_1000;
		/// Administer the container and its members.
		const MANAGE = 0b0001_0000;
		/// The protected top role of the level.
		const TOP_RANK = 0b0010_0000;
	}
}

impl Capabilities {
	const CONTENT: Capabilities = Capabilities::ACCESS
		.union(Capabilities::EDIT)
		.union(Capabilities::EXECUTE);
	const ADMINISTRATION: Capabilities = Capabilities::CONTENT
		.union(Capabilities::INVITE)
		.union(Capabilities::MANAGE);
}

/// A level of the containment hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
	Organization,
	Project,
	Group,
}

impl fmt::Display for Level {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Level::Organization => write!(f, "organization"),
			Level::Project => write!(f, "project"),
			Level::Group => write!(f, "group"),
		}
	}
}

/// Who may remove a member holding the top-rank role of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopRankRemoval {
	/// A manager may remove a top-rank member only if they are top-rank too.
	PeerOnly,
	/// A top-rank member can never remove another top-rank member locally.
	Never,
}

/// A role enum usable by [`crate::policy::HierarchicalPolicy`].
pub trait LevelRole:
	Copy + Eq + Hash + fmt::Debug + fmt::Display + FromStr<Err = ModelError> + Send + Sync + 'static
{
	/// Id of the container this role is held in.
	type Container: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

	const LEVEL: Level;
	const TOP_RANK_REMOVAL: TopRankRemoval;

	fn all() -> &'static [Self];

	fn capabilities(self) -> Capabilities;

	fn as_str(&self) -> &'static str;

	fn is_top_rank(self) -> bool {
		self.capabilities().contains(Capabilities::TOP_RANK)
	}

	/// Look up the role `user_id` holds in `container`.
	fn find<'a>(
		store: &'a dyn MembershipStore,
		container: &'a Self::Container,
		user_id: &'a UserId,
	) -> BoxFuture<'a, Result<Option<Self>, StoreError>>;

	fn edge(container: Self::Container, user_id: UserId, role: Self) -> MembershipEdge;

	fn key(container: Self::Container, user_id: UserId) -> MembershipKey;
}

macro_rules! impl_role_strings {
	($role:ident, $level:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
		impl $role {
			/// Returns all roles of this level, highest first.
			pub fn all() -> &'static [$role] {
				&[$($role::$variant),+]
			}

			pub fn as_str(&self) -> &'static str {
				match self {
					$($role::$variant => $wire),+
				}
			}
		}

		impl fmt::Display for $role {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(self.as_str())
			}
		}

		impl FromStr for $role {
			type Err = ModelError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				match s {
					$($wire => Ok($role::$variant),)+
					_ => Err(ModelError::UnknownRole {
						level: $level,
						value: s.to_string(),
					}),
				}
			}
		}
	};
}

// =============================================================================
// Organization Roles
// =============================================================================

/// Roles within an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrgRole {
	/// Full control, can delete the organization and remove other owners.
	Owner,
	/// Manages members and contained projects and groups.
	Admin,
	Member,
}

impl_role_strings!(OrgRole, "organization", {
	Owner => "OWNER",
	Admin => "ADMIN",
	Member => "MEMBER",
});

impl OrgRole {
	pub fn capabilities(self) -> Capabilities {
		match self {
			OrgRole::Owner => Capabilities::ADMINISTRATION | Capabilities::TOP_RANK,
			OrgRole::Admin => Capabilities::ADMINISTRATION,
			OrgRole::Member => Capabilities::ACCESS,
		}
	}

	pub fn has_admin_privileges(self) -> bool {
		self.capabilities().contains(Capabilities::MANAGE)
	}

	pub fn is_owner(self) -> bool {
		self.capabilities().contains(Capabilities::TOP_RANK)
	}
}

impl LevelRole for OrgRole {
	type Container = OrgId;

	const LEVEL: Level = Level::Organization;
	const TOP_RANK_REMOVAL: TopRankRemoval = TopRankRemoval::PeerOnly;

	fn all() -> &'static [Self] {
		OrgRole::all()
	}

	fn capabilities(self) -> Capabilities {
		OrgRole::capabilities(self)
	}

	fn as_str(&self) -> &'static str {
		OrgRole::as_str(self)
	}

	fn find<'a>(
		store: &'a dyn MembershipStore,
		container: &'a OrgId,
		user_id: &'a UserId,
	) -> BoxFuture<'a, Result<Option<Self>, StoreError>> {
		store.find_org_membership(container, user_id)
	}

	fn edge(container: OrgId, user_id: UserId, role: Self) -> MembershipEdge {
		MembershipEdge::Organization {
			org_id: container,
			user_id,
			role,
		}
	}

	fn key(container: OrgId, user_id: UserId) -> MembershipKey {
		MembershipKey::Organization {
			org_id: container,
			user_id,
		}
	}
}

// =============================================================================
// Project Roles
// =============================================================================

/// Roles within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectRole {
	/// Full control, the only role that may remove another manager.
	ProjectManager,
	LeadDeveloper,
	Developer,
	/// Executes test runs but does not edit content.
	Tester,
	Contributor,
	/// Read-only.
	Viewer,
}

impl_role_strings!(ProjectRole, "project", {
	ProjectManager => "PROJECT_MANAGER",
	LeadDeveloper => "LEAD_DEVELOPER",
	Developer => "DEVELOPER",
	Tester => "TESTER",
	Contributor => "CONTRIBUTOR",
	Viewer => "VIEWER",
});

impl ProjectRole {
	pub fn capabilities(self) -> Capabilities {
		match self {
			ProjectRole::ProjectManager => Capabilities::ADMINISTRATION | Capabilities::TOP_RANK,
			ProjectRole::LeadDeveloper => Capabilities::ADMINISTRATION,
			ProjectRole::Developer | ProjectRole::Contributor => Capabilities::CONTENT,
			ProjectRole::Tester => Capabilities::ACCESS | Capabilities::EXECUTE,
			ProjectRole::Viewer => Capabilities::ACCESS,
		}
	}

	pub fn has_management_privileges(self) -> bool {
		self.capabilities().contains(Capabilities::MANAGE)
	}

	pub fn is_manager(self) -> bool {
		self.capabilities().contains(Capabilities::TOP_RANK)
	}

	pub fn can_edit(self) -> bool {
		self.capabilities().contains(Capabilities::EDIT)
	}

	pub fn can_execute(self) -> bool {
		self.capabilities().contains(Capabilities::EXECUTE)
	}
}

impl LevelRole for ProjectRole {
	type Container = ProjectId;

	const LEVEL: Level = Level::Project;
	const TOP_RANK_REMOVAL: TopRankRemoval = TopRankRemoval::PeerOnly;

	fn all() -> &'static [Self] {
		ProjectRole::all()
	}

	fn capabilities(self) -> Capabilities {
		ProjectRole::capabilities(self)
	}

	fn as_str(&self) -> &'static str {
		ProjectRole::as_str(self)
	}

	fn find<'a>(
		store: &'a dyn MembershipStore,
		container: &'a ProjectId,
		user_id: &'a UserId,
	) -> BoxFuture<'a, Result<Option<Self>, StoreError>> {
		store.find_project_membership(container, user_id)
	}

	fn edge(container: ProjectId, user_id: UserId, role: Self) -> MembershipEdge {
		MembershipEdge::Project {
			project_id: container,
			user_id,
			role,
		}
	}

	fn key(container: ProjectId, user_id: UserId) -> MembershipKey {
		MembershipKey::Project {
			project_id: container,
			user_id,
		}
	}
}

// =============================================================================
// Group Roles
// =============================================================================

/// Roles within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupRole {
	/// Manages the group. A leader cannot remove another leader.
	Leader,
	/// May invite members but does not manage the group.
	CoLeader,
	Member,
}

impl_role_strings!(GroupRole, "group", {
	Leader => "LEADER",
	CoLeader => "CO_LEADER",
	Member => "MEMBER",
});

impl GroupRole {
	pub fn capabilities(self) -> Capabilities {
		match self {
			GroupRole::Leader => {
				Capabilities::ACCESS
					| Capabilities::INVITE
					| Capabilities::MANAGE
					| Capabilities::TOP_RANK
			}
			GroupRole::CoLeader => Capabilities::ACCESS | Capabilities::INVITE,
			GroupRole::Member => Capabilities::ACCESS,
		}
	}

	pub fn has_leadership_role(self) -> bool {
		self.capabilities().contains(Capabilities::INVITE)
	}

	pub fn is_leader(self) -> bool {
		self.capabilities().contains(Capabilities::TOP_RANK)
	}
}

impl LevelRole for GroupRole {
	type Container = GroupId;

	const LEVEL: Level = Level::Group;
	const TOP_RANK_REMOVAL: TopRankRemoval = TopRankRemoval::Never;

	fn all() -> &'static [Self] {
		GroupRole::all()
	}

	fn capabilities(self) -> Capabilities {
		GroupRole::capabilities(self)
	}

	fn as_str(&self) -> &'static str {
		GroupRole::as_str(self)
	}

	fn find<'a>(
		store: &'a dyn MembershipStore,
		container: &'a GroupId,
		user_id: &'a UserId,
	) -> BoxFuture<'a, Result<Option<Self>, StoreError>> {
		store.find_group_membership(container, user_id)
	}

	fn edge(container: GroupId, user_id: UserId, role: Self) -> MembershipEdge {
		MembershipEdge::Group {
			group_id: container,
			user_id,
			role,
		}
	}

	fn key(container: GroupId, user_id: UserId) -> MembershipKey {
		MembershipKey::Group {
			group_id: container,
			user_id,
		}
	}
}
