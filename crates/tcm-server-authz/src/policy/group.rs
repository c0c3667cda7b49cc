// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Group access policy.
//!
//! A group is owned by an organization, by a project, or by nobody. The
//! owner decides where inherited rights come from:
//!
//! ```text
//! Group ──► Organization                       (is_member / has_admin_role)
//! Group ──► Project ──► Organization           (project can_access / can_manage)
//! Group    (independent: direct membership only)
//! ```

use std::sync::Arc;

use tracing::instrument;

use super::hierarchy::HierarchicalPolicy;
use super::org::OrganizationPolicy;
use super::project::ProjectPolicy;
use crate::error::Result;
use crate::principal::Principal;
use crate::roles::{Capabilities, GroupRole};
use crate::store::{ContainmentResolver, MembershipStore};
use crate::types::{GroupId, GroupOwner, GroupParent, UserId};

#[derive(Clone)]
pub struct GroupPolicy {
	members: HierarchicalPolicy<GroupRole>,
	containment: Arc<dyn ContainmentResolver>,
	projects: ProjectPolicy,
}

impl GroupPolicy {
	pub fn new(store: Arc<dyn MembershipStore>, containment: Arc<dyn ContainmentResolver>) -> Self {
		Self {
			members: HierarchicalPolicy::new(Arc::clone(&store)),
			containment: Arc::clone(&containment),
			projects: ProjectPolicy::new(store, containment),
		}
	}

	pub fn projects(&self) -> &ProjectPolicy {
		&self.projects
	}

	pub fn organizations(&self) -> &OrganizationPolicy {
		self.projects.organizations()
	}

	pub async fn role_of(&self, group_id: &GroupId, principal: &Principal) -> Result<Option<GroupRole>> {
		self.members.role_of(group_id, principal).await
	}

	pub async fn is_member(&self, group_id: &GroupId, principal: &Principal) -> Result<bool> {
		self.members.is_member(group_id, principal).await
	}

	/// Leader or co-leader.
	pub async fn has_leadership_role(&self, group_id: &GroupId, principal: &Principal) -> Result<bool> {
		self.members
			.has_capabilities(group_id, principal, Capabilities::INVITE)
			.await
	}

	pub async fn is_leader(&self, group_id: &GroupId, principal: &Principal) -> Result<bool> {
		self.members.is_top_rank(group_id, principal).await
	}

	/// A missing group has no owner and therefore inherits nothing.
	async fn owner_of(&self, group_id: &GroupId) -> Result<GroupOwner> {
		Ok(self
			.containment
			.group_owner(group_id)
			.await?
			.unwrap_or(GroupOwner::Independent))
	}

	#[instrument(level = "debug", skip(self, principal), fields(group_id = %group_id))]
	pub async fn can_access(&self, group_id: &GroupId, principal: &Principal) -> Result<bool> {
		if principal.is_system_admin() {
			return Ok(true);
		}
		if self.is_member(group_id, principal).await? {
			return Ok(true);
		}
		match self.owner_of(group_id).await? {
			GroupOwner::Organization(org_id) => {
				self.organizations().is_member(&org_id, principal).await
			}
			GroupOwner::Project(project_id) => self.projects.can_access(&project_id, principal).await,
			GroupOwner::Independent => Ok(false),
		}
	}

	#[instrument(level = "debug", skip(self, principal), fields(group_id = %group_id))]
	pub async fn can_manage(&self, group_id: &GroupId, principal: &Principal) -> Result<bool> {
		if principal.is_system_admin() {
			return Ok(true);
		}
		if self.is_leader(group_id, principal).await? {
			return Ok(true);
		}
		match self.owner_of(group_id).await? {
			GroupOwner::Organization(org_id) => {
				self.organizations().has_admin_role(&org_id, principal).await
			}
			GroupOwner::Project(project_id) => self.projects.can_manage(&project_id, principal).await,
			GroupOwner::Independent => Ok(false),
		}
	}

	/// Co-leaders may invite even though they cannot manage the group.
	pub async fn can_invite_members(&self, group_id: &GroupId, principal: &Principal) -> Result<bool> {
		if principal.is_system_admin() {
			return Ok(true);
		}
		if self.has_leadership_role(group_id, principal).await? {
			return Ok(true);
		}
		self.can_manage(group_id, principal).await
	}

	/// A leader may remove anyone except another leader. Everyone else falls
	/// back to [`GroupPolicy::can_manage`].
	pub async fn can_remove_member(
		&self,
		group_id: &GroupId,
		target: &UserId,
		principal: &Principal,
	) -> Result<bool> {
		self.members
			.can_remove(group_id, target, principal, || {
				self.can_manage(group_id, principal)
			})
			.await
	}

	#[instrument(level = "debug", skip(self, principal), fields(parent = ?parent))]
	pub async fn can_create_group(&self, parent: &GroupParent, principal: &Principal) -> Result<bool> {
		if principal.is_system_admin() {
			return Ok(true);
		}
		match parent {
			GroupOwner::Organization(org_id) => self.organizations().can_manage(org_id, principal).await,
			GroupOwner::Project(project_id) => self.projects.can_manage(project_id, principal).await,
			GroupOwner::Independent => match principal.user_id() {
				Some(user_id) => Ok(self.containment.user_exists(user_id).await?),
				None => Ok(false),
			},
		}
	}

	#[instrument(level = "debug", skip(self, principal), fields(group_id = %group_id))]
	pub async fn can_delete_group(&self, group_id: &GroupId, principal: &Principal) -> Result<bool> {
		if principal.is_system_admin() {
			return Ok(true);
		}
		self.is_leader(group_id, principal).await
	}

	/// Gate for leader-only group operations such as editing the group.
	pub async fn has_leader_role(&self, group_id: &GroupId, principal: &Principal) -> Result<bool> {
		if self.is_leader(group_id, principal).await? {
			return Ok(true);
		}
		self.can_manage(group_id, principal).await
	}

	pub async fn can_grant_role(
		&self,
		group_id: &GroupId,
		role: GroupRole,
		principal: &Principal,
	) -> Result<bool> {
		self.members
			.can_grant(group_id, role, principal, || {
				self.can_invite_members(group_id, principal)
			})
			.await
	}

	/// Whether `target` may be invited with `role`. Re-inviting an existing
	/// member with a different role counts as a role change.
	pub async fn can_assign_role(
		&self,
		group_id: &GroupId,
		target: &UserId,
		role: GroupRole,
		principal: &Principal,
	) -> Result<bool> {
		self.members
			.can_assign(
				group_id,
				target,
				role,
				principal,
				|| self.can_invite_members(group_id, principal),
				|| self.can_manage(group_id, principal),
			)
			.await
	}

	pub async fn can_change_member_role(
		&self,
		group_id: &GroupId,
		target: &UserId,
		new_role: GroupRole,
		principal: &Principal,
	) -> Result<bool> {
		self.members
			.can_change_role(group_id, target, new_role, principal, || {
				self.can_manage(group_id, principal)
			})
			.await
	}
}
