// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Organization access policy.
//!
//! Organizations are the top of the hierarchy, so every decision here comes
//! from the principal's direct organization membership or the system-admin
//! flag.

use std::sync::Arc;

use tracing::instrument;

use super::hierarchy::HierarchicalPolicy;
use crate::error::Result;
use crate::principal::Principal;
use crate::roles::{Capabilities, OrgRole};
use crate::store::MembershipStore;
use crate::types::{OrgId, UserId};

#[derive(Clone)]
pub struct OrganizationPolicy {
	members: HierarchicalPolicy<OrgRole>,
}

impl OrganizationPolicy {
	pub fn new(store: Arc<dyn MembershipStore>) -> Self {
		Self {
			members: HierarchicalPolicy::new(store),
		}
	}

	pub async fn role_of(&self, org_id: &OrgId, principal: &Principal) -> Result<Option<OrgRole>> {
		self.members.role_of(org_id, principal).await
	}

	pub async fn is_member(&self, org_id: &OrgId, principal: &Principal) -> Result<bool> {
		self.members.is_member(org_id, principal).await
	}

	pub async fn has_admin_role(&self, org_id: &OrgId, principal: &Principal) -> Result<bool> {
		self.members
			.has_capabilities(org_id, principal, Capabilities::MANAGE)
			.await
	}

	pub async fn is_owner(&self, org_id: &OrgId, principal: &Principal) -> Result<bool> {
		self.members.is_top_rank(org_id, principal).await
	}

	#[instrument(level = "debug", skip(self, principal), fields(org_id = %org_id))]
	pub async fn can_access(&self, org_id: &OrgId, principal: &Principal) -> Result<bool> {
		if principal.is_system_admin() {
			return Ok(true);
		}
		self.is_member(org_id, principal).await
	}

	#[instrument(level = "debug", skip(self, principal), fields(org_id = %org_id))]
	pub async fn can_manage(&self, org_id: &OrgId, principal: &Principal) -> Result<bool> {
		if principal.is_system_admin() {
			return Ok(true);
		}
		self.has_admin_role(org_id, principal).await
	}

	pub async fn can_invite_members(&self, org_id: &OrgId, principal: &Principal) -> Result<bool> {
		self.can_manage(org_id, principal).await
	}

	/// Admins may remove members and other admins. Removing an owner takes
	/// another owner.
	pub async fn can_remove_member(
		&self,
		org_id: &OrgId,
		target: &UserId,
		principal: &Principal,
	) -> Result<bool> {
		self.members
			.can_remove(org_id, target, principal, || self.can_manage(org_id, principal))
			.await
	}

	#[instrument(level = "debug", skip(self, principal), fields(org_id = %org_id))]
	pub async fn can_delete_organization(&self, org_id: &OrgId, principal: &Principal) -> Result<bool> {
		if principal.is_system_admin() {
			return Ok(true);
		}
		self.is_owner(org_id, principal).await
	}

	/// Ownership moves from an owner, or a system admin acting for one, to an
	/// existing member who is not already an owner.
	#[instrument(level = "debug", skip(self, principal), fields(org_id = %org_id, new_owner = %new_owner))]
	pub async fn can_transfer_ownership(
		&self,
		org_id: &OrgId,
		new_owner: &UserId,
		principal: &Principal,
	) -> Result<bool> {
		if !principal.is_system_admin() && !self.is_owner(org_id, principal).await? {
			return Ok(false);
		}
		Ok(self
			.members
			.role_of_user(org_id, new_owner)
			.await?
			.is_some_and(|role| !role.is_owner()))
	}

	pub async fn can_grant_role(
		&self,
		org_id: &OrgId,
		role: OrgRole,
		principal: &Principal,
	) -> Result<bool> {
		self.members
			.can_grant(org_id, role, principal, || {
				self.can_invite_members(org_id, principal)
			})
			.await
	}

	/// Whether `target` may be invited with `role`. Re-inviting an existing
	/// member with a different role counts as a role change.
	pub async fn can_assign_role(
		&self,
		org_id: &OrgId,
		target: &UserId,
		role: OrgRole,
		principal: &Principal,
	) -> Result<bool> {
		self.members
			.can_assign(
				org_id,
				target,
				role,
				principal,
				|| self.can_invite_members(org_id, principal),
				|| self.can_manage(org_id, principal),
			)
			.await
	}

	pub async fn can_change_member_role(
		&self,
		org_id: &OrgId,
		target: &UserId,
		new_role: OrgRole,
		principal: &Principal,
	) -> Result<bool> {
		self.members
			.can_change_role(org_id, target, new_role, principal, || {
				self.can_manage(org_id, principal)
			})
			.await
	}
}
