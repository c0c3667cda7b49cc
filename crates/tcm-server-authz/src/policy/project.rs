// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Project access policy.
//!
//! Direct project membership is checked first. A project contained in an
//! organization additionally grants access to every organization member and
//! management to every organization admin. Organization membership only ever
//! adds rights.

use std::sync::Arc;

use tracing::instrument;

use super::hierarchy::HierarchicalPolicy;
use super::org::OrganizationPolicy;
use crate::error::Result;
use crate::principal::Principal;
use crate::roles::{Capabilities, ProjectRole};
use crate::store::{ContainmentResolver, MembershipStore};
use crate::types::{OrgId, ProjectId, UserId};

#[derive(Clone)]
pub struct ProjectPolicy {
	members: HierarchicalPolicy<ProjectRole>,
	containment: Arc<dyn ContainmentResolver>,
	organizations: OrganizationPolicy,
}

impl ProjectPolicy {
	pub fn new(store: Arc<dyn MembershipStore>, containment: Arc<dyn ContainmentResolver>) -> Self {
		Self {
			members: HierarchicalPolicy::new(Arc::clone(&store)),
			containment,
			organizations: OrganizationPolicy::new(store),
		}
	}

	pub fn organizations(&self) -> &OrganizationPolicy {
		&self.organizations
	}

	pub async fn role_of(
		&self,
		project_id: &ProjectId,
		principal: &Principal,
	) -> Result<Option<ProjectRole>> {
		self.members.role_of(project_id, principal).await
	}

	pub async fn is_member(&self, project_id: &ProjectId, principal: &Principal) -> Result<bool> {
		self.members.is_member(project_id, principal).await
	}

	pub async fn has_management_role(
		&self,
		project_id: &ProjectId,
		principal: &Principal,
	) -> Result<bool> {
		self.members
			.has_capabilities(project_id, principal, Capabilities::MANAGE)
			.await
	}

	pub async fn has_edit_role(&self, project_id: &ProjectId, principal: &Principal) -> Result<bool> {
		self.members
			.has_capabilities(project_id, principal, Capabilities::EDIT)
			.await
	}

	pub async fn has_execute_role(
		&self,
		project_id: &ProjectId,
		principal: &Principal,
	) -> Result<bool> {
		self.members
			.has_capabilities(project_id, principal, Capabilities::EXECUTE)
			.await
	}

	pub async fn is_project_manager(
		&self,
		project_id: &ProjectId,
		principal: &Principal,
	) -> Result<bool> {
		self.members.is_top_rank(project_id, principal).await
	}

	async fn organization_of(&self, project_id: &ProjectId) -> Result<Option<OrgId>> {
		Ok(self.containment.project_organization(project_id).await?)
	}

	#[instrument(level = "debug", skip(self, principal), fields(project_id = %project_id))]
	pub async fn can_access(&self, project_id: &ProjectId, principal: &Principal) -> Result<bool> {
		if principal.is_system_admin() {
			return Ok(true);
		}
		if self.is_member(project_id, principal).await? {
			return Ok(true);
		}
		match self.organization_of(project_id).await? {
			Some(org_id) => self.organizations.is_member(&org_id, principal).await,
			None => Ok(false),
		}
	}

	#[instrument(level = "debug", skip(self, principal), fields(project_id = %project_id))]
	pub async fn can_manage(&self, project_id: &ProjectId, principal: &Principal) -> Result<bool> {
		if principal.is_system_admin() {
			return Ok(true);
		}
		if self.has_management_role(project_id, principal).await? {
			return Ok(true);
		}
		match self.organization_of(project_id).await? {
			Some(org_id) => self.organizations.has_admin_role(&org_id, principal).await,
			None => Ok(false),
		}
	}

	pub async fn can_invite_members(
		&self,
		project_id: &ProjectId,
		principal: &Principal,
	) -> Result<bool> {
		self.can_manage(project_id, principal).await
	}

	/// Removing a project manager takes another project manager.
	pub async fn can_remove_member(
		&self,
		project_id: &ProjectId,
		target: &UserId,
		principal: &Principal,
	) -> Result<bool> {
		self.members
			.can_remove(project_id, target, principal, || {
				self.can_manage(project_id, principal)
			})
			.await
	}

	/// A contained project needs organization management rights. Anyone with
	/// a known account may create an independent one.
	#[instrument(level = "debug", skip(self, principal), fields(org_id = ?org_id))]
	pub async fn can_create_project(
		&self,
		org_id: Option<&OrgId>,
		principal: &Principal,
	) -> Result<bool> {
		if principal.is_system_admin() {
			return Ok(true);
		}
		match org_id {
			Some(org_id) => self.organizations.can_manage(org_id, principal).await,
			None => match principal.user_id() {
				Some(user_id) => Ok(self.containment.user_exists(user_id).await?),
				None => Ok(false),
			},
		}
	}

	#[instrument(level = "debug", skip(self, principal), fields(project_id = %project_id))]
	pub async fn can_delete_project(
		&self,
		project_id: &ProjectId,
		principal: &Principal,
	) -> Result<bool> {
		if principal.is_system_admin() {
			return Ok(true);
		}
		self.is_project_manager(project_id, principal).await
	}

	/// Moving a project takes its project manager. Moving it into an
	/// organization also needs the right to create projects there; making it
	/// independent needs nothing more.
	#[instrument(level = "debug", skip(self, principal), fields(project_id = %project_id, destination = ?destination))]
	pub async fn can_transfer_project(
		&self,
		project_id: &ProjectId,
		destination: Option<&OrgId>,
		principal: &Principal,
	) -> Result<bool> {
		if principal.is_system_admin() {
			return Ok(true);
		}
		if !self.is_project_manager(project_id, principal).await? {
			return Ok(false);
		}
		match destination {
			Some(_) => self.can_create_project(destination, principal).await,
			None => Ok(true),
		}
	}

	/// Uploading test results is open to everyone who can see the project.
	pub async fn can_upload_results(
		&self,
		project_id: &ProjectId,
		principal: &Principal,
	) -> Result<bool> {
		self.can_access(project_id, principal).await
	}

	pub async fn can_grant_role(
		&self,
		project_id: &ProjectId,
		role: ProjectRole,
		principal: &Principal,
	) -> Result<bool> {
		self.members
			.can_grant(project_id, role, principal, || {
				self.can_invite_members(project_id, principal)
			})
			.await
	}

	/// Whether `target` may be invited with `role`. Re-inviting an existing
	/// member with a different role counts as a role change.
	pub async fn can_assign_role(
		&self,
		project_id: &ProjectId,
		target: &UserId,
		role: ProjectRole,
		principal: &Principal,
	) -> Result<bool> {
		self.members
			.can_assign(
				project_id,
				target,
				role,
				principal,
				|| self.can_invite_members(project_id, principal),
				|| self.can_manage(project_id, principal),
			)
			.await
	}

	pub async fn can_change_member_role(
		&self,
		project_id: &ProjectId,
		target: &UserId,
		new_role: ProjectRole,
		principal: &Principal,
	) -> Result<bool> {
		self.members
			.can_change_role(project_id, target, new_role, principal, || {
				self.can_manage(project_id, principal)
			})
			.await
	}
}
