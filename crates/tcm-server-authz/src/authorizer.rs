// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use tracing::instrument;

use crate::check::Check;
use crate::error::Result;
use crate::members::MemberManager;
use crate::policy::{GroupPolicy, OrganizationPolicy, ProjectPolicy};
use crate::principal::{Principal, PrincipalProvider};
use crate::store::{ContainmentResolver, MembershipStore, UserDirectory};
use crate::types::GlobalRole;

/// Entry point bundling the three policies, member management and principal
/// resolution over one backing store.
#[derive(Clone)]
pub struct Authorizer {
	groups: GroupPolicy,
	members: MemberManager,
	directory: Arc<dyn UserDirectory>,
	system_admin_role: GlobalRole,
}

impl Authorizer {
	pub fn new<S>(store: Arc<S>) -> Self
	where
		S: MembershipStore + ContainmentResolver + UserDirectory + 'static,
	{
		let memberships: Arc<dyn MembershipStore> = store.clone();
		let containment: Arc<dyn ContainmentResolver> = store.clone();
		let groups = GroupPolicy::new(Arc::clone(&memberships), Arc::clone(&containment));

		Self {
			members: MemberManager::from_parts(memberships, containment, groups.clone()),
			groups,
			directory: store,
			system_admin_role: GlobalRole::Admin,
		}
	}

	/// Use a different global role as the system-administrator marker.
	pub fn with_system_admin_role(mut self, role: GlobalRole) -> Self {
		self.system_admin_role = role;
		self
	}

	pub fn system_admin_role(&self) -> GlobalRole {
		self.system_admin_role
	}

	pub fn organizations(&self) -> &OrganizationPolicy {
		self.groups.organizations()
	}

	pub fn projects(&self) -> &ProjectPolicy {
		self.groups.projects()
	}

	pub fn groups(&self) -> &GroupPolicy {
		&self.groups
	}

	pub fn members(&self) -> &MemberManager {
		&self.members
	}

	/// Evaluate one named decision.
	#[instrument(level = "debug", skip(self, principal), fields(check = %check))]
	pub async fn check(&self, check: &Check, principal: &Principal) -> Result<bool> {
		let orgs = self.organizations();
		let projects = self.projects();
		let groups = &self.groups;

		let allowed = match check {
			Check::OrgAccess { org_id } => orgs.can_access(org_id, principal).await?,
			Check::OrgManage { org_id } => orgs.can_manage(org_id, principal).await?,
			Check::OrgInvite { org_id } => orgs.can_invite_members(org_id, principal).await?,
			Check::OrgRemoveMember { org_id, target } => {
				orgs.can_remove_member(org_id, target, principal).await?
			}
			Check::OrgDelete { org_id } => orgs.can_delete_organization(org_id, principal).await?,
			Check::OrgTransferOwnership { org_id, target } => {
				orgs.can_transfer_ownership(org_id, target, principal).await?
			}
			Check::ProjectAccess { project_id } => projects.can_access(project_id, principal).await?,
			Check::ProjectManage { project_id } => projects.can_manage(project_id, principal).await?,
			Check::ProjectInvite { project_id } => {
				projects.can_invite_members(project_id, principal).await?
			}
			Check::ProjectRemoveMember { project_id, target } => {
				projects
					.can_remove_member(project_id, target, principal)
					.await?
			}
			Check::ProjectCreate { org_id } => {
				projects
					.can_create_project(org_id.as_ref(), principal)
					.await?
			}
			Check::ProjectUploadResults { project_id } => {
				projects.can_upload_results(project_id, principal).await?
			}
			Check::ProjectDelete { project_id } => {
				projects.can_delete_project(project_id, principal).await?
			}
			Check::ProjectTransfer { project_id, org_id } => {
				projects
					.can_transfer_project(project_id, org_id.as_ref(), principal)
					.await?
			}
			Check::GroupAccess { group_id } => groups.can_access(group_id, principal).await?,
			Check::GroupManage { group_id } => groups.can_manage(group_id, principal).await?,
			Check::GroupInvite { group_id } => groups.can_invite_members(group_id, principal).await?,
			Check::GroupRemoveMember { group_id, target } => {
				groups.can_remove_member(group_id, target, principal).await?
			}
			Check::GroupCreate { parent } => groups.can_create_group(parent, principal).await?,
			Check::GroupDelete { group_id } => groups.can_delete_group(group_id, principal).await?,
		};

		tracing::debug!(allowed, "decision");
		Ok(allowed)
	}

	/// Resolve a principal by login name. An unknown user resolves to an
	/// anonymous principal, which every check denies.
	#[instrument(level = "debug", skip(self))]
	pub async fn principal_for_username(&self, username: &str) -> Result<Principal> {
		let principal = match self.directory.find_user_by_username(username).await? {
			Some(user) => Principal::from_user(&user, self.system_admin_role),
			None => {
				tracing::debug!("unknown username resolves to anonymous principal");
				Principal::anonymous()
			}
		};
		Ok(principal)
	}

	/// Resolve the ambient request identity supplied by the transport layer.
	pub fn current_principal(&self, provider: &dyn PrincipalProvider) -> Result<Principal> {
		Ok(Principal::resolve(provider, self.system_admin_role)?)
	}
}
