// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Membership writes gated by the policies.
//!
//! Each operation evaluates the matching policy decision and, if allowed,
//! performs a single idempotent write. Inviting a user who already holds a
//! different role is judged as a role change. Inviting into a container or
//! for a user that does not exist is denied. A denial is reported as
//! [`MembershipChange::Denied`], never as an error. Every outcome is logged
//! under the `tcm::authz::audit` target.

use std::sync::Arc;

use tracing::instrument;

use crate::error::Result;
use crate::policy::GroupPolicy;
use crate::principal::Principal;
use crate::roles::{GroupRole, LevelRole, OrgRole, ProjectRole};
use crate::store::{ContainmentResolver, MembershipEdge, MembershipKey, MembershipStore};
use crate::types::{GroupId, OrgId, ProjectId, UserId};

const AUDIT_TARGET: &str = "tcm::authz::audit";

/// Outcome of a member-management operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
	Applied,
	Denied,
}

impl MembershipChange {
	pub fn is_applied(&self) -> bool {
		matches!(self, MembershipChange::Applied)
	}
}

#[derive(Clone)]
pub struct MemberManager {
	store: Arc<dyn MembershipStore>,
	containment: Arc<dyn ContainmentResolver>,
	policy: GroupPolicy,
}

impl MemberManager {
	pub fn new(store: Arc<dyn MembershipStore>, containment: Arc<dyn ContainmentResolver>) -> Self {
		Self {
			policy: GroupPolicy::new(Arc::clone(&store), Arc::clone(&containment)),
			store,
			containment,
		}
	}

	pub(crate) fn from_parts(
		store: Arc<dyn MembershipStore>,
		containment: Arc<dyn ContainmentResolver>,
		policy: GroupPolicy,
	) -> Self {
		Self {
			store,
			containment,
			policy,
		}
	}

	// =========================================================================
	// Organization
	// =========================================================================

	#[instrument(skip(self, principal), fields(org_id = %org_id, user_id = %user_id, role = %role))]
	pub async fn invite_org_member(
		&self,
		org_id: OrgId,
		user_id: UserId,
		role: OrgRole,
		principal: &Principal,
	) -> Result<MembershipChange> {
		let allowed = self.containment.user_exists(&user_id).await?
			&& self.containment.organization_exists(&org_id).await?
			&& self
				.policy
				.organizations()
				.can_assign_role(&org_id, &user_id, role, principal)
				.await?;
		self.upsert_if("invite", allowed, OrgRole::edge(org_id, user_id, role), principal)
			.await
	}

	#[instrument(skip(self, principal), fields(org_id = %org_id, user_id = %user_id))]
	pub async fn remove_org_member(
		&self,
		org_id: OrgId,
		user_id: UserId,
		principal: &Principal,
	) -> Result<MembershipChange> {
		let allowed = self
			.policy
			.organizations()
			.can_remove_member(&org_id, &user_id, principal)
			.await?;
		self.delete_if(allowed, OrgRole::key(org_id, user_id), principal)
			.await
	}

	#[instrument(skip(self, principal), fields(org_id = %org_id, user_id = %user_id, role = %role))]
	pub async fn change_org_member_role(
		&self,
		org_id: OrgId,
		user_id: UserId,
		role: OrgRole,
		principal: &Principal,
	) -> Result<MembershipChange> {
		let allowed = self
			.policy
			.organizations()
			.can_change_member_role(&org_id, &user_id, role, principal)
			.await?;
		self.upsert_if("change_role", allowed, OrgRole::edge(org_id, user_id, role), principal)
			.await
	}

	/// Hand ownership to an existing member. Every previous owner becomes an
	/// admin in the same write.
	#[instrument(skip(self, principal), fields(org_id = %org_id, new_owner = %new_owner))]
	pub async fn transfer_org_ownership(
		&self,
		org_id: OrgId,
		new_owner: UserId,
		principal: &Principal,
	) -> Result<MembershipChange> {
		let key = OrgRole::key(org_id, new_owner);
		let allowed = self
			.policy
			.organizations()
			.can_transfer_ownership(&org_id, &new_owner, principal)
			.await?;
		if !allowed {
			log_denied("transfer_ownership", &key, principal);
			return Ok(MembershipChange::Denied);
		}

		self.store.transfer_org_ownership(&org_id, &new_owner).await?;
		tracing::info!(
			target: AUDIT_TARGET,
			action = "transfer_ownership",
			scope = %key.level(),
			container = %key.container(),
			user_id = %new_owner,
			actor = ?principal.user_id(),
			"membership change applied"
		);
		Ok(MembershipChange::Applied)
	}

	// =========================================================================
	// Project
	// =========================================================================

	#[instrument(skip(self, principal), fields(project_id = %project_id, user_id = %user_id, role = %role))]
	pub async fn invite_project_member(
		&self,
		project_id: ProjectId,
		user_id: UserId,
		role: ProjectRole,
		principal: &Principal,
	) -> Result<MembershipChange> {
		let allowed = self.containment.user_exists(&user_id).await?
			&& self.containment.project_exists(&project_id).await?
			&& self
				.policy
				.projects()
				.can_assign_role(&project_id, &user_id, role, principal)
				.await?;
		self.upsert_if(
			"invite",
			allowed,
			ProjectRole::edge(project_id, user_id, role),
			principal,
		)
		.await
	}

	#[instrument(skip(self, principal), fields(project_id = %project_id, user_id = %user_id))]
	pub async fn remove_project_member(
		&self,
		project_id: ProjectId,
		user_id: UserId,
		principal: &Principal,
	) -> Result<MembershipChange> {
		let allowed = self
			.policy
			.projects()
			.can_remove_member(&project_id, &user_id, principal)
			.await?;
		self.delete_if(allowed, ProjectRole::key(project_id, user_id), principal)
			.await
	}

	#[instrument(skip(self, principal), fields(project_id = %project_id, user_id = %user_id, role = %role))]
	pub async fn change_project_member_role(
		&self,
		project_id: ProjectId,
		user_id: UserId,
		role: ProjectRole,
		principal: &Principal,
	) -> Result<MembershipChange> {
		let allowed = self
			.policy
			.projects()
			.can_change_member_role(&project_id, &user_id, role, principal)
			.await?;
		self.upsert_if(
			"change_role",
			allowed,
			ProjectRole::edge(project_id, user_id, role),
			principal,
		)
		.await
	}

	// =========================================================================
	// Group
	// =========================================================================

	#[instrument(skip(self, principal), fields(group_id = %group_id, user_id = %user_id, role = %role))]
	pub async fn invite_group_member(
		&self,
		group_id: GroupId,
		user_id: UserId,
		role: GroupRole,
		principal: &Principal,
	) -> Result<MembershipChange> {
		let allowed = self.containment.user_exists(&user_id).await?
			&& self.containment.group_exists(&group_id).await?
			&& self
				.policy
				.can_assign_role(&group_id, &user_id, role, principal)
				.await?;
		self.upsert_if("invite", allowed, GroupRole::edge(group_id, user_id, role), principal)
			.await
	}

	#[instrument(skip(self, principal), fields(group_id = %group_id, user_id = %user_id))]
	pub async fn remove_group_member(
		&self,
		group_id: GroupId,
		user_id: UserId,
		principal: &Principal,
	) -> Result<MembershipChange> {
		let allowed = self
			.policy
			.can_remove_member(&group_id, &user_id, principal)
			.await?;
		self.delete_if(allowed, GroupRole::key(group_id, user_id), principal)
			.await
	}

	#[instrument(skip(self, principal), fields(group_id = %group_id, user_id = %user_id, role = %role))]
	pub async fn change_group_member_role(
		&self,
		group_id: GroupId,
		user_id: UserId,
		role: GroupRole,
		principal: &Principal,
	) -> Result<MembershipChange> {
		let allowed = self
			.policy
			.can_change_member_role(&group_id, &user_id, role, principal)
			.await?;
		self.upsert_if(
			"change_role",
			allowed,
			GroupRole::edge(group_id, user_id, role),
			principal,
		)
		.await
	}

	async fn upsert_if(
		&self,
		action: &'static str,
		allowed: bool,
		edge: MembershipEdge,
		principal: &Principal,
	) -> Result<MembershipChange> {
		if !allowed {
			log_denied(action, &edge.key(), principal);
			return Ok(MembershipChange::Denied);
		}

		self.store.upsert_membership(edge).await?;
		tracing::info!(
			target: AUDIT_TARGET,
			action,
			scope = %edge.level(),
			container = %edge.key().container(),
			user_id = %edge.user_id(),
			role = edge.role_str(),
			actor = ?principal.user_id(),
			"membership change applied"
		);
		Ok(MembershipChange::Applied)
	}

	async fn delete_if(
		&self,
		allowed: bool,
		key: MembershipKey,
		principal: &Principal,
	) -> Result<MembershipChange> {
		if !allowed {
			log_denied("remove", &key, principal);
			return Ok(MembershipChange::Denied);
		}

		let existed = self.store.delete_membership(key).await?;
		tracing::info!(
			target: AUDIT_TARGET,
			action = "remove",
			scope = %key.level(),
			container = %key.container(),
			user_id = %key.user_id(),
			existed,
			actor = ?principal.user_id(),
			"membership change applied"
		);
		Ok(MembershipChange::Applied)
	}
}

fn log_denied(action: &'static str, key: &MembershipKey, principal: &Principal) {
	tracing::warn!(
		target: AUDIT_TARGET,
		action,
		scope = %key.level(),
		container = %key.container(),
		user_id = %key.user_id(),
		actor = ?principal.user_id(),
		"membership change denied"
	);
}
