// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Collaborator failures must surface as indeterminate, never as a deny.

use async_trait::async_trait;
use std::sync::Arc;
use tcm_server_authz::{
	Authorizer, AuthzError, Check, ContainmentResolver, GroupId, GroupOwner, GroupRole,
	MembershipEdge, MembershipKey, MembershipStore, OrgId, OrgRole, Principal, ProjectId,
	ProjectRole, StoreError, UserDirectory, UserId, UserRecord,
};

/// Every lookup fails as if the database were unreachable.
struct Unreachable;

fn outage() -> StoreError {
	StoreError::with_source(
		"store unavailable",
		std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
	)
}

#[async_trait]
impl MembershipStore for Unreachable {
	async fn find_org_membership(
		&self,
		_org_id: &OrgId,
		_user_id: &UserId,
	) -> Result<Option<OrgRole>, StoreError> {
		Err(outage())
	}

	async fn find_project_membership(
		&self,
		_project_id: &ProjectId,
		_user_id: &UserId,
	) -> Result<Option<ProjectRole>, StoreError> {
		Err(outage())
	}

	async fn find_group_membership(
		&self,
		_group_id: &GroupId,
		_user_id: &UserId,
	) -> Result<Option<GroupRole>, StoreError> {
		Err(outage())
	}

	async fn upsert_membership(&self, _edge: MembershipEdge) -> Result<(), StoreError> {
		Err(outage())
	}

	async fn delete_membership(&self, _key: MembershipKey) -> Result<bool, StoreError> {
		Err(outage())
	}

	async fn transfer_org_ownership(
		&self,
		_org_id: &OrgId,
		_new_owner: &UserId,
	) -> Result<(), StoreError> {
		Err(outage())
	}
}

#[async_trait]
impl ContainmentResolver for Unreachable {
	async fn project_organization(
		&self,
		_project_id: &ProjectId,
	) -> Result<Option<OrgId>, StoreError> {
		Err(outage())
	}

	async fn group_owner(&self, _group_id: &GroupId) -> Result<Option<GroupOwner>, StoreError> {
		Err(outage())
	}

	async fn organization_exists(&self, _org_id: &OrgId) -> Result<bool, StoreError> {
		Err(outage())
	}

	async fn project_exists(&self, _project_id: &ProjectId) -> Result<bool, StoreError> {
		Err(outage())
	}

	async fn group_exists(&self, _group_id: &GroupId) -> Result<bool, StoreError> {
		Err(outage())
	}

	async fn user_exists(&self, _user_id: &UserId) -> Result<bool, StoreError> {
		Err(outage())
	}
}

#[async_trait]
impl UserDirectory for Unreachable {
	async fn find_user_by_username(
		&self,
		_username: &str,
	) -> Result<Option<UserRecord>, StoreError> {
		Err(outage())
	}
}

fn authz() -> Authorizer {
	Authorizer::new(Arc::new(Unreachable))
}

#[tokio::test]
async fn lookup_failure_is_indeterminate() {
	let authz = authz();
	let principal = Principal::authenticated(UserId::generate());
	let checks = [
		Check::OrgAccess {
			org_id: OrgId::generate(),
		},
		Check::ProjectManage {
			project_id: ProjectId::generate(),
		},
		Check::GroupAccess {
			group_id: GroupId::generate(),
		},
		Check::ProjectCreate { org_id: None },
	];

	for check in checks {
		let result = authz.check(&check, &principal).await;
		assert!(
			matches!(result, Err(AuthzError::Indeterminate(_))),
			"{check}: expected indeterminate, got {result:?}"
		);
	}
}

#[tokio::test]
async fn system_admin_short_circuits_before_store() {
	let authz = authz();
	let principal = Principal::system_admin(UserId::generate());

	let allowed = authz
		.check(
			&Check::GroupManage {
				group_id: GroupId::generate(),
			},
			&principal,
		)
		.await
		.unwrap();
	assert!(allowed);
}

#[tokio::test]
async fn anonymous_checks_do_not_touch_membership_store() {
	let authz = authz();
	let allowed = authz
		.check(
			&Check::ProjectCreate { org_id: None },
			&Principal::anonymous(),
		)
		.await
		.unwrap();
	assert!(!allowed);
}

#[tokio::test]
async fn username_lookup_failure_is_indeterminate() {
	let result = authz().principal_for_username("alice").await;
	assert!(matches!(result, Err(AuthzError::Indeterminate(_))));
}

#[tokio::test]
async fn write_failure_is_indeterminate() {
	let result = authz()
		.members()
		.remove_org_member(
			OrgId::generate(),
			UserId::generate(),
			&Principal::system_admin(UserId::generate()),
		)
		.await;
	assert!(matches!(result, Err(AuthzError::Indeterminate(_))));
}
