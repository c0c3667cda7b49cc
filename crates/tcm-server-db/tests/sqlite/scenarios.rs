// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use tcm_server_authz::{Check, GroupOwner, GroupRole, OrgRole, Principal, ProjectRole, UserId};

use super::support::{run_authz_cases, AuthzCase, Db};

#[tokio::test]
async fn org_admin_manages_contained_project() {
	let db = Db::new().await;
	let org = db.org().await;
	let (u1, _) = db.user("u1").await;
	let (u2, as_u2) = db.user("u2").await;
	let (_, as_u3) = db.user("u3").await;
	db.grant(org, u1, OrgRole::Owner).await;
	db.grant(org, u2, OrgRole::Admin).await;
	let project = db.project(Some(org)).await;

	let cases = vec![
		AuthzCase {
			name: "org_admin_manages_project",
			principal: as_u2,
			check: Check::ProjectManage {
				project_id: project,
			},
			expected: true,
		},
		AuthzCase {
			name: "unrelated_user_cannot_manage_project",
			principal: as_u3,
			check: Check::ProjectManage {
				project_id: project,
			},
			expected: false,
		},
	];
	run_authz_cases(&db.authz, &cases).await;
}

#[tokio::test]
async fn org_owner_reaches_group_through_project() {
	let db = Db::new().await;
	let org = db.org().await;
	let (u1, as_u1) = db.user("u1").await;
	db.grant(org, u1, OrgRole::Owner).await;
	let project = db.project(Some(org)).await;
	let group = db.group(GroupOwner::Project(project)).await;

	let cases = vec![
		AuthzCase {
			name: "two_hop_access",
			principal: as_u1.clone(),
			check: Check::GroupAccess { group_id: group },
			expected: true,
		},
		AuthzCase {
			name: "two_hop_manage",
			principal: as_u1,
			check: Check::GroupManage { group_id: group },
			expected: true,
		},
	];
	run_authz_cases(&db.authz, &cases).await;
}

#[tokio::test]
async fn admin_cannot_remove_owner() {
	let db = Db::new().await;
	let org = db.org().await;
	let (u1, as_u1) = db.user("u1").await;
	let (u2, as_u2) = db.user("u2").await;
	db.grant(org, u1, OrgRole::Owner).await;
	db.grant(org, u2, OrgRole::Admin).await;

	let cases = vec![
		AuthzCase {
			name: "admin_removes_owner",
			principal: as_u2,
			check: Check::OrgRemoveMember {
				org_id: org,
				target: u1,
			},
			expected: false,
		},
		AuthzCase {
			name: "owner_removes_admin",
			principal: as_u1,
			check: Check::OrgRemoveMember {
				org_id: org,
				target: u2,
			},
			expected: true,
		},
	];
	run_authz_cases(&db.authz, &cases).await;
}

#[tokio::test]
async fn independent_project_creation() {
	let db = Db::new().await;
	let (_, as_user) = db.user("plain").await;

	let cases = vec![
		AuthzCase {
			name: "anonymous_denied",
			principal: Principal::anonymous(),
			check: Check::ProjectCreate { org_id: None },
			expected: false,
		},
		AuthzCase {
			name: "registered_user_allowed",
			principal: as_user,
			check: Check::ProjectCreate { org_id: None },
			expected: true,
		},
		AuthzCase {
			name: "unregistered_user_denied",
			principal: Principal::authenticated(UserId::generate()),
			check: Check::ProjectCreate { org_id: None },
			expected: false,
		},
	];
	run_authz_cases(&db.authz, &cases).await;
}

#[tokio::test]
async fn independent_group_is_closed_to_outsiders() {
	let db = Db::new().await;
	let org = db.org().await;
	let project = db.project(None).await;
	let group = db.group(GroupOwner::Independent).await;
	let (leader, as_leader) = db.user("leader").await;
	let (member, as_member) = db.user("member").await;
	let (org_owner, as_org_owner) = db.user("org-owner").await;
	let (manager, as_manager) = db.user("manager").await;
	db.grant(group, leader, GroupRole::Leader).await;
	db.grant(group, member, GroupRole::Member).await;
	db.grant(org, org_owner, OrgRole::Owner).await;
	db.grant(project, manager, ProjectRole::ProjectManager).await;

	let cases = vec![
		AuthzCase {
			name: "leader_accesses",
			principal: as_leader,
			check: Check::GroupAccess { group_id: group },
			expected: true,
		},
		AuthzCase {
			name: "member_accesses",
			principal: as_member.clone(),
			check: Check::GroupAccess { group_id: group },
			expected: true,
		},
		AuthzCase {
			name: "member_cannot_manage",
			principal: as_member,
			check: Check::GroupManage { group_id: group },
			expected: false,
		},
		AuthzCase {
			name: "org_owner_elsewhere_denied",
			principal: as_org_owner,
			check: Check::GroupAccess { group_id: group },
			expected: false,
		},
		AuthzCase {
			name: "project_manager_elsewhere_denied",
			principal: as_manager,
			check: Check::GroupAccess { group_id: group },
			expected: false,
		},
	];
	run_authz_cases(&db.authz, &cases).await;
}

#[tokio::test]
async fn stored_admin_role_marks_system_admin() {
	let db = Db::new().await;
	db.user_with_role("root", tcm_server_authz::GlobalRole::Admin)
		.await;
	let group = db.group(GroupOwner::Independent).await;

	let principal = db.authz.principal_for_username("root").await.unwrap();
	assert!(principal.is_system_admin());
	assert!(db
		.authz
		.check(&Check::GroupManage { group_id: group }, &principal)
		.await
		.unwrap());

	let nobody = db.authz.principal_for_username("nobody").await.unwrap();
	assert_eq!(nobody, Principal::anonymous());
}
