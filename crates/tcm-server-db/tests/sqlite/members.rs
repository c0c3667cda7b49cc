// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use tcm_server_authz::{
	AuthzError, GroupId, GroupOwner, GroupRole, MembershipChange, OrgId, OrgRole, Principal,
	ProjectId, ProjectRole, UserId,
};
use tcm_server_db::{create_pool, run_migrations};

use super::support::Db;

#[tokio::test]
async fn concurrent_invites_leave_one_membership() {
	let dir = tempfile::tempdir().unwrap();
	let url = format!("sqlite:{}", dir.path().join("tcm.db").display());
	let pool = create_pool(&url).await.unwrap();
	run_migrations(&pool).await.unwrap();
	let db = Db::with_pool(pool);

	let org = db.org().await;
	let (admin, as_admin) = db.user("admin").await;
	let (u4, _) = db.user("u4").await;
	db.grant(org, admin, OrgRole::Admin).await;

	let members = db.authz.members();
	let (first, second) = tokio::join!(
		members.invite_org_member(org, u4, OrgRole::Member, &as_admin),
		members.invite_org_member(org, u4, OrgRole::Member, &as_admin),
	);
	assert_eq!(first.unwrap(), MembershipChange::Applied);
	assert_eq!(second.unwrap(), MembershipChange::Applied);

	let rows = db.repo.list_org_members(&org).await.unwrap();
	let u4_rows: Vec<_> = rows.iter().filter(|(user, _)| *user == u4).collect();
	assert_eq!(u4_rows, vec![&(u4, OrgRole::Member)]);
}

#[tokio::test]
async fn org_admin_cannot_grant_owner() {
	let db = Db::new().await;
	let org = db.org().await;
	let (admin, as_admin) = db.user("admin").await;
	let (target, _) = db.user("target").await;
	db.grant(org, admin, OrgRole::Admin).await;

	let change = db
		.authz
		.members()
		.invite_org_member(org, target, OrgRole::Owner, &as_admin)
		.await
		.unwrap();
	assert_eq!(change, MembershipChange::Denied);
	assert!(db.repo.get_org_role(&org, &target).await.unwrap().is_none());
}

#[tokio::test]
async fn project_manager_promotes_developer() {
	let db = Db::new().await;
	let project = db.project(None).await;
	let (manager, as_manager) = db.user("manager").await;
	let (dev, _) = db.user("dev").await;
	db.grant(project, manager, ProjectRole::ProjectManager).await;
	db.grant(project, dev, ProjectRole::Developer).await;

	let change = db
		.authz
		.members()
		.change_project_member_role(project, dev, ProjectRole::LeadDeveloper, &as_manager)
		.await
		.unwrap();
	assert!(change.is_applied());
	assert_eq!(
		db.repo.get_project_role(&project, &dev).await.unwrap(),
		Some(ProjectRole::LeadDeveloper)
	);
}

#[tokio::test]
async fn leader_removes_member_but_not_another_leader() {
	let db = Db::new().await;
	let group = db.group(GroupOwner::Independent).await;
	let (leader, as_leader) = db.user("leader").await;
	let (other_leader, _) = db.user("other-leader").await;
	let (member, _) = db.user("member").await;
	db.grant(group, leader, GroupRole::Leader).await;
	db.grant(group, other_leader, GroupRole::Leader).await;
	db.grant(group, member, GroupRole::Member).await;

	let members = db.authz.members();
	let removed = members
		.remove_group_member(group, member, &as_leader)
		.await
		.unwrap();
	assert!(removed.is_applied());

	let denied = members
		.remove_group_member(group, other_leader, &as_leader)
		.await
		.unwrap();
	assert_eq!(denied, MembershipChange::Denied);

	assert_eq!(
		db.repo.list_group_members(&group).await.unwrap().len(),
		2,
		"both leaders remain"
	);
}

#[tokio::test]
async fn corrupt_role_surfaces_as_indeterminate() {
	let db = Db::new().await;
	let org = db.org().await;
	let (user, principal) = db.user("user").await;
	let now = chrono::Utc::now().to_rfc3339();
	sqlx::query(
		"INSERT INTO org_memberships (org_id, user_id, role, created_at, updated_at) VALUES (?, ?, 'SUPREME', ?, ?)",
	)
	.bind(org.to_string())
	.bind(user.to_string())
	.bind(&now)
	.bind(&now)
	.execute(db.repo.pool())
	.await
	.unwrap();

	let result = db
		.authz
		.check(&tcm_server_authz::Check::OrgAccess { org_id: org }, &principal)
		.await;
	assert!(matches!(result, Err(AuthzError::Indeterminate(_))));
}

#[tokio::test]
async fn reinvite_promotes_member_when_admin_may_manage() {
	let db = Db::new().await;
	let org = db.org().await;
	let (admin, as_admin) = db.user("admin").await;
	let (member, _) = db.user("member").await;
	db.grant(org, admin, OrgRole::Admin).await;
	db.grant(org, member, OrgRole::Member).await;

	let change = db
		.authz
		.members()
		.invite_org_member(org, member, OrgRole::Admin, &as_admin)
		.await
		.unwrap();
	assert!(change.is_applied());

	let rows = db.repo.list_org_members(&org).await.unwrap();
	let member_rows: Vec<_> = rows.iter().filter(|(user, _)| *user == member).collect();
	assert_eq!(member_rows, vec![&(member, OrgRole::Admin)]);
}

#[tokio::test]
async fn reinvite_cannot_demote_top_rank_at_any_level() {
	let db = Db::new().await;
	let members = db.authz.members();

	let org = db.org().await;
	let (owner, _) = db.user("owner").await;
	let (admin, as_admin) = db.user("admin").await;
	db.grant(org, owner, OrgRole::Owner).await;
	db.grant(org, admin, OrgRole::Admin).await;
	let change = members
		.invite_org_member(org, owner, OrgRole::Member, &as_admin)
		.await
		.unwrap();
	assert_eq!(change, MembershipChange::Denied);
	assert_eq!(
		db.repo.get_org_role(&org, &owner).await.unwrap(),
		Some(OrgRole::Owner)
	);

	let project = db.project(None).await;
	let (pm, _) = db.user("pm").await;
	let (lead, as_lead) = db.user("lead").await;
	db.grant(project, pm, ProjectRole::ProjectManager).await;
	db.grant(project, lead, ProjectRole::LeadDeveloper).await;
	let change = members
		.invite_project_member(project, pm, ProjectRole::Viewer, &as_lead)
		.await
		.unwrap();
	assert_eq!(change, MembershipChange::Denied);
	assert_eq!(
		db.repo.get_project_role(&project, &pm).await.unwrap(),
		Some(ProjectRole::ProjectManager)
	);

	let group = db.group(GroupOwner::Independent).await;
	let (leader, _) = db.user("leader").await;
	let (co_leader, as_co_leader) = db.user("co-leader").await;
	db.grant(group, leader, GroupRole::Leader).await;
	db.grant(group, co_leader, GroupRole::CoLeader).await;
	let change = members
		.invite_group_member(group, leader, GroupRole::Member, &as_co_leader)
		.await
		.unwrap();
	assert_eq!(change, MembershipChange::Denied);
	assert_eq!(
		db.repo.get_group_role(&group, &leader).await.unwrap(),
		Some(GroupRole::Leader)
	);
}

#[tokio::test]
async fn invite_into_missing_container_is_denied() {
	let db = Db::new().await;
	let (invitee, _) = db.user("invitee").await;
	let root = Principal::system_admin(UserId::generate());
	let members = db.authz.members();

	let org = members
		.invite_org_member(OrgId::generate(), invitee, OrgRole::Member, &root)
		.await
		.unwrap();
	let project = members
		.invite_project_member(ProjectId::generate(), invitee, ProjectRole::Tester, &root)
		.await
		.unwrap();
	let group = members
		.invite_group_member(GroupId::generate(), invitee, GroupRole::Member, &root)
		.await
		.unwrap();

	assert_eq!(org, MembershipChange::Denied);
	assert_eq!(project, MembershipChange::Denied);
	assert_eq!(group, MembershipChange::Denied);
}

#[tokio::test]
async fn owner_transfers_ownership() {
	let db = Db::new().await;
	let org = db.org().await;
	let (owner, as_owner) = db.user("owner").await;
	let (admin, as_admin) = db.user("admin").await;
	let (member, _) = db.user("member").await;
	db.grant(org, owner, OrgRole::Owner).await;
	db.grant(org, admin, OrgRole::Admin).await;
	db.grant(org, member, OrgRole::Member).await;
	let members = db.authz.members();

	let denied = members
		.transfer_org_ownership(org, admin, &as_admin)
		.await
		.unwrap();
	assert_eq!(denied, MembershipChange::Denied);

	let applied = members
		.transfer_org_ownership(org, member, &as_owner)
		.await
		.unwrap();
	assert!(applied.is_applied());
	assert_eq!(
		db.repo.list_org_members(&org).await.unwrap().into_iter().filter(|(_, role)| *role == OrgRole::Owner).collect::<Vec<_>>(),
		vec![(member, OrgRole::Owner)]
	);
	assert_eq!(
		db.repo.get_org_role(&org, &owner).await.unwrap(),
		Some(OrgRole::Admin)
	);
}
