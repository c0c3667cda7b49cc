// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Property tests over arbitrary role assignments and containment layouts.

use proptest::prelude::*;
use proptest::sample::select;
use tcm_server_authz::{
	Check, GroupId, GroupOwner, GroupRole, OrgId, OrgRole, Principal, ProjectId, ProjectRole,
	UserId,
};

use super::support::World;

/// How the group under test is contained.
#[derive(Debug, Clone, Copy)]
enum Layout {
	OrgGroup,
	ProjectGroup,
	IndependentGroup,
}

fn layouts() -> impl Strategy<Value = Layout> {
	prop_oneof![
		Just(Layout::OrgGroup),
		Just(Layout::ProjectGroup),
		Just(Layout::IndependentGroup),
	]
}

#[derive(Debug, Clone, Copy)]
struct Roles {
	org: Option<OrgRole>,
	project: Option<ProjectRole>,
	group: Option<GroupRole>,
}

fn role_sets() -> impl Strategy<Value = Roles> {
	(
		proptest::option::of(select(OrgRole::all())),
		proptest::option::of(select(ProjectRole::all())),
		proptest::option::of(select(GroupRole::all())),
	)
		.prop_map(|(org, project, group)| Roles {
			org,
			project,
			group,
		})
}

struct Fixture {
	world: World,
	org: OrgId,
	project: ProjectId,
	group: GroupId,
}

async fn fixture(layout: Layout, contained_project: bool) -> Fixture {
	let world = World::new();
	let org = world.org().await;
	let project = if contained_project {
		world.project_in(org).await
	} else {
		world.independent_project().await
	};
	let owner = match layout {
		Layout::OrgGroup => GroupOwner::Organization(org),
		Layout::ProjectGroup => GroupOwner::Project(project),
		Layout::IndependentGroup => GroupOwner::Independent,
	};
	let group = world.group(owner).await;
	Fixture {
		world,
		org,
		project,
		group,
	}
}

async fn assign(f: &Fixture, user: UserId, roles: Roles) {
	if let Some(role) = roles.org {
		f.world.store.insert_org_member(f.org, user, role).await;
	}
	if let Some(role) = roles.project {
		f.world
			.store
			.insert_project_member(f.project, user, role)
			.await;
	}
	if let Some(role) = roles.group {
		f.world.store.insert_group_member(f.group, user, role).await;
	}
}

fn every_check(f: &Fixture, target: UserId) -> Vec<Check> {
	vec![
		Check::OrgAccess { org_id: f.org },
		Check::OrgManage { org_id: f.org },
		Check::OrgInvite { org_id: f.org },
		Check::OrgRemoveMember {
			org_id: f.org,
			target,
		},
		Check::OrgDelete { org_id: f.org },
		Check::ProjectAccess {
			project_id: f.project,
		},
		Check::ProjectManage {
			project_id: f.project,
		},
		Check::ProjectInvite {
			project_id: f.project,
		},
		Check::ProjectRemoveMember {
			project_id: f.project,
			target,
		},
		Check::ProjectCreate { org_id: None },
		Check::ProjectCreate {
			org_id: Some(f.org),
		},
		Check::ProjectUploadResults {
			project_id: f.project,
		},
		Check::GroupAccess { group_id: f.group },
		Check::GroupManage { group_id: f.group },
		Check::GroupInvite { group_id: f.group },
		Check::GroupRemoveMember {
			group_id: f.group,
			target,
		},
		Check::GroupCreate {
			parent: GroupOwner::Organization(f.org),
		},
		Check::GroupCreate {
			parent: GroupOwner::Project(f.project),
		},
		Check::GroupCreate {
			parent: GroupOwner::Independent,
		},
	]
}

proptest! {
	#[test]
	fn system_admin_passes_every_check(
		layout in layouts(),
		contained in any::<bool>(),
		admin_roles in role_sets(),
		target_roles in role_sets(),
	) {
		tokio_test::block_on(async {
			let f = fixture(layout, contained).await;
			let admin = UserId::generate();
			let target = UserId::generate();
			assign(&f, admin, admin_roles).await;
			assign(&f, target, target_roles).await;
			let principal = Principal::system_admin(admin);

			for check in every_check(&f, target) {
				let allowed = f.world.authz.check(&check, &principal).await.unwrap();
				assert!(allowed, "{check} denied for system admin");
			}
		});
	}

	#[test]
	fn self_removal_is_always_allowed(
		layout in layouts(),
		contained in any::<bool>(),
		held in role_sets(),
	) {
		tokio_test::block_on(async {
			let f = fixture(layout, contained).await;
			let (user, principal) = f.world.user("self").await;
			assign(&f, user, held).await;

			let checks = [
				Check::OrgRemoveMember { org_id: f.org, target: user },
				Check::ProjectRemoveMember { project_id: f.project, target: user },
				Check::GroupRemoveMember { group_id: f.group, target: user },
			];
			for check in checks {
				assert!(f.world.authz.check(&check, &principal).await.unwrap(), "{check}");
			}
		});
	}

	#[test]
	fn non_members_are_denied_everywhere(
		layout in layouts(),
		contained in any::<bool>(),
		other_roles in role_sets(),
	) {
		tokio_test::block_on(async {
			let f = fixture(layout, contained).await;
			let (other, _) = f.world.user("other").await;
			let (_, outsider) = f.world.user("outsider").await;
			assign(&f, other, other_roles).await;

			let checks = [
				Check::OrgAccess { org_id: f.org },
				Check::OrgManage { org_id: f.org },
				Check::ProjectAccess { project_id: f.project },
				Check::ProjectManage { project_id: f.project },
				Check::GroupAccess { group_id: f.group },
				Check::GroupManage { group_id: f.group },
			];
			for check in checks {
				assert!(!f.world.authz.check(&check, &outsider).await.unwrap(), "{check}");
				assert!(!f.world.authz.check(&check, &Principal::anonymous()).await.unwrap(), "{check}");
			}
		});
	}

	#[test]
	fn org_admin_manages_everything_contained(
		org_role in select(vec![OrgRole::Owner, OrgRole::Admin]),
		project_role in proptest::option::of(select(ProjectRole::all())),
		via_project in any::<bool>(),
	) {
		tokio_test::block_on(async {
			let layout = if via_project { Layout::ProjectGroup } else { Layout::OrgGroup };
			let f = fixture(layout, true).await;
			let (user, principal) = f.world.user("admin").await;
			assign(&f, user, Roles { org: Some(org_role), project: project_role, group: None }).await;

			let checks = [
				Check::ProjectManage { project_id: f.project },
				Check::GroupManage { group_id: f.group },
				Check::GroupAccess { group_id: f.group },
			];
			for check in checks {
				assert!(f.world.authz.check(&check, &principal).await.unwrap(), "{check}");
			}
		});
	}
}
