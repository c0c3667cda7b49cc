// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process implementation of every store contract.
//!
//! Used by tests and by embedders that keep memberships in memory. Clones
//! share the same state.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::roles::{GroupRole, OrgRole, ProjectRole};
use crate::store::{
	ContainmentResolver, MembershipEdge, MembershipKey, MembershipStore, StoreError, UserDirectory,
	UserRecord,
};
use crate::types::{GlobalRole, GroupId, GroupOwner, OrgId, Project, ProjectId, UserId};

#[derive(Debug, Default)]
struct State {
	users: HashMap<UserId, UserRecord>,
	organizations: HashSet<OrgId>,
	projects: HashMap<ProjectId, Option<OrgId>>,
	groups: HashMap<GroupId, GroupOwner>,
	org_members: HashMap<(OrgId, UserId), OrgRole>,
	project_members: HashMap<(ProjectId, UserId), ProjectRole>,
	group_members: HashMap<(GroupId, UserId), GroupRole>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
	state: Arc<RwLock<State>>,
}

impl InMemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn insert_user(&self, user: UserRecord) {
		self.state.write().await.users.insert(user.id, user);
	}

	/// Register a user whose display name is the username.
	pub async fn create_user(&self, username: &str, global_role: GlobalRole) -> UserId {
		let id = UserId::generate();
		self.insert_user(UserRecord {
			id,
			username: username.to_string(),
			display_name: username.to_string(),
			global_role,
		})
		.await;
		id
	}

	pub async fn create_organization(&self) -> OrgId {
		let id = OrgId::generate();
		self.state.write().await.organizations.insert(id);
		id
	}

	pub async fn insert_project(&self, project: Project) {
		self.state
			.write()
			.await
			.projects
			.insert(project.id, project.organization_id);
	}

	pub async fn create_project(&self, organization_id: Option<OrgId>) -> ProjectId {
		let id = ProjectId::generate();
		self.insert_project(Project {
			id,
			organization_id,
		})
		.await;
		id
	}

	pub async fn create_group(&self, owner: GroupOwner) -> GroupId {
		let id = GroupId::generate();
		self.state.write().await.groups.insert(id, owner);
		id
	}

	pub async fn insert_org_member(&self, org_id: OrgId, user_id: UserId, role: OrgRole) {
		self.apply(MembershipEdge::Organization {
			org_id,
			user_id,
			role,
		})
		.await;
	}

	pub async fn insert_project_member(&self, project_id: ProjectId, user_id: UserId, role: ProjectRole) {
		self.apply(MembershipEdge::Project {
			project_id,
			user_id,
			role,
		})
		.await;
	}

	pub async fn insert_group_member(&self, group_id: GroupId, user_id: UserId, role: GroupRole) {
		self.apply(MembershipEdge::Group {
			group_id,
			user_id,
			role,
		})
		.await;
	}

	/// All members of an organization with their roles.
	pub async fn org_members(&self, org_id: OrgId) -> Vec<(UserId, OrgRole)> {
		self.state
			.read()
			.await
			.org_members
			.iter()
			.filter(|((org, _), _)| *org == org_id)
			.map(|((_, user), role)| (*user, *role))
			.collect()
	}

	pub async fn group_members(&self, group_id: GroupId) -> Vec<(UserId, GroupRole)> {
		self.state
			.read()
			.await
			.group_members
			.iter()
			.filter(|((group, _), _)| *group == group_id)
			.map(|((_, user), role)| (*user, *role))
			.collect()
	}

	async fn apply(&self, edge: MembershipEdge) {
		let mut state = self.state.write().await;
		match edge {
			MembershipEdge::Organization {
				org_id,
				user_id,
				role,
			} => {
				state.org_members.insert((org_id, user_id), role);
			}
			MembershipEdge::Project {
				project_id,
				user_id,
				role,
			} => {
				state.project_members.insert((project_id, user_id), role);
			}
			MembershipEdge::Group {
				group_id,
				user_id,
				role,
			} => {
				state.group_members.insert((group_id, user_id), role);
			}
		}
	}
}

#[async_trait]
impl MembershipStore for InMemoryStore {
	async fn find_org_membership(
		&self,
		org_id: &OrgId,
		user_id: &UserId,
	) -> Result<Option<OrgRole>, StoreError> {
		Ok(self
			.state
			.read()
			.await
			.org_members
			.get(&(*org_id, *user_id))
			.copied())
	}

	async fn find_project_membership(
		&self,
		project_id: &ProjectId,
		user_id: &UserId,
	) -> Result<Option<ProjectRole>, StoreError> {
		Ok(self
			.state
			.read()
			.await
			.project_members
			.get(&(*project_id, *user_id))
			.copied())
	}

	async fn find_group_membership(
		&self,
		group_id: &GroupId,
		user_id: &UserId,
	) -> Result<Option<GroupRole>, StoreError> {
		Ok(self
			.state
			.read()
			.await
			.group_members
			.get(&(*group_id, *user_id))
			.copied())
	}

	async fn upsert_membership(&self, edge: MembershipEdge) -> Result<(), StoreError> {
		self.apply(edge).await;
		Ok(())
	}

	async fn delete_membership(&self, key: MembershipKey) -> Result<bool, StoreError> {
		let mut state = self.state.write().await;
		let existed = match key {
			MembershipKey::Organization { org_id, user_id } => {
				state.org_members.remove(&(org_id, user_id)).is_some()
			}
			MembershipKey::Project {
				project_id,
				user_id,
			} => state.project_members.remove(&(project_id, user_id)).is_some(),
			MembershipKey::Group { group_id, user_id } => {
				state.group_members.remove(&(group_id, user_id)).is_some()
			}
		};
		Ok(existed)
	}

	async fn transfer_org_ownership(
		&self,
		org_id: &OrgId,
		new_owner: &UserId,
	) -> Result<(), StoreError> {
		let mut state = self.state.write().await;
		if !state.org_members.contains_key(&(*org_id, *new_owner)) {
			return Err(StoreError::new(format!(
				"user {new_owner} is not a member of organization {org_id}"
			)));
		}
		for ((org, user), role) in state.org_members.iter_mut() {
			if org != org_id {
				continue;
			}
			if user == new_owner {
				*role = OrgRole::Owner;
			} else if *role == OrgRole::Owner {
				*role = OrgRole::Admin;
			}
		}
		Ok(())
	}
}

#[async_trait]
impl ContainmentResolver for InMemoryStore {
	async fn project_organization(
		&self,
		project_id: &ProjectId,
	) -> Result<Option<OrgId>, StoreError> {
		Ok(self
			.state
			.read()
			.await
			.projects
			.get(project_id)
			.copied()
			.flatten())
	}

	async fn group_owner(&self, group_id: &GroupId) -> Result<Option<GroupOwner>, StoreError> {
		Ok(self.state.read().await.groups.get(group_id).copied())
	}

	async fn organization_exists(&self, org_id: &OrgId) -> Result<bool, StoreError> {
		Ok(self.state.read().await.organizations.contains(org_id))
	}

	async fn project_exists(&self, project_id: &ProjectId) -> Result<bool, StoreError> {
		Ok(self.state.read().await.projects.contains_key(project_id))
	}

	async fn group_exists(&self, group_id: &GroupId) -> Result<bool, StoreError> {
		Ok(self.state.read().await.groups.contains_key(group_id))
	}

	async fn user_exists(&self, user_id: &UserId) -> Result<bool, StoreError> {
		Ok(self.state.read().await.users.contains_key(user_id))
	}
}

#[async_trait]
impl UserDirectory for InMemoryStore {
	async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
		Ok(self
			.state
			.read()
			.await
			.users
			.values()
			.find(|user| user.username == username)
			.cloned())
	}
}
