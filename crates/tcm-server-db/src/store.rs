// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization repository for database operations.
//!
//! This module backs the engine's collaborator contracts with SQLite:
//! - Membership lookups and upserts for organizations, projects and groups
//! - Organization ownership transfer
//! - Containment (which containers exist, which organization holds a
//!   project, who owns a group)
//! - User lookups for principal resolution

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
	sqlite::{SqlitePool, SqliteRow},
	Row,
};
use std::str::FromStr;
use tcm_server_authz::{
	ContainmentResolver, GlobalRole, GroupId, GroupOwner, GroupRole, Level, MembershipEdge,
	MembershipKey, MembershipStore, ModelError, OrgId, OrgRole, Project, ProjectId, ProjectRole,
	StoreError, UserDirectory, UserId, UserRecord,
};

use crate::error::DbError;

/// Table and container column holding the memberships of one level.
fn membership_table(level: Level) -> (&'static str, &'static str) {
	match level {
		Level::Organization => ("org_memberships", "org_id"),
		Level::Project => ("project_memberships", "project_id"),
		Level::Group => ("group_memberships", "group_id"),
	}
}

fn parse_text<T>(row: &SqliteRow, column: &str) -> Result<T, DbError>
where
	T: FromStr<Err = ModelError>,
{
	let raw: String = row.try_get(column)?;
	raw
		.parse()
		.map_err(|e| DbError::InvalidData(format!("{column}: {e}")))
}

fn parse_optional<T>(row: &SqliteRow, column: &str) -> Result<Option<T>, DbError>
where
	T: FromStr<Err = ModelError>,
{
	let raw: Option<String> = row.try_get(column)?;
	raw
		.map(|value| {
			value
				.parse()
				.map_err(|e| DbError::InvalidData(format!("{column}: {e}")))
		})
		.transpose()
}

/// Repository for users, containers and memberships.
#[derive(Clone)]
pub struct AuthzRepository {
	pool: SqlitePool,
}

impl AuthzRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	/// Create a user account.
	///
	/// # Database Constraints
	/// - `username` must be unique
	#[tracing::instrument(skip(self, user), fields(user_id = %user.id, username = %user.username))]
	pub async fn create_user(&self, user: &UserRecord) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO users (id, username, display_name, global_role, created_at)
			VALUES (?, ?, ?, ?, ?)
			"#,
		)
		.bind(user.id.to_string())
		.bind(&user.username)
		.bind(&user.display_name)
		.bind(user.global_role.as_str())
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;

		tracing::debug!(user_id = %user.id, "user created");
		Ok(())
	}

	/// Get a user by login name.
	///
	/// # Returns
	/// `None` if no user has this username.
	#[tracing::instrument(skip(self))]
	pub async fn get_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, username, display_name, global_role
			FROM users
			WHERE username = ?
			"#,
		)
		.bind(username)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| self.row_to_user(&r)).transpose()
	}

	#[tracing::instrument(skip(self), fields(user_id = %user_id))]
	pub async fn user_exists(&self, user_id: &UserId) -> Result<bool, DbError> {
		let row = sqlx::query("SELECT 1 FROM users WHERE id = ?")
			.bind(user_id.to_string())
			.fetch_optional(&self.pool)
			.await?;
		Ok(row.is_some())
	}

	#[tracing::instrument(skip(self), fields(org_id = %org_id))]
	pub async fn organization_exists(&self, org_id: &OrgId) -> Result<bool, DbError> {
		self.row_exists("organizations", org_id.to_string()).await
	}

	#[tracing::instrument(skip(self), fields(project_id = %project_id))]
	pub async fn project_exists(&self, project_id: &ProjectId) -> Result<bool, DbError> {
		self.row_exists("projects", project_id.to_string()).await
	}

	#[tracing::instrument(skip(self), fields(group_id = %group_id))]
	pub async fn group_exists(&self, group_id: &GroupId) -> Result<bool, DbError> {
		self.row_exists("groups", group_id.to_string()).await
	}

	#[tracing::instrument(skip(self), fields(org_id = %id))]
	pub async fn create_organization(&self, id: &OrgId, name: &str) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO organizations (id, name, created_at)
			VALUES (?, ?, ?)
			"#,
		)
		.bind(id.to_string())
		.bind(name)
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;

		tracing::debug!(org_id = %id, "organization created");
		Ok(())
	}

	/// Create a project, optionally inside an organization.
	///
	/// # Database Constraints
	/// - `organization_id`, when set, must reference an existing organization
	#[tracing::instrument(skip(self, project), fields(project_id = %project.id, org_id = ?project.organization_id))]
	pub async fn create_project(&self, project: &Project, name: &str) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO projects (id, name, organization_id, created_at)
			VALUES (?, ?, ?, ?)
			"#,
		)
		.bind(project.id.to_string())
		.bind(name)
		.bind(project.organization_id.map(|id| id.to_string()))
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;

		tracing::debug!(project_id = %project.id, "project created");
		Ok(())
	}

	/// Create a group owned by an organization, a project, or nobody.
	#[tracing::instrument(skip(self), fields(group_id = %id))]
	pub async fn create_group(
		&self,
		id: &GroupId,
		owner: &GroupOwner,
		name: &str,
	) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO groups (id, name, organization_id, project_id, created_at)
			VALUES (?, ?, ?, ?, ?)
			"#,
		)
		.bind(id.to_string())
		.bind(name)
		.bind(owner.organization_id().map(|id| id.to_string()))
		.bind(owner.project_id().map(|id| id.to_string()))
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;

		tracing::debug!(group_id = %id, "group created");
		Ok(())
	}

	/// The organization containing a project.
	///
	/// # Returns
	/// `None` for an independent project and for an unknown one.
	#[tracing::instrument(skip(self), fields(project_id = %project_id))]
	pub async fn get_project_organization(
		&self,
		project_id: &ProjectId,
	) -> Result<Option<OrgId>, DbError> {
		let row = sqlx::query("SELECT organization_id FROM projects WHERE id = ?")
			.bind(project_id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		match row {
			Some(r) => parse_optional(&r, "organization_id"),
			None => Ok(None),
		}
	}

	/// The owner of a group, or `None` if the group does not exist.
	///
	/// # Errors
	/// Returns `DbError::InvalidData` if the row names both an organization
	/// and a project.
	#[tracing::instrument(skip(self), fields(group_id = %group_id))]
	pub async fn get_group_owner(&self, group_id: &GroupId) -> Result<Option<GroupOwner>, DbError> {
		let row = sqlx::query("SELECT organization_id, project_id FROM groups WHERE id = ?")
			.bind(group_id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		let Some(r) = row else {
			return Ok(None);
		};
		let owner = GroupOwner::from_columns(
			parse_optional(&r, "organization_id")?,
			parse_optional(&r, "project_id")?,
		)
		.map_err(|e| DbError::InvalidData(format!("groups.{group_id}: {e}")))?;
		Ok(Some(owner))
	}

	#[tracing::instrument(skip(self), fields(org_id = %org_id, user_id = %user_id))]
	pub async fn get_org_role(
		&self,
		org_id: &OrgId,
		user_id: &UserId,
	) -> Result<Option<OrgRole>, DbError> {
		self
			.get_role(Level::Organization, org_id.to_string(), user_id)
			.await
	}

	#[tracing::instrument(skip(self), fields(project_id = %project_id, user_id = %user_id))]
	pub async fn get_project_role(
		&self,
		project_id: &ProjectId,
		user_id: &UserId,
	) -> Result<Option<ProjectRole>, DbError> {
		self
			.get_role(Level::Project, project_id.to_string(), user_id)
			.await
	}

	#[tracing::instrument(skip(self), fields(group_id = %group_id, user_id = %user_id))]
	pub async fn get_group_role(
		&self,
		group_id: &GroupId,
		user_id: &UserId,
	) -> Result<Option<GroupRole>, DbError> {
		self
			.get_role(Level::Group, group_id.to_string(), user_id)
			.await
	}

	/// Insert a membership, or replace the role of the existing one.
	///
	/// Concurrent upserts of the same edge converge on a single row.
	#[tracing::instrument(
		skip(self, edge),
		fields(scope = %edge.level(), user_id = %edge.user_id(), role = edge.role_str())
	)]
	pub async fn upsert_membership(&self, edge: &MembershipEdge) -> Result<(), DbError> {
		let key = edge.key();
		let (table, column) = membership_table(key.level());
		let now = Utc::now().to_rfc3339();
		let sql = format!(
			r#"
			INSERT INTO {table} ({column}, user_id, role, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?)
			ON CONFLICT ({column}, user_id) DO UPDATE SET
				role = excluded.role,
				updated_at = excluded.updated_at
			"#
		);

		sqlx::query(&sql)
			.bind(key.container())
			.bind(key.user_id().to_string())
			.bind(edge.role_str())
			.bind(&now)
			.bind(&now)
			.execute(&self.pool)
			.await?;

		tracing::debug!(container = %key.container(), "membership upserted");
		Ok(())
	}

	/// Delete a membership.
	///
	/// # Returns
	/// `true` if a row was deleted.
	#[tracing::instrument(skip(self, key), fields(scope = %key.level(), user_id = %key.user_id()))]
	pub async fn delete_membership(&self, key: &MembershipKey) -> Result<bool, DbError> {
		let (table, column) = membership_table(key.level());
		let sql = format!("DELETE FROM {table} WHERE {column} = ? AND user_id = ?");

		let result = sqlx::query(&sql)
			.bind(key.container())
			.bind(key.user_id().to_string())
			.execute(&self.pool)
			.await?;

		let deleted = result.rows_affected() > 0;
		tracing::debug!(container = %key.container(), deleted, "membership deleted");
		Ok(deleted)
	}

	/// Make `new_owner` the owner of an organization and demote every other
	/// owner to admin in one transaction.
	///
	/// # Errors
	/// Returns `DbError::InvalidData` if `new_owner` is not a member. Nothing
	/// is written in that case.
	#[tracing::instrument(skip(self), fields(org_id = %org_id, new_owner = %new_owner))]
	pub async fn transfer_org_ownership(
		&self,
		org_id: &OrgId,
		new_owner: &UserId,
	) -> Result<(), DbError> {
		let now = Utc::now().to_rfc3339();
		let mut tx = self.pool.begin().await?;

		let promoted = sqlx::query(
			r#"
			UPDATE org_memberships SET role = ?, updated_at = ?
			WHERE org_id = ? AND user_id = ?
			"#,
		)
		.bind(OrgRole::Owner.as_str())
		.bind(&now)
		.bind(org_id.to_string())
		.bind(new_owner.to_string())
		.execute(&mut *tx)
		.await?;
		if promoted.rows_affected() == 0 {
			return Err(DbError::InvalidData(format!(
				"user {new_owner} is not a member of organization {org_id}"
			)));
		}

		let demoted = sqlx::query(
			r#"
			UPDATE org_memberships SET role = ?, updated_at = ?
			WHERE org_id = ? AND role = ? AND user_id <> ?
			"#,
		)
		.bind(OrgRole::Admin.as_str())
		.bind(&now)
		.bind(org_id.to_string())
		.bind(OrgRole::Owner.as_str())
		.bind(new_owner.to_string())
		.execute(&mut *tx)
		.await?;

		tx.commit().await?;
		tracing::debug!(demoted = demoted.rows_affected(), "organization ownership transferred");
		Ok(())
	}

	/// List the members of an organization, ordered by user id.
	#[tracing::instrument(skip(self), fields(org_id = %org_id))]
	pub async fn list_org_members(&self, org_id: &OrgId) -> Result<Vec<(UserId, OrgRole)>, DbError> {
		self
			.list_members(Level::Organization, org_id.to_string())
			.await
	}

	#[tracing::instrument(skip(self), fields(project_id = %project_id))]
	pub async fn list_project_members(
		&self,
		project_id: &ProjectId,
	) -> Result<Vec<(UserId, ProjectRole)>, DbError> {
		self
			.list_members(Level::Project, project_id.to_string())
			.await
	}

	#[tracing::instrument(skip(self), fields(group_id = %group_id))]
	pub async fn list_group_members(
		&self,
		group_id: &GroupId,
	) -> Result<Vec<(UserId, GroupRole)>, DbError> {
		self
			.list_members(Level::Group, group_id.to_string())
			.await
	}

	async fn get_role<R>(
		&self,
		level: Level,
		container: String,
		user_id: &UserId,
	) -> Result<Option<R>, DbError>
	where
		R: FromStr<Err = ModelError>,
	{
		let (table, column) = membership_table(level);
		let sql = format!("SELECT role FROM {table} WHERE {column} = ? AND user_id = ?");

		let row = sqlx::query(&sql)
			.bind(container)
			.bind(user_id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| parse_text(&r, "role")).transpose()
	}

	async fn list_members<R>(&self, level: Level, container: String) -> Result<Vec<(UserId, R)>, DbError>
	where
		R: FromStr<Err = ModelError>,
	{
		let (table, column) = membership_table(level);
		let sql = format!("SELECT user_id, role FROM {table} WHERE {column} = ? ORDER BY user_id");

		let rows = sqlx::query(&sql)
			.bind(container)
			.fetch_all(&self.pool)
			.await?;

		rows
			.iter()
			.map(|r| -> Result<(UserId, R), DbError> {
				Ok((parse_text(r, "user_id")?, parse_text(r, "role")?))
			})
			.collect()
	}

	async fn row_exists(&self, table: &'static str, id: String) -> Result<bool, DbError> {
		let sql = format!("SELECT 1 FROM {table} WHERE id = ?");
		let row = sqlx::query(&sql)
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;
		Ok(row.is_some())
	}

	fn row_to_user(&self, row: &SqliteRow) -> Result<UserRecord, DbError> {
		Ok(UserRecord {
			id: parse_text(row, "id")?,
			username: row.try_get("username")?,
			display_name: row.try_get("display_name")?,
			global_role: parse_text::<GlobalRole>(row, "global_role")?,
		})
	}
}

#[async_trait]
impl MembershipStore for AuthzRepository {
	async fn find_org_membership(
		&self,
		org_id: &OrgId,
		user_id: &UserId,
	) -> Result<Option<OrgRole>, StoreError> {
		Ok(self.get_org_role(org_id, user_id).await?)
	}

	async fn find_project_membership(
		&self,
		project_id: &ProjectId,
		user_id: &UserId,
	) -> Result<Option<ProjectRole>, StoreError> {
		Ok(self.get_project_role(project_id, user_id).await?)
	}

	async fn find_group_membership(
		&self,
		group_id: &GroupId,
		user_id: &UserId,
	) -> Result<Option<GroupRole>, StoreError> {
		Ok(self.get_group_role(group_id, user_id).await?)
	}

	async fn upsert_membership(&self, edge: MembershipEdge) -> Result<(), StoreError> {
		Ok(AuthzRepository::upsert_membership(self, &edge).await?)
	}

	async fn delete_membership(&self, key: MembershipKey) -> Result<bool, StoreError> {
		Ok(AuthzRepository::delete_membership(self, &key).await?)
	}

	async fn transfer_org_ownership(
		&self,
		org_id: &OrgId,
		new_owner: &UserId,
	) -> Result<(), StoreError> {
		Ok(AuthzRepository::transfer_org_ownership(self, org_id, new_owner).await?)
	}
}

#[async_trait]
impl ContainmentResolver for AuthzRepository {
	async fn project_organization(
		&self,
		project_id: &ProjectId,
	) -> Result<Option<OrgId>, StoreError> {
		Ok(self.get_project_organization(project_id).await?)
	}

	async fn group_owner(&self, group_id: &GroupId) -> Result<Option<GroupOwner>, StoreError> {
		Ok(self.get_group_owner(group_id).await?)
	}

	async fn organization_exists(&self, org_id: &OrgId) -> Result<bool, StoreError> {
		Ok(AuthzRepository::organization_exists(self, org_id).await?)
	}

	async fn project_exists(&self, project_id: &ProjectId) -> Result<bool, StoreError> {
		Ok(AuthzRepository::project_exists(self, project_id).await?)
	}

	async fn group_exists(&self, group_id: &GroupId) -> Result<bool, StoreError> {
		Ok(AuthzRepository::group_exists(self, group_id).await?)
	}

	async fn user_exists(&self, user_id: &UserId) -> Result<bool, StoreError> {
		Ok(AuthzRepository::user_exists(self, user_id).await?)
	}
}

#[async_trait]
impl UserDirectory for AuthzRepository {
	async fn find_user_by_username(
		&self,
		username: &str,
	) -> Result<Option<UserRecord>, StoreError> {
		Ok(self.get_user_by_username(username).await?)
	}
}
