// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use tcm_server_authz::{
	Authorizer, Check, GlobalRole, GroupId, GroupOwner, InMemoryStore, OrgId, Principal, ProjectId,
	UserId,
};

/// An in-memory store with an authorizer over it.
pub struct World {
	pub store: InMemoryStore,
	pub authz: Authorizer,
}

impl World {
	pub fn new() -> Self {
		let store = InMemoryStore::new();
		let authz = Authorizer::new(Arc::new(store.clone()));
		Self { store, authz }
	}

	/// Register a plain user and return its id with an authenticated principal.
	pub async fn user(&self, name: &str) -> (UserId, Principal) {
		let id = self.store.create_user(name, GlobalRole::User).await;
		(id, Principal::authenticated(id).with_display_name(name))
	}

	pub async fn org(&self) -> OrgId {
		self.store.create_organization().await
	}

	pub async fn project_in(&self, org_id: OrgId) -> ProjectId {
		self.store.create_project(Some(org_id)).await
	}

	pub async fn independent_project(&self) -> ProjectId {
		self.store.create_project(None).await
	}

	pub async fn group(&self, owner: GroupOwner) -> GroupId {
		self.store.create_group(owner).await
	}
}

pub struct AuthzCase {
	pub name: &'static str,
	pub principal: Principal,
	pub check: Check,
	pub expected: bool,
}

pub async fn run_authz_cases(authz: &Authorizer, cases: &[AuthzCase]) {
	for case in cases {
		let allowed = authz
			.check(&case.check, &case.principal)
			.await
			.unwrap_or_else(|e| panic!("Case '{}': {} failed: {e}", case.name, case.check));
		assert_eq!(
			allowed, case.expected,
			"Case '{}': {} - expected {}, got {}",
			case.name, case.check, case.expected, allowed
		);
	}
}
