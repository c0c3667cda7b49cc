// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Hierarchical authorization for the TCM server.
//!
//! Decides whether a [`Principal`] may act on an organization, a project or a
//! group. Roles held at a containing level inherit downward:
//!
//! ```text
//! Organization ─┬─► Project ──► Group
//!               └─────────────► Group
//! ```
//!
//! A system administrator passes every check. Everything else is answered
//! from the membership and containment data behind the store traits in
//! [`store`]. Decisions are plain booleans. Store failures surface as
//! [`AuthzError::Indeterminate`] and are never turned into a deny.

pub mod authorizer;
pub mod check;
pub mod error;
pub mod members;
pub mod memory;
pub mod policy;
pub mod principal;
pub mod roles;
pub mod store;
pub mod types;

pub use authorizer::Authorizer;
pub use check::Check;
pub use error::{AuthzError, Result};
pub use members::{MemberManager, MembershipChange};
pub use memory::InMemoryStore;
pub use policy::{GroupPolicy, HierarchicalPolicy, OrganizationPolicy, ProjectPolicy};
pub use principal::{Principal, PrincipalProvider};
pub use roles::{Capabilities, GroupRole, Level, LevelRole, OrgRole, ProjectRole, TopRankRemoval};
pub use store::{
	ContainmentResolver, MembershipEdge, MembershipKey, MembershipStore, StoreError, UserDirectory,
	UserRecord,
};
pub use types::{
	GlobalRole, GroupId, GroupOwner, GroupParent, ModelError, OrgId, Project, ProjectId, UserId,
};
