// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-level access policies.
//!
//! Every policy checks the system-admin flag first, then the principal's
//! direct membership, then delegates one level up through the containment
//! resolver. Nothing is cached between calls.

mod group;
mod hierarchy;
mod org;
mod project;

pub use group::GroupPolicy;
pub use hierarchy::HierarchicalPolicy;
pub use org::OrganizationPolicy;
pub use project::ProjectPolicy;
