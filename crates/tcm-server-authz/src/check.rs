// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! A single authorization question as a value.
//!
//! [`Check`] names one policy decision and its arguments, so callers such as
//! the operator CLI can evaluate any decision through
//! [`Authorizer::check`](crate::Authorizer::check).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{GroupId, GroupParent, OrgId, ProjectId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Check {
	OrgAccess { org_id: OrgId },
	OrgManage { org_id: OrgId },
	OrgInvite { org_id: OrgId },
	OrgRemoveMember { org_id: OrgId, target: UserId },
	OrgDelete { org_id: OrgId },
	OrgTransferOwnership { org_id: OrgId, target: UserId },
	ProjectAccess { project_id: ProjectId },
	ProjectManage { project_id: ProjectId },
	ProjectInvite { project_id: ProjectId },
	ProjectRemoveMember { project_id: ProjectId, target: UserId },
	ProjectCreate { org_id: Option<OrgId> },
	ProjectUploadResults { project_id: ProjectId },
	ProjectDelete { project_id: ProjectId },
	/// Move a project into `org_id`, or make it independent when `None`.
	ProjectTransfer { project_id: ProjectId, org_id: Option<OrgId> },
	GroupAccess { group_id: GroupId },
	GroupManage { group_id: GroupId },
	GroupInvite { group_id: GroupId },
	GroupRemoveMember { group_id: GroupId, target: UserId },
	GroupCreate { parent: GroupParent },
	GroupDelete { group_id: GroupId },
}

impl Check {
	pub fn name(&self) -> &'static str {
		match self {
			Check::OrgAccess { .. } => "org_access",
			Check::OrgManage { .. } => "org_manage",
			Check::OrgInvite { .. } => "org_invite",
			Check::OrgRemoveMember { .. } => "org_remove_member",
			Check::OrgDelete { .. } => "org_delete",
			Check::OrgTransferOwnership { .. } => "org_transfer_ownership",
			Check::ProjectAccess { .. } => "project_access",
			Check::ProjectManage { .. } => "project_manage",
			Check::ProjectInvite { .. } => "project_invite",
			Check::ProjectRemoveMember { .. } => "project_remove_member",
			Check::ProjectCreate { .. } => "project_create",
			Check::ProjectUploadResults { .. } => "project_upload_results",
			Check::ProjectDelete { .. } => "project_delete",
			Check::ProjectTransfer { .. } => "project_transfer",
			Check::GroupAccess { .. } => "group_access",
			Check::GroupManage { .. } => "group_manage",
			Check::GroupInvite { .. } => "group_invite",
			Check::GroupRemoveMember { .. } => "group_remove_member",
			Check::GroupCreate { .. } => "group_create",
			Check::GroupDelete { .. } => "group_delete",
		}
	}
}

impl fmt::Display for Check {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}
