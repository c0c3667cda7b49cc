// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tcm_server_authz::{Check, GroupOwner, GroupId, ModelError, OrgId, ProjectId, UserId};

/// TCM server - hierarchical authorization for organizations, projects and groups.
#[derive(Parser, Debug)]
#[command(name = "tcm-server", about = "TCM authorization server", version)]
pub struct Args {
	/// Config file to read instead of /etc/tcm/server.toml
	#[arg(long, global = true, env = "TCM_SERVER_CONFIG")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Create the database schema
	Migrate,

	/// Evaluate one authorization decision for a user
	Check {
		/// Login name of the acting user; unknown names act anonymously
		#[arg(long)]
		username: String,

		/// Print the decision as JSON
		#[arg(long)]
		json: bool,

		#[command(subcommand)]
		target: Target,
	},

	/// Show version and build information
	Version,
}

#[derive(Subcommand, Debug)]
pub enum Target {
	/// Organization decisions
	Org {
		#[command(subcommand)]
		op: OrgOp,
	},
	/// Project decisions
	Project {
		#[command(subcommand)]
		op: ProjectOp,
	},
	/// Group decisions
	Group {
		#[command(subcommand)]
		op: GroupOp,
	},
}

#[derive(Subcommand, Debug)]
pub enum OrgOp {
	Access {
		#[arg(long)]
		org: OrgId,
	},
	Manage {
		#[arg(long)]
		org: OrgId,
	},
	Invite {
		#[arg(long)]
		org: OrgId,
	},
	RemoveMember {
		#[arg(long)]
		org: OrgId,
		#[arg(long)]
		target: UserId,
	},
	Delete {
		#[arg(long)]
		org: OrgId,
	},
	/// Hand ownership to an existing member
	TransferOwnership {
		#[arg(long)]
		org: OrgId,
		#[arg(long)]
		target: UserId,
	},
}

#[derive(Subcommand, Debug)]
pub enum ProjectOp {
	Access {
		#[arg(long)]
		project: ProjectId,
	},
	Manage {
		#[arg(long)]
		project: ProjectId,
	},
	Invite {
		#[arg(long)]
		project: ProjectId,
	},
	RemoveMember {
		#[arg(long)]
		project: ProjectId,
		#[arg(long)]
		target: UserId,
	},
	/// Create a project, inside `--org` or independent when omitted
	Create {
		#[arg(long)]
		org: Option<OrgId>,
	},
	UploadResults {
		#[arg(long)]
		project: ProjectId,
	},
	Delete {
		#[arg(long)]
		project: ProjectId,
	},
	/// Move a project into `--org`, or out of its organization when omitted
	Transfer {
		#[arg(long)]
		project: ProjectId,
		#[arg(long)]
		org: Option<OrgId>,
	},
}

#[derive(Subcommand, Debug)]
pub enum GroupOp {
	Access {
		#[arg(long)]
		group: GroupId,
	},
	Manage {
		#[arg(long)]
		group: GroupId,
	},
	Invite {
		#[arg(long)]
		group: GroupId,
	},
	RemoveMember {
		#[arg(long)]
		group: GroupId,
		#[arg(long)]
		target: UserId,
	},
	/// Create a group under `--org` or `--project`, independent when both are omitted
	Create {
		#[arg(long, conflicts_with = "project")]
		org: Option<OrgId>,
		#[arg(long)]
		project: Option<ProjectId>,
	},
	Delete {
		#[arg(long)]
		group: GroupId,
	},
}

impl Target {
	pub fn to_check(&self) -> Result<Check, ModelError> {
		let check = match self {
			Target::Org { op } => match *op {
				OrgOp::Access { org } => Check::OrgAccess { org_id: org },
				OrgOp::Manage { org } => Check::OrgManage { org_id: org },
				OrgOp::Invite { org } => Check::OrgInvite { org_id: org },
				OrgOp::RemoveMember { org, target } => Check::OrgRemoveMember {
					org_id: org,
					target,
				},
				OrgOp::Delete { org } => Check::OrgDelete { org_id: org },
				OrgOp::TransferOwnership { org, target } => Check::OrgTransferOwnership {
					org_id: org,
					target,
				},
			},
			Target::Project { op } => match *op {
				ProjectOp::Access { project } => Check::ProjectAccess {
					project_id: project,
				},
				ProjectOp::Manage { project } => Check::ProjectManage {
					project_id: project,
				},
				ProjectOp::Invite { project } => Check::ProjectInvite {
					project_id: project,
				},
				ProjectOp::RemoveMember { project, target } => Check::ProjectRemoveMember {
					project_id: project,
					target,
				},
				ProjectOp::Create { org } => Check::ProjectCreate { org_id: org },
				ProjectOp::UploadResults { project } => Check::ProjectUploadResults {
					project_id: project,
				},
				ProjectOp::Delete { project } => Check::ProjectDelete {
					project_id: project,
				},
				ProjectOp::Transfer { project, org } => Check::ProjectTransfer {
					project_id: project,
					org_id: org,
				},
			},
			Target::Group { op } => match *op {
				GroupOp::Access { group } => Check::GroupAccess { group_id: group },
				GroupOp::Manage { group } => Check::GroupManage { group_id: group },
				GroupOp::Invite { group } => Check::GroupInvite { group_id: group },
				GroupOp::RemoveMember { group, target } => Check::GroupRemoveMember {
					group_id: group,
					target,
				},
				GroupOp::Create { org, project } => Check::GroupCreate {
					parent: GroupOwner::from_columns(org, project)?,
				},
				GroupOp::Delete { group } => Check::GroupDelete { group_id: group },
			},
		};
		Ok(check)
	}
}
