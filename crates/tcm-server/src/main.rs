// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! TCM authorization server binary.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tcm_server_authz::Authorizer;
use tcm_server_config::{LoggingConfig, ServerConfig};
use tcm_server_db::{create_pool, run_migrations, AuthzRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod version;

use cli::{Args, Command, Target};

/// Exit status for an indeterminate decision or any other failure.
const EXIT_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
	match run(Args::parse()).await {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:#}");
			ExitCode::from(EXIT_ERROR)
		}
	}
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
	match args.command {
		Some(Command::Version) | None => {
			println!("{}", version::format_version_info());
			Ok(ExitCode::SUCCESS)
		}
		Some(Command::Migrate) => {
			let config = load_config(args.config.as_deref())?;
			migrate(&config).await
		}
		Some(Command::Check {
			username,
			json,
			target,
		}) => {
			let config = load_config(args.config.as_deref())?;
			check(&config, &username, json, &target).await
		}
	}
}

/// Load configuration and install the tracing subscriber it describes.
fn load_config(path: Option<&Path>) -> anyhow::Result<ServerConfig> {
	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = match path {
		Some(path) => tcm_server_config::load_config_with_file(path)?,
		None => tcm_server_config::load_config()?,
	};
	init_tracing(&config.logging);
	Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| logging.level.clone().into());

	// Logs go to stderr so stdout carries only the decision.
	tracing_subscriber::registry()
		.with(filter)
		.with(logging.json.then(|| {
			tracing_subscriber::fmt::layer()
				.json()
				.with_writer(std::io::stderr)
		}))
		.with((!logging.json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
		.init();
}

async fn migrate(config: &ServerConfig) -> anyhow::Result<ExitCode> {
	tracing::info!(database = %config.database.url, "running migrations");
	let pool = create_pool(&config.database.url).await?;
	run_migrations(&pool).await?;
	tracing::info!("migrations complete");
	Ok(ExitCode::SUCCESS)
}

async fn check(
	config: &ServerConfig,
	username: &str,
	json: bool,
	target: &Target,
) -> anyhow::Result<ExitCode> {
	let check = target.to_check()?;
	let pool = create_pool(&config.database.url).await?;
	let authz = Authorizer::new(Arc::new(AuthzRepository::new(pool)))
		.with_system_admin_role(config.authz.system_admin_role);

	let principal = authz.principal_for_username(username).await?;
	let allowed = authz.check(&check, &principal).await?;
	tracing::info!(%check, username, allowed, "decision");

	if json {
		let output = serde_json::json!({
			"username": username,
			"check": check,
			"allowed": allowed,
		});
		println!("{}", serde_json::to_string_pretty(&output)?);
	} else {
		println!("{}", if allowed { "allow" } else { "deny" });
	}

	Ok(if allowed {
		ExitCode::SUCCESS
	} else {
		ExitCode::FAILURE
	})
}
