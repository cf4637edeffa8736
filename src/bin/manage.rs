//! Project management CLI for shape-tracker
//!
//! Equivalent of Django's `manage.py`: run the server, create the schema,
//! or check that the configuration works.

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tracker::apps::tracker::{EntryStore, SqliteEntryStore};
use tracker::config::{Settings, urls};
use tracker::core::logging;
use tracker::core::server::{HttpServer, shutdown_signal};

#[derive(Parser)]
#[command(name = "manage")]
#[command(about = "shape-tracker management interface", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Settings file (defaults to ./settings.toml when present)
	#[arg(long, global = true, value_name = "FILE")]
	settings: Option<PathBuf>,

	/// Verbosity level (can be repeated for more output)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	verbosity: u8,
}

#[derive(Subcommand)]
enum Commands {
	/// Start the development server
	Runserver {
		/// Address to bind, overriding the settings
		#[arg(value_name = "ADDR")]
		address: Option<SocketAddr>,

		/// Skip creating the schema on startup
		#[arg(long)]
		no_migrate: bool,
	},

	/// Create the database schema
	Migrate,

	/// Load settings, connect to the database and report the entry count
	Check,
}

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();

	match run(cli).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			eprintln!("Error: {:#}", err);
			ExitCode::FAILURE
		}
	}
}

async fn run(cli: Cli) -> anyhow::Result<()> {
	let settings = Settings::load(cli.settings.as_deref()).context("failed to load settings")?;
	logging::init(&logging::filter_for_verbosity(cli.verbosity, &settings.log_filter));

	let store = SqliteEntryStore::connect(&settings.database_url, settings.max_connections)
		.await
		.with_context(|| format!("failed to connect to {}", settings.database_url))?;

	match cli.command {
		Commands::Runserver {
			address,
			no_migrate,
		} => {
			if !no_migrate {
				store.migrate().await.context("failed to create schema")?;
			}

			let addr = address.unwrap_or(settings.bind_addr);
			let router = urls::url_patterns(Arc::new(store))
				.map_err(|e| anyhow::anyhow!("failed to build routes: {}", e))?;

			tracing::info!(%addr, database = %settings.database_url, "starting development server");
			HttpServer::new(Arc::new(router))
				.listen_with_shutdown(addr, shutdown_signal())
				.await
				.map_err(|e| anyhow::anyhow!("server error: {}", e))?;
		}
		Commands::Migrate => {
			store.migrate().await.context("failed to create schema")?;
			println!("Schema ready at {}", settings.database_url);
		}
		Commands::Check => {
			store.migrate().await.context("failed to create schema")?;
			let total = store.count().await.context("failed to count entries")?;
			println!("OK: {} entries in {}", total, settings.database_url);
		}
	}

	Ok(())
}
