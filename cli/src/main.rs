//! Propstore CLI
//!
//! Reads and writes application preferences and system properties from the
//! shell.
//!
//! ## Usage
//!
//! ```bash
//! # List system property keys
//! propstore
//!
//! # Print one system property
//! propstore com.palm.properties.buildName
//!
//! # List an application's keys, or dump its entries
//! propstore -n com.palm.browser
//! propstore -n com.palm.browser -a
//!
//! # Set and delete application values
//! propstore -n com.palm.browser -s currentURL '["http://example.com"]'
//! propstore -n com.palm.browser -m -s currentURL http://example.com
//! propstore -n com.palm.browser -k currentURL
//!
//! # Run one service request
//! propstore call /systemProperties/getSysKeysObj '{}' --public
//! ```

mod invocation;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use propstore::infrastructure::config::Settings;
use propstore::infrastructure::telemetry::TelemetryBuilder;
use propstore::service::{Channel, PrefsService};
use tracing::debug;

use invocation::{Flags, Invocation};

/// Propstore - application preferences and system properties
#[derive(Parser, Debug)]
#[command(name = "propstore")]
#[command(about = "Read and write application preferences and system properties")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Operate on this application's store instead of system properties
    #[arg(short = 'n', long = "app", value_name = "APP_ID")]
    app_id: Option<String>,

    /// Shell mode: plain strings in and out
    #[arg(short = 'm', long = "shell")]
    shell: bool,

    /// Delete the entry for KEY
    #[arg(short = 'k', long = "delete", value_name = "KEY")]
    delete: Option<String>,

    /// Set KEY to the VALUE that follows
    #[arg(short = 's', long = "set", value_name = "KEY")]
    set: Option<String>,

    /// Dump all key/value pairs
    #[arg(short = 'a', long = "all")]
    all: bool,

    /// Delete the application's whole store
    #[arg(long)]
    clear: bool,

    /// Configuration file layered under the environment
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// KEY to print, or VALUE for -s
    #[arg(value_name = "ARGS")]
    rest: Vec<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one preferences service request and print the reply
    Call {
        /// Method path, e.g. /systemProperties/getSysKeys
        method: String,

        /// JSON request payload
        #[arg(default_value = "{}")]
        payload: String,

        /// Send on the public channel
        #[arg(long)]
        public: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let level = if cli.verbose { "debug" } else { "warn" };
    if let Err(e) = TelemetryBuilder::new("propstore")
        .with_settings(&settings.telemetry)
        .with_log_level(level)
        .init()
    {
        eprintln!("warning: {e:#}");
    }

    match run(cli, &settings).await {
        Ok(Some(output)) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, settings: &Settings) -> anyhow::Result<Option<String>> {
    if let Some(Commands::Call {
        method,
        payload,
        public,
    }) = cli.command
    {
        let channel = if public { Channel::Public } else { Channel::Private };
        let reply = PrefsService::from_settings(settings)
            .call(&method, &payload, channel)
            .await;
        return Ok(Some(reply.to_string()));
    }

    let flags = Flags {
        app_id: cli.app_id,
        shell: cli.shell,
        delete: cli.delete,
        set: cli.set,
        all: cli.all,
        clear: cli.clear,
        rest: cli.rest,
    };
    let invocation = match Invocation::from_flags(flags) {
        Ok(invocation) => invocation,
        Err(message) => Cli::command()
            .error(clap::error::ErrorKind::ArgumentConflict, message)
            .exit(),
    };
    debug!(?invocation, "Running");
    invocation.execute(settings).await
}
