//! credstore - edit the discovery credential list from the terminal
//!
//! Loads the shared settings file, applies one command to its
//! `[credentials]` section and writes the file back when something changed.
//! Other sections in the file are preserved.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use credstore_cli::{execute, Command};
use credstore_core::{default_settings_path, CredentialStore, SettingsFile, SettingsSection};

/// Manage credentials tried against discovered network devices
#[derive(Parser, Debug)]
#[command(name = "credstore")]
#[command(version)]
#[command(about = "Manage credentials tried against discovered network devices")]
struct Args {
    /// Settings file (defaults to credentials.conf in the user config directory)
    #[arg(long, short, env = "CREDSTORE_FILE")]
    file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let path = match args.file {
        Some(path) => path,
        None => default_settings_path()?,
    };

    let mut file = SettingsFile::new(path);
    let mut store = CredentialStore::with_change_callback(|| tracing::debug!("Credential list changed"));

    let report = {
        let mut sections: [&mut dyn SettingsSection; 1] = [&mut store];
        file.load(&mut sections).await?
    };
    if !report.unhandled.is_empty() {
        eprintln!("Ignored unknown keys: {}", report.unhandled.join(", "));
    }

    let command = args
        .command
        .with_prompted_password(|| rpassword::prompt_password("Password: "))?;
    let output = execute(command, &mut store)?;

    if output.changed {
        let mut sections: [&mut dyn SettingsSection; 1] = [&mut store];
        file.save(&mut sections).await?;
        info!("Credentials written to {:?}", file.path());
    }

    println!("{}", output.text);
    Ok(())
}
