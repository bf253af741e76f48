//! Command-line interface.
//!
//! - `serve <app>` - Run one exercise app
//! - `apps` - List the available apps
//! - `hash-password <password>` - Print an argon2 hash for a password
//! - `config check` - Validate the configuration file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::auth::{Argon2Hasher, PasswordHasher};
use crate::config::Config;
use crate::AppKind;

#[derive(Parser, Debug)]
#[command(name = "drillyard")]
#[command(author, version, about = "Small token-authenticated HTTP exercise backends", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "drillyard.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve one exercise app
    Serve {
        /// App to run
        #[arg(value_enum)]
        app: AppKind,
    },

    /// List the available apps
    Apps,

    /// Print an argon2 hash of a password, using the configured cost
    HashPassword {
        password: String,
    },

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

/// Run a command that does not start a server
pub fn run_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Apps => {
            cmd_apps();
            Ok(())
        }
        Commands::HashPassword { password } => cmd_hash_password(cli, password),
        Commands::Config(ConfigCommands::Check) => cmd_config_check(cli),
        Commands::Serve { .. } => Ok(()),
    }
}

fn cmd_apps() {
    println!();
    println!("{:<15}  DESCRIPTION", "APP");
    println!("{}", "-".repeat(70));
    for kind in AppKind::value_variants() {
        println!("{:<15}  {}", kind.name(), kind.description());
    }
    println!();
}

fn cmd_hash_password(cli: &Cli, password: &str) -> Result<()> {
    let config = Config::load(&cli.config)?;
    let hasher = Argon2Hasher::new(&config.auth.hasher).context("Invalid hasher parameters")?;
    let hash = hasher.hash(password).context("Failed to hash password")?;
    println!("{}", hash);
    Ok(())
}

fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("A default configuration will be used when starting the server.");
        return Ok(());
    }

    match Config::load(config_path) {
        Ok(config) => {
            print_summary(&config);
            Ok(())
        }
        Err(e) => {
            println!("[!!] Configuration file is invalid!");
            println!();
            println!("Error: {:#}", e);
            println!();
            anyhow::bail!("Invalid configuration file");
        }
    }
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "Enabled"
    } else {
        "Disabled"
    }
}

fn print_summary(config: &Config) {
    println!("[OK] Configuration file is valid!");
    println!();
    println!("=== Configuration Summary ===");
    println!();
    println!("Server:");
    println!("  Address:      {}:{}", config.server.host, config.server.port);
    println!();
    println!("Auth:");
    println!("  Algorithm:    {}", config.auth.algorithm.to_uppercase());
    println!(
        "  Token TTL:    {} minutes",
        config.auth.access_token_expire_minutes
    );
    println!(
        "  Argon2:       m={} KiB, t={}, p={}",
        config.auth.hasher.memory_kib, config.auth.hasher.iterations, config.auth.hasher.parallelism
    );
    println!();
    println!("Apps:");
    println!(
        "  Scheduled notifications: every {}s",
        config.notifications.schedule_interval_secs
    );
    println!("  Max upload:   {} bytes", config.files.max_upload_bytes);
    println!(
        "  2FA codes:    {} digits, valid {}s, {} attempts",
        config.two_factor.code_length,
        config.two_factor.code_ttl_secs,
        config.two_factor.max_attempts
    );
    println!("  Seed data:    {}", enabled(config.seed.enabled));
    println!();

    let mut warnings = Vec::new();
    if config.notifications.schedule_interval_secs == 0 {
        warnings.push("Scheduled notifications are disabled");
    }
    if config.seed.enabled {
        warnings.push("Seed data is enabled - demo users share one known password");
    }

    if !warnings.is_empty() {
        println!("Warnings:");
        for warning in warnings {
            println!("  [!] {}", warning);
        }
        println!();
    }
}
