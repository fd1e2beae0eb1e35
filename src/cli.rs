//! Command-line surface for the vault.
//!
//! Thin layer over [`Vault`](crate::vault::Vault): parse arguments,
//! prompt for the master password when `--password` is omitted, dispatch,
//! and print results. All error formatting (`Error: <msg>` on stderr,
//! non-zero exit) happens in the binary entry point.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use zeroize::Zeroizing;

use crate::error::VaultError;
use crate::vault::Vault;

#[derive(Parser)]
#[command(name = "vault", version)]
#[command(about = "Secret Management Vault - local, file-backed, envelope-encrypted")]
pub struct Cli {
  #[command(subcommand)]
  pub command: Commands,

  /// Path to the encrypted vault file.
  #[arg(long, global = true, default_value = "vault.enc")]
  pub vault_file: PathBuf,

  /// Path to the append-only audit log.
  #[arg(long, global = true, default_value = "audit.log")]
  pub audit_file: PathBuf,

  /// Enable verbose logging on stderr.
  #[arg(short, long, global = true)]
  pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
  /// Initialize a new vault
  Init {
    /// Master password (prompted when omitted)
    #[arg(long)]
    password: Option<String>,
  },
  /// Unseal the vault
  Unseal {
    /// Master password (prompted when omitted)
    #[arg(long)]
    password: Option<String>,
  },
  /// Seal the vault
  Seal,
  /// Show vault status
  Status,
  /// Store or update a secret
  Put {
    /// Secret path (e.g., production/db/password)
    path: String,
    /// Secret value
    value: String,
    #[arg(long)]
    identity: String,
  },
  /// Retrieve a secret
  Get {
    /// Secret path
    path: String,
    #[arg(long)]
    identity: String,
    /// Specific version number (latest when omitted)
    #[arg(long)]
    version: Option<u64>,
  },
  /// Delete a secret
  Delete {
    /// Secret path
    path: String,
    #[arg(long)]
    identity: String,
  },
  /// List secrets by prefix
  List {
    /// Path prefix filter
    prefix: Option<String>,
    #[arg(long)]
    identity: String,
  },
  /// Add an access control policy
  AddPolicy {
    #[arg(long)]
    identity: String,
    #[arg(long)]
    path_pattern: String,
    /// Comma-separated capabilities (read, write, list, delete)
    #[arg(long)]
    capabilities: String,
  },
  /// Remove an access control policy
  RemovePolicy {
    #[arg(long)]
    identity: String,
    #[arg(long)]
    path_pattern: String,
  },
  /// View audit log entries
  AuditLog {
    /// Show only the last N entries
    #[arg(long)]
    last: Option<usize>,
  },
}

/// Resolves the master password: the flag value if given, otherwise an
/// interactive prompt that never echoes.
fn resolve_password(flag: Option<String>) -> Result<Zeroizing<String>, VaultError> {
  match flag {
    Some(password) => Ok(Zeroizing::new(password)),
    None => Ok(Zeroizing::new(rpassword::prompt_password("Master password: ")?)),
  }
}

/// Dispatches a parsed command and prints its success output.
pub fn run(cli: Cli) -> Result<(), VaultError> {
  let vault = Vault::new(&cli.vault_file, &cli.audit_file);

  match cli.command {
    Commands::Init { password } => {
      let password = resolve_password(password)?;
      println!("{}", vault.init(&password)?);
    }
    Commands::Unseal { password } => {
      let password = resolve_password(password)?;
      println!("{}", vault.unseal(&password)?);
    }
    Commands::Seal => {
      println!("{}", vault.seal()?);
    }
    Commands::Status => {
      println!("Status: {}", vault.status()?.as_str());
    }
    Commands::Put { path, value, identity } => {
      println!("{}", vault.put_secret(&path, &value, &identity)?);
    }
    Commands::Get { path, identity, version } => {
      let record = vault.get_secret(&path, &identity, version)?;
      println!("Path: {}", record.path);
      println!("Version: {}", record.version);
      println!("Value: {}", record.value.as_str());
    }
    Commands::Delete { path, identity } => {
      println!("{}", vault.delete_secret(&path, &identity)?);
    }
    Commands::List { prefix, identity } => {
      let paths = vault.list_secrets(&identity, prefix.as_deref().unwrap_or(""))?;
      if paths.is_empty() {
        println!("No secrets found.");
      } else {
        for path in paths {
          println!("{path}");
        }
      }
    }
    Commands::AddPolicy { identity, path_pattern, capabilities } => {
      let caps: Vec<String> = capabilities.split(',').map(|c| c.trim().to_string()).collect();
      println!("{}", vault.add_policy(&identity, &path_pattern, &caps)?);
    }
    Commands::RemovePolicy { identity, path_pattern } => {
      println!("{}", vault.remove_policy(&identity, &path_pattern)?);
    }
    Commands::AuditLog { last } => {
      for line in vault.audit_log(last)? {
        println!("{line}");
      }
    }
  }

  Ok(())
}
