//! Error taxonomy for vault operations.
//!
//! Every user-visible failure is a [`VaultError`] variant; the `Display`
//! rendering is the exact message printed by the CLI. Internally the
//! variants fall into five groups: lifecycle state, validation,
//! authorization, not-found, and cryptographic failures. Only
//! authorization denials and failed unseals are mirrored into the audit
//! log; everything else surfaces without an audit entry.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
  // -- Lifecycle state --
  /// An operation that needs the root key was called while sealed.
  #[error("Vault is sealed")]
  Sealed,

  #[error("Vault is already sealed")]
  AlreadySealed,

  #[error("Vault file already exists at {}", .path.display())]
  VaultExists { path: PathBuf },

  #[error("Vault file not found at {}", .path.display())]
  VaultNotFound { path: PathBuf },

  // -- Validation --
  #[error("Master password must not be empty")]
  EmptyPassword,

  #[error("Secret value must not be empty")]
  EmptyValue,

  #[error("Invalid path format: '{path}'")]
  InvalidPath { path: String },

  #[error("At least one capability must be specified")]
  NoCapabilities,

  /// Carries the first offending capability in caller order.
  #[error("Invalid capability '{capability}'. Valid capabilities: read, write, list, delete")]
  InvalidCapability { capability: String },

  // -- Authorization --
  /// The only error that emits a `denied` audit entry.
  #[error("Access denied for identity '{identity}' on path '{path}' (requires {capability})")]
  AccessDenied {
    identity: String,
    path: String,
    capability: String,
  },

  // -- Not found --
  #[error("Secret not found at path '{path}'")]
  SecretNotFound { path: String },

  #[error("Version {version} not found for path '{path}'")]
  VersionNotFound { version: u64, path: String },

  #[error("No policy found for identity '{identity}' on path '{pattern}'")]
  PolicyNotFound { identity: String, pattern: String },

  #[error("Audit log file not found at {}", .path.display())]
  AuditNotFound { path: PathBuf },

  // -- Cryptographic --
  /// The derived key failed to open the verification token on unseal.
  #[error("Incorrect master password")]
  IncorrectPassword,

  /// Wrong key or tampered ciphertext; the GCM tag did not verify.
  #[error("Decryption failed: invalid key or tampered data")]
  Decryption,

  #[error("Encryption failed")]
  Encryption,

  // -- Persistence --
  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error("Invalid vault file format: {0}")]
  Malformed(#[from] serde_json::Error),

  #[error("Invalid session file format")]
  MalformedSession,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn messages_match_cli_contract() {
    assert_eq!(VaultError::Sealed.to_string(), "Vault is sealed");
    assert_eq!(VaultError::AlreadySealed.to_string(), "Vault is already sealed");
    assert_eq!(
      VaultError::VaultExists { path: PathBuf::from("vault.enc") }.to_string(),
      "Vault file already exists at vault.enc"
    );
    assert_eq!(
      VaultError::VaultNotFound { path: PathBuf::from("vault.enc") }.to_string(),
      "Vault file not found at vault.enc"
    );
    assert_eq!(
      VaultError::InvalidCapability { capability: "execute".to_string() }.to_string(),
      "Invalid capability 'execute'. Valid capabilities: read, write, list, delete"
    );
    assert_eq!(
      VaultError::AccessDenied {
        identity: "service-b".to_string(),
        path: "app-a/db/password".to_string(),
        capability: "read".to_string(),
      }
      .to_string(),
      "Access denied for identity 'service-b' on path 'app-a/db/password' (requires read)"
    );
    assert_eq!(
      VaultError::VersionNotFound { version: 99, path: "config/api-key".to_string() }.to_string(),
      "Version 99 not found for path 'config/api-key'"
    );
  }
}
