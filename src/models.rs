//! Core data structures for the secret vault.
//!
//! This module defines the at-rest vault document and its typed records:
//! - [`VaultData`] - the whole persisted document (salt, KDF parameters,
//!   verification token, secrets, policies)
//! - [`Secret`] / [`SecretVersion`] - append-only versioned ciphertext
//! - [`Policy`] / [`Capability`] - path-based access control entries
//!
//! Binary fields are raw bytes in memory and base64 strings on disk; the
//! coding happens at the serde boundary only, via [`base64_bytes`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::VaultError;

/// Length of the PBKDF2 salt (16 bytes).
pub const SALT_LEN: usize = 16;

/// Length of an AES-256 key (32 bytes), for both the root key and DEKs.
pub const KEY_LEN: usize = 32;

/// Length of the AES-GCM nonce (12 bytes).
pub const NONCE_LEN: usize = 12;

/// PBKDF2-HMAC-SHA256 iteration count written at init time.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 600_000;

/// Known plaintext encrypted under the root key at init; decrypting it on
/// unseal proves the passphrase without storing key material.
pub const VERIFICATION_PLAINTEXT: &[u8] = b"vault-verification-token";

/// An action a policy can authorize on matching paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
  Read,
  Write,
  List,
  Delete,
}

impl Capability {
  pub fn as_str(self) -> &'static str {
    match self {
      Capability::Read => "read",
      Capability::Write => "write",
      Capability::List => "list",
      Capability::Delete => "delete",
    }
  }
}

impl fmt::Display for Capability {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Capability {
  type Err = VaultError;

  /// Parses a capability name; the error carries the offending string so
  /// callers can report it verbatim.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "read" => Ok(Capability::Read),
      "write" => Ok(Capability::Write),
      "list" => Ok(Capability::List),
      "delete" => Ok(Capability::Delete),
      other => Err(VaultError::InvalidCapability { capability: other.to_string() }),
    }
  }
}

/// An access control policy entry.
///
/// Identities are matched by exact equality, paths by glob pattern
/// (see [`crate::policy::match_path_pattern`]). Policies are kept in
/// insertion order; evaluation is default-deny, first grant wins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
  pub identity: String,
  pub path_pattern: String,
  pub capabilities: Vec<Capability>,
}

/// One immutable version of a secret.
///
/// The value is sealed under a per-version DEK, and the DEK is sealed
/// under the root key. Version records are never mutated or removed
/// individually; deleting a secret drops the whole record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SecretVersion {
  /// 1-based position in the parent's `versions` sequence.
  pub version_number: u64,
  /// The DEK encrypted under the root key (AES-256-GCM, tag included).
  #[serde(with = "base64_bytes")]
  pub encrypted_dek: Vec<u8>,
  #[serde(with = "base64_bytes")]
  pub dek_nonce: Vec<u8>,
  /// The secret value encrypted under the DEK (AES-256-GCM, tag included).
  #[serde(with = "base64_bytes")]
  pub encrypted_value: Vec<u8>,
  #[serde(with = "base64_bytes")]
  pub value_nonce: Vec<u8>,
  pub created_at: DateTime<Utc>,
}

/// A secret record: a canonical path and its append-only version history.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Secret {
  pub path: String,
  /// Non-empty; `versions[i].version_number == i + 1`.
  pub versions: Vec<SecretVersion>,
}

/// The whole at-rest vault document.
///
/// `salt` and `iterations` are immutable after init. The verification
/// fields detect a wrong passphrase on unseal. Secrets are keyed by path;
/// a `BTreeMap` keeps listing order stable and ascending.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VaultData {
  #[serde(with = "base64_bytes")]
  pub salt: Vec<u8>,
  pub iterations: u32,
  #[serde(with = "base64_bytes")]
  pub verification_nonce: Vec<u8>,
  #[serde(with = "base64_bytes")]
  pub verification_token: Vec<u8>,
  pub secrets: BTreeMap<String, Secret>,
  pub policies: Vec<Policy>,
}

/// Serde helpers encoding `Vec<u8>` fields as base64 strings on disk.
pub(crate) mod base64_bytes {
  use base64::engine::general_purpose::STANDARD;
  use base64::Engine as _;
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.serialize_str(&STANDARD.encode(bytes))
  }

  pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
  where
    D: Deserializer<'de>,
  {
    let encoded = String::deserialize(deserializer)?;
    STANDARD.decode(encoded.as_bytes()).map_err(serde::de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use base64::engine::general_purpose::STANDARD;
  use base64::Engine as _;

  #[test]
  fn capability_parses_and_round_trips() {
    for name in ["read", "write", "list", "delete"] {
      let cap: Capability = name.parse().expect("valid capability");
      assert_eq!(cap.to_string(), name);
    }
    let err = "execute".parse::<Capability>().unwrap_err();
    assert_eq!(
      err.to_string(),
      "Invalid capability 'execute'. Valid capabilities: read, write, list, delete"
    );
  }

  #[test]
  fn capability_serializes_lowercase() {
    let json = serde_json::to_string(&Capability::Write).unwrap();
    assert_eq!(json, "\"write\"");
    let cap: Capability = serde_json::from_str("\"delete\"").unwrap();
    assert_eq!(cap, Capability::Delete);
  }

  #[test]
  fn binary_fields_round_trip_as_base64() {
    let version = SecretVersion {
      version_number: 1,
      encrypted_dek: vec![0x00, 0xff, 0x10],
      dek_nonce: vec![1; NONCE_LEN],
      encrypted_value: vec![0xde, 0xad, 0xbe, 0xef],
      value_nonce: vec![2; NONCE_LEN],
      created_at: Utc::now(),
    };

    let json = serde_json::to_string(&version).unwrap();
    // Raw bytes never appear in the serialized form.
    assert!(json.contains(&STANDARD.encode([0xde, 0xad, 0xbe, 0xef])));

    let back: SecretVersion = serde_json::from_str(&json).unwrap();
    assert_eq!(back.encrypted_dek, version.encrypted_dek);
    assert_eq!(back.encrypted_value, version.encrypted_value);
    assert_eq!(back.value_nonce, version.value_nonce);
  }
}
