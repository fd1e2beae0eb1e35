//! Vault orchestrator.
//!
//! [`Vault`] coordinates the seal/unseal lifecycle, envelope encryption
//! workflows, secret versioning, policy mediation, and audit emission by
//! delegating to the [`crypto`](crate::crypto), [`storage`](crate::storage),
//! [`policy`](crate::policy), and [`audit`](crate::audit) modules.
//!
//! # State and ordering
//!
//! The root key is never held as a field: it is re-read from the session
//! file on every operation, used, and dropped (the session wrapper zeroes
//! it). The vault document, including the policy list, is reloaded on
//! every operation so external edits are honored.
//!
//! For every operation the audit entry for the outcome is emitted after
//! the effect has been committed (persistence complete) and before the
//! result is returned; denials are audited before the error surfaces.
//!
//! # Security
//!
//! - Envelope scheme: value under a fresh per-version DEK, DEK under the
//!   root key, both AES-256-GCM.
//! - Decrypted DEKs and values live in zeroized buffers.
//! - A wrong passphrase is detected via the verification token; the root
//!   key itself is never persisted in the vault document.

use std::path::{Path, PathBuf};
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use crate::audit::{self, Outcome};
use crate::crypto;
use crate::error::VaultError;
use crate::models::{
  Capability, Policy, Secret, SecretVersion, VaultData, DEFAULT_PBKDF2_ITERATIONS, KEY_LEN,
  VERIFICATION_PLAINTEXT,
};
use crate::policy;
use crate::storage;

/// Whether the root key is currently materialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SealStatus {
  Sealed,
  Unsealed,
}

impl SealStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      SealStatus::Sealed => "sealed",
      SealStatus::Unsealed => "unsealed",
    }
  }
}

/// A decrypted secret as returned by [`Vault::get_secret`].
///
/// The value is wrapped in [`Zeroizing`] so it is wiped when the caller
/// drops the record.
#[derive(Debug)]
pub struct SecretRecord {
  pub path: String,
  pub version: u64,
  pub value: Zeroizing<String>,
}

/// Central coordinator for all vault operations.
///
/// Holds only file locations and the init-time work factor; all state
/// lives on disk and is reloaded per operation.
pub struct Vault {
  vault_file: PathBuf,
  audit_file: PathBuf,
  iterations: u32,
}

impl Vault {
  pub fn new(vault_file: impl Into<PathBuf>, audit_file: impl Into<PathBuf>) -> Self {
    Self {
      vault_file: vault_file.into(),
      audit_file: audit_file.into(),
      iterations: DEFAULT_PBKDF2_ITERATIONS,
    }
  }

  /// Overrides the PBKDF2 iteration count used at init time.
  ///
  /// The CLI always runs with the default; tests use a cheaper work
  /// factor. Unseal is unaffected - it reads the count stored in the
  /// vault document.
  pub fn with_iterations(mut self, iterations: u32) -> Self {
    self.iterations = iterations;
    self
  }

  pub fn vault_file(&self) -> &Path {
    &self.vault_file
  }

  /// The session slot sits next to the vault file with a `.session` suffix.
  fn session_file(&self) -> PathBuf {
    let mut os = self.vault_file.as_os_str().to_os_string();
    os.push(".session");
    PathBuf::from(os)
  }

  /// Loads the root key from the session slot, failing when sealed.
  fn ensure_unsealed(&self) -> Result<Zeroizing<[u8; KEY_LEN]>, VaultError> {
    storage::load_session(&self.session_file())?.ok_or(VaultError::Sealed)
  }

  // -- Seal/unseal lifecycle --

  /// Creates a new vault file protected by `password`.
  ///
  /// Generates the salt, derives the root key, encrypts the verification
  /// plaintext, and persists an empty document. Any stale session file is
  /// deleted - init never leaves the vault unsealed.
  pub fn init(&self, password: &str) -> Result<String, VaultError> {
    if password.is_empty() {
      return Err(VaultError::EmptyPassword);
    }
    if storage::vault_file_exists(&self.vault_file) {
      return Err(VaultError::VaultExists { path: self.vault_file.clone() });
    }

    let salt = crypto::generate_salt();
    let root_key = crypto::derive_root_key(password, &salt, self.iterations);
    let (v_nonce, v_token) = crypto::encrypt(&root_key, VERIFICATION_PLAINTEXT)?;

    let data = VaultData {
      salt: salt.to_vec(),
      iterations: self.iterations,
      verification_nonce: v_nonce.to_vec(),
      verification_token: v_token,
      secrets: Default::default(),
      policies: Vec::new(),
    };

    storage::save_vault(&data, &self.vault_file)?;
    storage::delete_session(&self.session_file())?;
    audit::log_event(&self.audit_file, "system", "init", None, Outcome::Success, None)?;

    debug!(vault = %self.vault_file.display(), "vault initialized");
    Ok(format!("Vault initialized at {}", self.vault_file.display()))
  }

  /// Unseals the vault, materializing the root key in the session slot.
  ///
  /// Idempotent: unsealing an already-unsealed vault re-establishes the
  /// session. A wrong passphrase leaves the vault sealed and is audited
  /// as an error.
  pub fn unseal(&self, password: &str) -> Result<String, VaultError> {
    if !storage::vault_file_exists(&self.vault_file) {
      return Err(VaultError::VaultNotFound { path: self.vault_file.clone() });
    }

    let data = storage::load_vault(&self.vault_file)?;
    let root_key = crypto::derive_root_key(password, &data.salt, data.iterations);

    match crypto::decrypt(&root_key, &data.verification_nonce, &data.verification_token) {
      Ok(mut verification) => verification.zeroize(),
      Err(VaultError::Decryption) => {
        audit::log_event(
          &self.audit_file,
          "system",
          "unseal",
          None,
          Outcome::Error,
          Some("Incorrect master password"),
        )?;
        return Err(VaultError::IncorrectPassword);
      }
      Err(e) => return Err(e),
    }

    storage::save_session(&self.session_file(), &root_key)?;
    audit::log_event(&self.audit_file, "system", "unseal", None, Outcome::Success, None)?;

    debug!(vault = %self.vault_file.display(), "vault unsealed");
    Ok("Vault unsealed successfully.".to_string())
  }

  /// Seals the vault by discarding the session slot.
  pub fn seal(&self) -> Result<String, VaultError> {
    if storage::load_session(&self.session_file())?.is_none() {
      return Err(VaultError::AlreadySealed);
    }

    storage::delete_session(&self.session_file())?;
    audit::log_event(&self.audit_file, "system", "seal", None, Outcome::Success, None)?;

    debug!(vault = %self.vault_file.display(), "vault sealed");
    Ok("Vault sealed.".to_string())
  }

  /// Reports sealed/unsealed from session-slot presence. Emits no audit.
  pub fn status(&self) -> Result<SealStatus, VaultError> {
    if !storage::vault_file_exists(&self.vault_file) {
      return Err(VaultError::VaultNotFound { path: self.vault_file.clone() });
    }

    match storage::load_session(&self.session_file())? {
      Some(_) => Ok(SealStatus::Unsealed),
      None => Ok(SealStatus::Sealed),
    }
  }

  // -- Policy management --

  /// Appends an access control policy.
  pub fn add_policy(
    &self,
    identity: &str,
    path_pattern: &str,
    capabilities: &[String],
  ) -> Result<String, VaultError> {
    self.ensure_unsealed()?;

    if capabilities.is_empty() {
      return Err(VaultError::NoCapabilities);
    }
    let parsed = policy::parse_capabilities(capabilities)?;

    let mut data = storage::load_vault(&self.vault_file)?;
    data.policies.push(Policy {
      identity: identity.to_string(),
      path_pattern: path_pattern.to_string(),
      capabilities: parsed.clone(),
    });
    storage::save_vault(&data, &self.vault_file)?;

    audit::log_event(
      &self.audit_file,
      "system",
      "add-policy",
      None,
      Outcome::Success,
      Some(&format!("identity='{identity}', path='{path_pattern}'")),
    )?;

    let caps: Vec<&str> = parsed.iter().map(|c| c.as_str()).collect();
    Ok(format!(
      "Policy added: identity='{identity}', path='{path_pattern}', capabilities=[{}]",
      caps.join(", ")
    ))
  }

  /// Removes the first policy whose identity and pattern match exactly.
  ///
  /// Remaining policies keep their insertion order.
  pub fn remove_policy(&self, identity: &str, path_pattern: &str) -> Result<String, VaultError> {
    self.ensure_unsealed()?;

    let mut data = storage::load_vault(&self.vault_file)?;
    let position = data
      .policies
      .iter()
      .position(|p| p.identity == identity && p.path_pattern == path_pattern)
      .ok_or_else(|| VaultError::PolicyNotFound {
        identity: identity.to_string(),
        pattern: path_pattern.to_string(),
      })?;

    data.policies.remove(position);
    storage::save_vault(&data, &self.vault_file)?;

    audit::log_event(
      &self.audit_file,
      "system",
      "remove-policy",
      None,
      Outcome::Success,
      Some(&format!("identity='{identity}', path='{path_pattern}'")),
    )?;

    Ok(format!("Policy removed: identity='{identity}', path='{path_pattern}'"))
  }

  // -- Secret CRUD --

  /// Stores or updates a secret at `path`.
  ///
  /// Envelope encryption: a fresh DEK encrypts the value, the root key
  /// encrypts the DEK. A new path gets version 1 (audited as `store`);
  /// an existing path gets version `len + 1` (audited as `update`).
  pub fn put_secret(&self, path: &str, value: &str, identity: &str) -> Result<String, VaultError> {
    let root_key = self.ensure_unsealed()?;

    if !policy::validate_path(path) {
      return Err(VaultError::InvalidPath { path: path.to_string() });
    }
    if value.is_empty() {
      return Err(VaultError::EmptyValue);
    }

    let mut data = storage::load_vault(&self.vault_file)?;

    if !policy::check_access(&data.policies, identity, path, Capability::Write) {
      audit::log_event(
        &self.audit_file,
        identity,
        "store",
        Some(path),
        Outcome::Denied,
        Some("requires write"),
      )?;
      return Err(VaultError::AccessDenied {
        identity: identity.to_string(),
        path: path.to_string(),
        capability: "write".to_string(),
      });
    }

    let dek = crypto::generate_dek();
    let (value_nonce, encrypted_value) = crypto::encrypt(&dek, value.as_bytes())?;
    let (dek_nonce, encrypted_dek) = crypto::encrypt(&root_key, dek.as_slice())?;

    let mut version = SecretVersion {
      version_number: 1,
      encrypted_dek,
      dek_nonce: dek_nonce.to_vec(),
      encrypted_value,
      value_nonce: value_nonce.to_vec(),
      created_at: chrono::Utc::now(),
    };

    let (operation, version_number) = match data.secrets.get_mut(path) {
      Some(secret) => {
        let next = secret.versions.len() as u64 + 1;
        version.version_number = next;
        secret.versions.push(version);
        ("update", next)
      }
      None => {
        data.secrets.insert(
          path.to_string(),
          Secret { path: path.to_string(), versions: vec![version] },
        );
        ("store", 1)
      }
    };

    storage::save_vault(&data, &self.vault_file)?;
    audit::log_event(&self.audit_file, identity, operation, Some(path), Outcome::Success, None)?;

    debug!(path, version = version_number, "secret written");
    match operation {
      "store" => Ok(format!("Secret stored at {path} (version 1)")),
      _ => Ok(format!("Secret updated at {path} (version {version_number})")),
    }
  }

  /// Retrieves a secret, the latest version unless `version` is given.
  ///
  /// Envelope decryption: the root key opens the DEK, the DEK opens the
  /// value. An authentication failure here means corruption and surfaces
  /// as a hard [`VaultError::Decryption`].
  pub fn get_secret(
    &self,
    path: &str,
    identity: &str,
    version: Option<u64>,
  ) -> Result<SecretRecord, VaultError> {
    let root_key = self.ensure_unsealed()?;

    let data = storage::load_vault(&self.vault_file)?;

    if !policy::check_access(&data.policies, identity, path, Capability::Read) {
      audit::log_event(
        &self.audit_file,
        identity,
        "retrieve",
        Some(path),
        Outcome::Denied,
        Some("requires read"),
      )?;
      return Err(VaultError::AccessDenied {
        identity: identity.to_string(),
        path: path.to_string(),
        capability: "read".to_string(),
      });
    }

    let secret = data
      .secrets
      .get(path)
      .ok_or_else(|| VaultError::SecretNotFound { path: path.to_string() })?;

    let selected = match version {
      None => secret
        .versions
        .last()
        .ok_or_else(|| VaultError::SecretNotFound { path: path.to_string() })?,
      Some(requested) => secret
        .versions
        .iter()
        .find(|v| v.version_number == requested)
        .ok_or(VaultError::VersionNotFound { version: requested, path: path.to_string() })?,
    };

    let mut dek_bytes = crypto::decrypt(&root_key, &selected.dek_nonce, &selected.encrypted_dek)?;
    if dek_bytes.len() != KEY_LEN {
      dek_bytes.zeroize();
      return Err(VaultError::Decryption);
    }
    let mut dek = Zeroizing::new([0u8; KEY_LEN]);
    dek.copy_from_slice(&dek_bytes);
    dek_bytes.zeroize();

    let mut plaintext = crypto::decrypt(&dek, &selected.value_nonce, &selected.encrypted_value)?;
    let value = match String::from_utf8(plaintext.clone()) {
      Ok(value) => Zeroizing::new(value),
      Err(_) => {
        plaintext.zeroize();
        return Err(VaultError::Decryption);
      }
    };
    plaintext.zeroize();

    audit::log_event(&self.audit_file, identity, "retrieve", Some(path), Outcome::Success, None)?;

    Ok(SecretRecord {
      path: path.to_string(),
      version: selected.version_number,
      value,
    })
  }

  /// Deletes a secret and all its versions.
  pub fn delete_secret(&self, path: &str, identity: &str) -> Result<String, VaultError> {
    self.ensure_unsealed()?;

    let mut data = storage::load_vault(&self.vault_file)?;

    if !policy::check_access(&data.policies, identity, path, Capability::Delete) {
      audit::log_event(
        &self.audit_file,
        identity,
        "delete",
        Some(path),
        Outcome::Denied,
        Some("requires delete"),
      )?;
      return Err(VaultError::AccessDenied {
        identity: identity.to_string(),
        path: path.to_string(),
        capability: "delete".to_string(),
      });
    }

    if data.secrets.remove(path).is_none() {
      return Err(VaultError::SecretNotFound { path: path.to_string() });
    }

    storage::save_vault(&data, &self.vault_file)?;
    audit::log_event(&self.audit_file, identity, "delete", Some(path), Outcome::Success, None)?;

    debug!(path, "secret deleted");
    Ok(format!("Secret deleted at {path}"))
  }

  /// Lists secret paths beginning with `prefix`, ascending.
  ///
  /// The `list` capability is evaluated against the raw prefix; an empty
  /// prefix checks the empty string, which only `**`-bearing patterns
  /// match. The audit line records `-` for an empty prefix.
  pub fn list_secrets(&self, identity: &str, prefix: &str) -> Result<Vec<String>, VaultError> {
    self.ensure_unsealed()?;

    let data = storage::load_vault(&self.vault_file)?;
    let audit_path = if prefix.is_empty() { None } else { Some(prefix) };

    if !policy::check_access(&data.policies, identity, prefix, Capability::List) {
      audit::log_event(
        &self.audit_file,
        identity,
        "list",
        audit_path,
        Outcome::Denied,
        Some("requires list"),
      )?;
      return Err(VaultError::AccessDenied {
        identity: identity.to_string(),
        path: prefix.to_string(),
        capability: "list".to_string(),
      });
    }

    // BTreeMap iteration is already ascending by path.
    let matching: Vec<String> = data
      .secrets
      .keys()
      .filter(|path| path.starts_with(prefix))
      .cloned()
      .collect();

    audit::log_event(&self.audit_file, identity, "list", audit_path, Outcome::Success, None)?;
    Ok(matching)
  }

  // -- Audit log --

  /// Returns audit log lines, optionally only the last `n`.
  pub fn audit_log(&self, last_n: Option<usize>) -> Result<Vec<String>, VaultError> {
    audit::read_log(&self.audit_file, last_n)
  }
}
