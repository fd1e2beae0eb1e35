//! Vault and session persistence.
//!
//! The vault document is serialized as JSON (binary fields base64-coded by
//! the model layer) and replaced atomically: write to a temp file in the
//! same directory, fsync, then rename over the target. A reader therefore
//! sees either the previous committed document or the new one, never a
//! truncated file.
//!
//! The session slot is a sibling file holding the hex-encoded root key
//! while the vault is unsealed; its absence is the canonical signal of
//! sealed state.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use zeroize::{Zeroize, Zeroizing};

use crate::error::VaultError;
use crate::models::{VaultData, KEY_LEN};

/// Returns true if the vault file exists on disk.
pub fn vault_file_exists(vault_file: &Path) -> bool {
  vault_file.exists()
}

/// Serializes and writes the vault document atomically.
///
/// The temp file is created in the vault file's directory so the final
/// rename stays on one filesystem. On any error the temp file is removed
/// (the guard cleans up on drop) and the previous document is untouched.
pub fn save_vault(data: &VaultData, vault_file: &Path) -> Result<(), VaultError> {
  let dir = match vault_file.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };

  let json = serde_json::to_vec_pretty(data)?;

  let mut tmp = NamedTempFile::new_in(dir)?;
  tmp.write_all(&json)?;
  tmp.as_file().sync_all()?;
  tmp.persist(vault_file).map_err(|e| VaultError::Io(e.error))?;
  Ok(())
}

/// Reads and deserializes the vault document.
///
/// # Errors
///
/// A missing file is reported as [`VaultError::VaultNotFound`], distinct
/// from malformed content ([`VaultError::Malformed`]).
pub fn load_vault(vault_file: &Path) -> Result<VaultData, VaultError> {
  let raw = match fs::read_to_string(vault_file) {
    Ok(raw) => raw,
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      return Err(VaultError::VaultNotFound { path: vault_file.to_path_buf() });
    }
    Err(e) => return Err(e.into()),
  };

  let data: VaultData = serde_json::from_str(&raw)?;
  Ok(data)
}

/// Writes the hex-encoded root key to the session file.
pub fn save_session(session_file: &Path, root_key: &[u8; KEY_LEN]) -> Result<(), VaultError> {
  let mut encoded = hex::encode(root_key);
  let result = fs::write(session_file, &encoded);
  encoded.zeroize();
  result?;
  Ok(())
}

/// Reads the root key from the session file.
///
/// Returns `None` when the session file is absent - the vault is sealed.
pub fn load_session(session_file: &Path) -> Result<Option<Zeroizing<[u8; KEY_LEN]>>, VaultError> {
  let raw = match fs::read_to_string(session_file) {
    Ok(raw) => raw,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
    Err(e) => return Err(e.into()),
  };

  let mut bytes = hex::decode(raw.trim()).map_err(|_| VaultError::MalformedSession)?;
  if bytes.len() != KEY_LEN {
    bytes.zeroize();
    return Err(VaultError::MalformedSession);
  }

  let mut key = [0u8; KEY_LEN];
  key.copy_from_slice(&bytes);
  bytes.zeroize();
  Ok(Some(Zeroizing::new(key)))
}

/// Deletes the session file if present; a no-op when already sealed.
pub fn delete_session(session_file: &Path) -> Result<(), VaultError> {
  match fs::remove_file(session_file) {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(e.into()),
  }
}
