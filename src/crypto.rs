//! Cryptographic primitives for the vault.
//!
//! This module handles all cryptographic operations:
//! - Key derivation using PBKDF2-HMAC-SHA256
//! - Encryption/decryption using AES-256-GCM (AEAD cipher)
//! - Random salt and data-encryption-key (DEK) generation
//!
//! # Security
//!
//! - **KDF**: PBKDF2-HMAC-SHA256, 600,000 iterations at init time
//! - **Cipher**: AES-256-GCM, fresh random 12-byte nonce per encryption,
//!   empty associated data, 16-byte tag appended to the ciphertext
//! - **Entropy**: `OsRng` (the OS CSPRNG) for salts, nonces, and DEKs
//! - **Memory Safety**: derived keys and DEKs are handed out in
//!   [`Zeroizing`] wrappers so they are wiped on drop

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::VaultError;
use crate::models::{KEY_LEN, NONCE_LEN, SALT_LEN};

/// Generates a random 16-byte salt for key derivation.
///
/// The salt is unique per vault and stored alongside the ciphertext.
pub fn generate_salt() -> [u8; SALT_LEN] {
  let mut salt = [0u8; SALT_LEN];
  OsRng.fill_bytes(&mut salt);
  salt
}

/// Generates a fresh 256-bit data-encryption key.
///
/// One DEK is drawn per secret version and never reused.
pub fn generate_dek() -> Zeroizing<[u8; KEY_LEN]> {
  let mut dek = [0u8; KEY_LEN];
  OsRng.fill_bytes(&mut dek);
  Zeroizing::new(dek)
}

/// Derives a 256-bit root key from the master password.
///
/// Pure with respect to its inputs: the same password, salt, and
/// iteration count always produce the same key. The iteration floor
/// (600,000) is enforced by the init path, not here; the primitive
/// accepts any positive value so tests can run with a cheap work factor.
pub fn derive_root_key(password: &str, salt: &[u8], iterations: u32) -> Zeroizing<[u8; KEY_LEN]> {
  let mut key = [0u8; KEY_LEN];
  pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
  Zeroizing::new(key)
}

/// Encrypts plaintext with AES-256-GCM under the given key.
///
/// A random 12-byte nonce is drawn internally; the returned ciphertext
/// includes the 16-byte authentication tag.
pub fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<([u8; NONCE_LEN], Vec<u8>), VaultError> {
  let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

  let mut nonce = [0u8; NONCE_LEN];
  OsRng.fill_bytes(&mut nonce);

  let ciphertext = cipher
    .encrypt(Nonce::from_slice(&nonce), plaintext)
    .map_err(|_| VaultError::Encryption)?;

  Ok((nonce, ciphertext))
}

/// Decrypts AES-256-GCM ciphertext with the given key and nonce.
///
/// # Errors
///
/// Returns [`VaultError::Decryption`] when the authentication tag does
/// not verify (wrong key or tampered data). No partial plaintext is ever
/// returned; callers are expected to zeroize the result when it holds
/// key material or secret values.
pub fn decrypt(key: &[u8; KEY_LEN], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, VaultError> {
  if nonce.len() != NONCE_LEN {
    return Err(VaultError::Decryption);
  }

  let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
  cipher
    .decrypt(Nonce::from_slice(nonce), ciphertext)
    .map_err(|_| VaultError::Decryption)
}

#[cfg(test)]
mod tests {
  use super::*;

  // Keep test derivations cheap; the production count lives in models.
  const TEST_ITERATIONS: u32 = 1_000;

  #[test]
  fn roundtrip_encrypt_decrypt() {
    let key = generate_dek();
    let (nonce, ciphertext) = encrypt(&key, b"hello vault").expect("encrypt");
    assert_ne!(ciphertext.as_slice(), b"hello vault");

    let plaintext = decrypt(&key, &nonce, &ciphertext).expect("decrypt");
    assert_eq!(plaintext, b"hello vault");
  }

  #[test]
  fn wrong_key_fails_decryption() {
    let key = generate_dek();
    let other = generate_dek();
    let (nonce, ciphertext) = encrypt(&key, b"secret").expect("encrypt");

    let err = decrypt(&other, &nonce, &ciphertext).unwrap_err();
    assert!(matches!(err, VaultError::Decryption));
  }

  #[test]
  fn tampered_ciphertext_fails_decryption() {
    let key = generate_dek();
    let (nonce, mut ciphertext) = encrypt(&key, b"secret").expect("encrypt");
    ciphertext[0] ^= 0x01;

    let err = decrypt(&key, &nonce, &ciphertext).unwrap_err();
    assert!(matches!(err, VaultError::Decryption));
  }

  #[test]
  fn bad_nonce_length_is_rejected() {
    let key = generate_dek();
    let (_, ciphertext) = encrypt(&key, b"secret").expect("encrypt");
    let err = decrypt(&key, &[0u8; 8], &ciphertext).unwrap_err();
    assert!(matches!(err, VaultError::Decryption));
  }

  #[test]
  fn derivation_is_deterministic_per_inputs() {
    let salt = generate_salt();
    let a = derive_root_key("correct horse battery staple", &salt, TEST_ITERATIONS);
    let b = derive_root_key("correct horse battery staple", &salt, TEST_ITERATIONS);
    assert_eq!(*a, *b);

    let other_salt = generate_salt();
    let c = derive_root_key("correct horse battery staple", &other_salt, TEST_ITERATIONS);
    assert_ne!(*a, *c);

    let d = derive_root_key("different password", &salt, TEST_ITERATIONS);
    assert_ne!(*a, *d);
  }

  #[test]
  fn nonces_are_fresh_per_encryption() {
    let key = generate_dek();
    let (n1, c1) = encrypt(&key, b"same plaintext").expect("encrypt");
    let (n2, c2) = encrypt(&key, b"same plaintext").expect("encrypt");
    assert_ne!(n1, n2);
    assert_ne!(c1, c2);
  }
}
