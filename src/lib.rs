//! Secret Management Vault - core library.
//!
//! A local, file-backed secret vault. Opaque textual secrets live under
//! hierarchical paths, protected by a two-layer envelope scheme rooted in
//! a master passphrase; every operation is mediated by a path-based
//! access-control policy and recorded in an append-only audit log.
//!
//! # Architecture
//!
//! ```text
//! CLI (clap)
//!     │
//!     ▼
//! vault.rs ────── orchestrator: lifecycle, envelope workflows,
//!     │           versioning, mediation, audit ordering
//!     ├──▶ policy.rs ── path validation, glob matching, default deny
//!     ├──▶ audit.rs ─── append-only pipe-separated event log
//!     ├──▶ crypto.rs ── PBKDF2-HMAC-SHA256, AES-256-GCM, CSPRNG
//!     └──▶ storage.rs ─ atomic vault file + session slot
//!               │
//!               ▼
//!          Disk ── vault.enc (JSON, base64 binary fields)
//!                  vault.enc.session (hex root key while unsealed)
//!                  audit.log (append-only)
//! ```
//!
//! # Security Features
//!
//! - **PBKDF2-HMAC-SHA256** root-key derivation (600,000 iterations)
//! - **AES-256-GCM** envelope encryption: value under a fresh DEK,
//!   DEK under the root key
//! - **Verification token** to detect a wrong passphrase without storing
//!   key material
//! - **Zeroize** for keys, DEKs, and decrypted values
//! - **Default-deny** path-glob policies and a tamper-evident audit trail

pub mod audit;
pub mod cli;
pub mod crypto;
pub mod error;
pub mod models;
pub mod policy;
pub mod storage;
pub mod vault;

pub use error::VaultError;
pub use vault::{SealStatus, SecretRecord, Vault};
