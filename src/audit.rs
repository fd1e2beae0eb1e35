//! Append-only audit log.
//!
//! Each event is one line of pipe-separated fields:
//!
//! ```text
//! <iso8601-utc> | <identity> | <operation> | <path-or-dash> | <outcome> [ | <detail> ]
//! ```
//!
//! The core only ever appends; the file is never truncated or rewritten.
//! Reading exists for diagnostics (`audit-log`), not for correctness.

use chrono::{SecondsFormat, Utc};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::error::VaultError;

/// Terminal outcome of an audited operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
  Success,
  Denied,
  Error,
}

impl fmt::Display for Outcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Outcome::Success => "success",
      Outcome::Denied => "denied",
      Outcome::Error => "error",
    })
  }
}

/// Appends a single audit entry.
///
/// `identity` is `system` for lifecycle events and the caller identity
/// otherwise. `path` is `None` when the operation has no target, rendered
/// as `-`. The timestamp is taken at call time, UTC with offset.
pub fn log_event(
  audit_file: &Path,
  identity: &str,
  operation: &str,
  path: Option<&str>,
  outcome: Outcome,
  detail: Option<&str>,
) -> Result<(), VaultError> {
  let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false);
  let mut line = format!(
    "{timestamp} | {identity} | {operation} | {} | {outcome}",
    path.unwrap_or("-")
  );
  if let Some(detail) = detail {
    line.push_str(" | ");
    line.push_str(detail);
  }

  let mut file = OpenOptions::new().create(true).append(true).open(audit_file)?;
  writeln!(file, "{line}")?;
  Ok(())
}

/// Reads audit entries, optionally only the last `n`.
///
/// Blank lines are skipped. A missing file is a distinct error from an
/// unreadable one.
pub fn read_log(audit_file: &Path, last_n: Option<usize>) -> Result<Vec<String>, VaultError> {
  let raw = match fs::read_to_string(audit_file) {
    Ok(raw) => raw,
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      return Err(VaultError::AuditNotFound { path: audit_file.to_path_buf() });
    }
    Err(e) => return Err(e.into()),
  };

  let lines: Vec<String> = raw
    .lines()
    .filter(|line| !line.trim().is_empty())
    .map(str::to_string)
    .collect();

  match last_n {
    Some(n) if n > 0 && lines.len() > n => Ok(lines[lines.len() - n..].to_vec()),
    _ => Ok(lines),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn entry_format_with_and_without_detail() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("audit.log");

    log_event(&file, "system", "init", None, Outcome::Success, None).expect("log");
    log_event(&file, "admin", "store", Some("app/key"), Outcome::Denied, Some("requires write"))
      .expect("log");

    let lines = read_log(&file, None).expect("read");
    assert_eq!(lines.len(), 2);

    let first: Vec<&str> = lines[0].split(" | ").collect();
    assert_eq!(&first[1..], &["system", "init", "-", "success"]);
    // ISO-8601 timestamp with an explicit UTC offset.
    assert!(first[0].contains('T'));
    assert!(first[0].ends_with("+00:00"));

    let second: Vec<&str> = lines[1].split(" | ").collect();
    assert_eq!(&second[1..], &["admin", "store", "app/key", "denied", "requires write"]);
  }

  #[test]
  fn last_n_returns_the_tail() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("audit.log");

    for i in 0..5 {
      log_event(&file, "admin", "store", Some(&format!("p/{i}")), Outcome::Success, None)
        .expect("log");
    }

    let tail = read_log(&file, Some(2)).expect("read");
    assert_eq!(tail.len(), 2);
    assert!(tail[0].contains("p/3"));
    assert!(tail[1].contains("p/4"));

    // Asking for more than exists returns everything.
    assert_eq!(read_log(&file, Some(50)).expect("read").len(), 5);
  }

  #[test]
  fn missing_file_is_a_distinct_error() {
    let dir = tempdir().unwrap();
    let err = read_log(&dir.path().join("absent.log"), None).unwrap_err();
    assert!(matches!(err, VaultError::AuditNotFound { .. }));
  }
}
