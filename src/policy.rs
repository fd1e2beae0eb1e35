//! Path-based access control.
//!
//! Three concerns live here: syntactic validation of secret paths,
//! glob matching for policy patterns (`*` within a segment, `**` across
//! segments), and default-deny capability evaluation over the policy
//! list stored in the vault document.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::VaultError;
use crate::models::{Capability, Policy};

static PATH_RE: Lazy<Regex> =
  Lazy::new(|| Regex::new("^[A-Za-z0-9_-]+(/[A-Za-z0-9_-]+)*$").expect("path regex compiles"));

/// Returns true if `path` is one or more `[A-Za-z0-9_-]+` segments joined
/// by single forward slashes.
///
/// Empty strings, leading/trailing slashes, consecutive slashes, and any
/// character outside the segment alphabet are all invalid.
pub fn validate_path(path: &str) -> bool {
  PATH_RE.is_match(path)
}

/// Parses capability names in caller order.
///
/// The error names the first offending capability so the caller can
/// report it verbatim.
pub fn parse_capabilities(raw: &[String]) -> Result<Vec<Capability>, VaultError> {
  raw.iter().map(|name| name.parse()).collect()
}

/// Returns true if `path` matches the glob `pattern`.
///
/// - `**` matches any sequence of characters, slashes included; a lone
///   `**` matches every path and the empty string.
/// - `*` matches within a single segment only.
/// - Everything else matches literally; the pattern is anchored at both
///   ends.
///
/// The pattern is lowered to a regex: split at `**`, escape each literal
/// fragment, rejoin `*`-separated fragments with `[^/]*` and the `**`
/// pieces with `.*`.
pub fn match_path_pattern(pattern: &str, path: &str) -> bool {
  if pattern == "**" {
    return true;
  }

  let pieces: Vec<String> = pattern
    .split("**")
    .map(|piece| {
      piece
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("[^/]*")
    })
    .collect();

  let full = format!("^{}$", pieces.join(".*"));
  match Regex::new(&full) {
    Ok(re) => re.is_match(path),
    // Everything non-literal is escaped above, so this cannot trip;
    // deny rather than grant if it ever does.
    Err(_) => false,
  }
}

/// Evaluates the policy list for `identity` performing `capability` on
/// `path`.
///
/// Default deny: at least one policy must match identity (exact),
/// capability (membership), and path (glob). Policies are scanned in
/// insertion order and the first grant wins; there are no deny rules.
pub fn check_access(policies: &[Policy], identity: &str, path: &str, capability: Capability) -> bool {
  policies.iter().any(|policy| {
    policy.identity == identity
      && policy.capabilities.contains(&capability)
      && match_path_pattern(&policy.path_pattern, path)
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn policy(identity: &str, pattern: &str, caps: &[Capability]) -> Policy {
    Policy {
      identity: identity.to_string(),
      path_pattern: pattern.to_string(),
      capabilities: caps.to_vec(),
    }
  }

  #[test]
  fn accepts_valid_paths() {
    for path in ["a", "a/b", "app-a/db_1/password", "A/B-c/d_e", "0/1/2"] {
      assert!(validate_path(path), "expected valid: {path}");
    }
  }

  #[test]
  fn rejects_invalid_paths() {
    for path in ["", "/a", "a/", "a//b", "a b", "a/b.c", "a/*", "ä", "/"] {
      assert!(!validate_path(path), "expected invalid: {path}");
    }
  }

  #[test]
  fn double_star_matches_everything() {
    for path in ["", "a", "a/b/c", "deeply/nested/path/here"] {
      assert!(match_path_pattern("**", path), "** should match {path:?}");
    }
  }

  #[test]
  fn single_star_stays_within_a_segment() {
    assert!(match_path_pattern("a/*", "a/b"));
    assert!(!match_path_pattern("a/*", "a/b/c"));
    assert!(match_path_pattern("production/*/credentials", "production/web/credentials"));
    assert!(match_path_pattern("production/*/credentials", "production/cache/credentials"));
    assert!(!match_path_pattern("production/*/credentials", "production/web/config"));
    assert!(!match_path_pattern("production/*/credentials", "production/web/db/credentials"));
  }

  #[test]
  fn double_star_spans_segments() {
    assert!(match_path_pattern("a/**", "a/b/c"));
    assert!(match_path_pattern("app-a/**", "app-a/db/password"));
    assert!(!match_path_pattern("app-a/**", "app-b/db/password"));
  }

  #[test]
  fn literals_are_anchored_and_escaped() {
    assert!(match_path_pattern("a/b", "a/b"));
    assert!(!match_path_pattern("a/b", "a/b/c"));
    assert!(!match_path_pattern("a/b", "x/a/b"));
    // A dot in a pattern is a literal dot, not a regex wildcard.
    assert!(!match_path_pattern("a.b", "axb"));
  }

  #[test]
  fn parse_capabilities_reports_first_offender() {
    let raw: Vec<String> = ["read", "execute", "bogus"].iter().map(|s| s.to_string()).collect();
    let err = parse_capabilities(&raw).unwrap_err();
    assert!(matches!(err, VaultError::InvalidCapability { ref capability } if capability == "execute"));

    let ok = parse_capabilities(&["write".to_string(), "delete".to_string()]).unwrap();
    assert_eq!(ok, vec![Capability::Write, Capability::Delete]);
  }

  #[test]
  fn default_deny_without_a_matching_policy() {
    let policies = vec![policy("service-a", "app-a/**", &[Capability::Read])];

    // Unknown identity.
    assert!(!check_access(&policies, "service-b", "app-a/x", Capability::Read));
    // Capability not granted.
    assert!(!check_access(&policies, "service-a", "app-a/x", Capability::Write));
    // Path outside the pattern.
    assert!(!check_access(&policies, "service-a", "app-b/x", Capability::Read));
    // Empty policy list.
    assert!(!check_access(&[], "service-a", "app-a/x", Capability::Read));
  }

  #[test]
  fn any_matching_policy_grants() {
    let policies = vec![
      policy("service-a", "app-a/**", &[Capability::Read]),
      policy("service-a", "shared/*", &[Capability::Read, Capability::Write]),
    ];
    assert!(check_access(&policies, "service-a", "app-a/db/password", Capability::Read));
    assert!(check_access(&policies, "service-a", "shared/config", Capability::Write));
  }

  #[test]
  fn empty_prefix_only_matches_double_star_patterns() {
    let wide = vec![policy("admin", "**", &[Capability::List])];
    let narrow = vec![policy("admin", "app/*", &[Capability::List])];
    assert!(check_access(&wide, "admin", "", Capability::List));
    assert!(!check_access(&narrow, "admin", "", Capability::List));
  }
}
