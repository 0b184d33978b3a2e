//! Page-context reading: which target is being attacked, and whether the
//! current browser URL is an attack page at all.
//!
//! Both checks are pure and re-evaluated on every call. Torn navigates
//! between targets without a full page reload, so callers must not cache
//! the extracted id across ticks.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Marker substring identifying the attack view within a loader URL.
const ATTACK_PAGE_MARKER: &str = "sid=attack";

static TARGET_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"user2ID=(\d+)").expect("valid target id regex"));

/// Numeric id of the player being attacked, as it appears in the
/// `user2ID` query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetId(String);

impl TargetId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("target id must be a non-empty string of digits, got {0:?}")]
pub struct ParseTargetIdError(String);

impl FromStr for TargetId {
    type Err = ParseTargetIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(TargetId(s.to_string()))
        } else {
            Err(ParseTargetIdError(s.to_string()))
        }
    }
}

/// Extract the target id from an attack-page URL, if present.
pub fn extract_target_id(url: &str) -> Option<TargetId> {
    TARGET_ID_RE
        .captures(url)
        .map(|caps| TargetId(caps[1].to_string()))
}

/// True iff the URL points at the attack view.
pub fn is_attack_page(url: &str) -> bool {
    url.contains(ATTACK_PAGE_MARKER)
}
