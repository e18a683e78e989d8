// ── Captive portal allowed-hostname types ──

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::entity_id::EntityId;

/// Longest hostname accepted, in ASCII-compatible form.
const MAX_HOSTNAME_LEN: usize = 253;
/// Longest single DNS label.
const MAX_LABEL_LEN: usize = 63;

/// A hostname stored in its ASCII-compatible (punycode) form.
///
/// Internationalized input is converted on [`parse`](Self::parse); the
/// human-readable Unicode form is recovered with [`display`](Self::display).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hostname(String);

/// Why a submitted hostname was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostnameError {
    /// IDNA conversion to the ASCII-compatible form failed.
    Conversion,
    /// The converted name is not a syntactically valid hostname.
    Syntax,
}

impl Hostname {
    /// Convert user input to ASCII-compatible form and check its syntax.
    pub fn parse(input: &str) -> Result<Self, HostnameError> {
        let ascii = to_ascii(input).ok_or(HostnameError::Conversion)?;
        if is_hostname(&ascii) {
            Ok(Self(ascii))
        } else {
            Err(HostnameError::Syntax)
        }
    }

    /// The stored ASCII-compatible form.
    pub fn as_ascii(&self) -> &str {
        &self.0
    }

    /// The Unicode form shown to operators.
    pub fn display(&self) -> String {
        to_display(&self.0)
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// IDNA to-ASCII conversion of raw input. `None` when conversion fails.
pub fn to_ascii(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    idna::domain_to_ascii(trimmed).ok()
}

/// Best-effort Unicode rendering of an ASCII-compatible name.
///
/// Falls back to the input unchanged when it holds no decodable labels.
pub fn to_display(ascii: &str) -> String {
    let (unicode, result) = idna::domain_to_unicode(ascii);
    if result.is_ok() { unicode } else { ascii.to_owned() }
}

/// Hostname syntax: dot-separated labels of `[a-z0-9_-]`, no label starting
/// or ending with `-`, at most one trailing dot, and never a bare label
/// directly under the root (`host.`).
pub fn is_hostname(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_HOSTNAME_LEN {
        return false;
    }

    let (body, rooted) = match name.strip_suffix('.') {
        Some(stripped) => (stripped, true),
        None => (name, false),
    };
    if body.is_empty() {
        return false;
    }

    let labels: Vec<&str> = body.split('.').collect();
    if rooted && labels.len() == 1 {
        return false;
    }

    labels.iter().all(|label| is_label(label))
}

fn is_label(label: &str) -> bool {
    if label.is_empty() || label.len() > MAX_LABEL_LEN {
        return false;
    }
    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }
    label
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

// ── Direction ───────────────────────────────────────────────────────

/// Which unauthenticated traffic the entry exempts from the portal.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Direction {
    /// Traffic in both directions.
    #[default]
    Both,
    /// Traffic originating from the hostname.
    From,
    /// Traffic from any client behind the portal to the hostname.
    To,
}

impl Direction {
    /// Label used in selection lists.
    pub fn label(self) -> &'static str {
        match self {
            Self::Both => "Both",
            Self::From => "From",
            Self::To => "To",
        }
    }
}

// ── AllowedHostname ─────────────────────────────────────────────────

/// A hostname that bypasses captive-portal authentication inside a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedHostname {
    pub id: EntityId,
    pub hostname: Hostname,
    #[serde(default)]
    pub dir: Direction,
    /// Subnet qualifier in prefix bits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sn: Option<u8>,
    /// Upload cap in Kbit/s.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bw_up: Option<u32>,
    /// Download cap in Kbit/s.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bw_down: Option<u32>,
    #[serde(default)]
    pub descr: String,
}

impl AllowedHostname {
    /// Sort key: the Unicode display form.
    pub fn sort_key(&self) -> String {
        self.hostname.display()
    }
}
