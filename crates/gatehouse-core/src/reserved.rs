// ── Host-reserved account names ──

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::warn;

/// Account names owned by the host operating system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservedNames {
    names: BTreeSet<String>,
}

impl ReservedNames {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse passwd(5) text: the first `:`-separated field of each line.
    pub fn parse_passwd(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .filter_map(|line| line.split(':').next())
                .filter(|name| !name.is_empty()),
        )
    }

    /// Read a passwd file. An unreadable file reserves nothing.
    pub fn from_passwd_file(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse_passwd(&text),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read passwd file");
                Self::default()
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
