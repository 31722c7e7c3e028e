//! Remote version probe and version ordering.

use crate::error::{AgentError, Result};
use std::fmt;
use std::str::FromStr;
use tokio_util::sync::CancellationToken;

/// A dotted numeric version with two to four fields.
///
/// Ordering is field-wise lexicographic; a missing trailing field compares
/// below a present `0`, so `1.4 < 1.4.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    major: u64,
    minor: u64,
    build: Option<u64>,
    revision: Option<u64>,
}

impl Version {
    /// The version of the running build, when the build metadata parses.
    ///
    /// `None` (a pre-release tag, say) means the comparison has no baseline;
    /// callers must skip the staleness check rather than assume an ancient
    /// version.
    pub fn current() -> Option<Self> {
        env!("CARGO_PKG_VERSION").parse().ok()
    }

    /// Strict greater-than comparison against the running version.
    pub fn is_newer_than(&self, current: &Version) -> bool {
        self > current
    }
}

impl FromStr for Version {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let fields: Vec<&str> = trimmed.split('.').collect();
        if !(2..=4).contains(&fields.len()) {
            return Err(AgentError::Parse(format!(
                "expected 2-4 dotted fields, got {trimmed:?}"
            )));
        }

        let field = |i: usize| -> Result<u64> {
            fields[i].parse().map_err(|_| {
                AgentError::Parse(format!("invalid field {:?} in {trimmed:?}", fields[i]))
            })
        };

        Ok(Self {
            major: field(0)?,
            minor: field(1)?,
            build: if fields.len() > 2 { Some(field(2)?) } else { None },
            revision: if fields.len() > 3 { Some(field(3)?) } else { None },
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(build) = self.build {
            write!(f, ".{build}")?;
        }
        if let Some(revision) = self.revision {
            write!(f, ".{revision}")?;
        }
        Ok(())
    }
}

/// Resolves the latest published version from a plaintext HTTPS endpoint.
pub struct VersionOracle {
    client: reqwest::Client,
    url: String,
    timeout: std::time::Duration,
}

impl VersionOracle {
    /// Create an oracle against `url` using the shared HTTP client.
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            timeout: std::time::Duration::from_secs(20),
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Perform a single GET, trim the body, and parse it as a [`Version`].
    ///
    /// # Errors
    ///
    /// `Network` on transport or status failure, `Parse` on malformed version
    /// text, `Cancelled` when the scope fires mid-request.
    pub async fn fetch_latest(&self, cancel: &CancellationToken) -> Result<Version> {
        let request = self.client.get(&self.url).timeout(self.timeout).send();
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AgentError::Cancelled),
            r = request => r.map_err(|e| AgentError::Network(format!("version check failed: {e}")))?,
        };

        let response = response
            .error_for_status()
            .map_err(|e| AgentError::Network(format!("version endpoint rejected request: {e}")))?;

        let body = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AgentError::Cancelled),
            b = response.text() => b.map_err(|e| AgentError::Network(format!("version body unreadable: {e}")))?,
        };

        body.parse()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn strict_ordering_for_newer_versions() {
        let pairs = [
            ("1.0", "2.0"),
            ("1.9.0", "2.0.0"),
            ("1.4.1", "1.4.2"),
            ("1.4.2", "1.5.0"),
            ("1.4.2.6", "1.4.2.7"),
            ("1.4", "1.4.0"),
        ];
        for (older, newer) in pairs {
            assert!(v(newer).is_newer_than(&v(older)), "{newer} > {older}");
            assert!(!v(older).is_newer_than(&v(newer)), "{older} !> {newer}");
        }
    }

    #[test]
    fn a_version_is_never_newer_than_itself() {
        for text in ["1.0", "1.4.2", "2.0.0.1"] {
            assert!(!v(text).is_newer_than(&v(text)));
        }
    }

    #[test]
    fn parse_trims_surrounding_whitespace() {
        assert_eq!(v("  1.4.2\n"), v("1.4.2"));
    }

    #[test]
    fn parse_rejects_malformed_text() {
        for text in ["not-a-version", "", "1", "1.", "1.2.3.4.5", "1.x", "1.-2"] {
            let result: Result<Version> = text.parse();
            assert!(
                matches!(result, Err(AgentError::Parse(_))),
                "{text:?} should fail to parse"
            );
        }
    }

    #[test]
    fn display_round_trips() {
        for text in ["1.4", "1.4.2", "1.4.2.7"] {
            assert_eq!(v(text).to_string(), text);
        }
    }

    #[test]
    fn current_version_matches_the_build() {
        assert_eq!(Version::current(), Some(v(env!("CARGO_PKG_VERSION"))));
    }
}
