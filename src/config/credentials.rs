//! Credential handling for backend connections.
//!
//! Keeps passwords and connection-string secrets out of `Debug` output
//! and log lines.

use super::types::OpenSearchConfig;

const MASK: &str = "••••••••";

/// Wrapper for sensitive strings that prevents accidental logging.
///
/// The inner value is never exposed via Debug or Display traits.
/// Use `expose()` to access the actual value when needed for requests.
#[derive(Clone)]
pub struct SecureString(String);

impl SecureString {
    /// Create a new secure string.
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Expose the inner value.
    ///
    /// Use sparingly and only when actually sending to a backend.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecureString({})", MASK)
    }
}

impl std::fmt::Display for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", MASK)
    }
}

/// Username/password pair for HTTP basic auth.
#[derive(Debug, Clone)]
pub struct BasicCredentials {
    pub username: String,
    pub password: SecureString,
}

impl OpenSearchConfig {
    /// Resolve the basic-auth pair.
    ///
    /// An empty username means the cluster is reached without credentials.
    pub fn credentials(&self) -> Option<BasicCredentials> {
        if self.username.is_empty() {
            return None;
        }
        Some(BasicCredentials {
            username: self.username.clone(),
            password: SecureString::new(self.password.clone()),
        })
    }
}

/// Mask the userinfo part of a connection string.
///
/// `mongodb://user:pw@host/db` becomes `mongodb://••••••••@host/db`.
/// Strings without userinfo are returned unchanged.
pub fn redact_uri(uri: &str) -> String {
    let Some(scheme_end) = uri.find("://") else {
        return uri.to_string();
    };
    let rest_start = scheme_end + 3;
    let authority_end = uri[rest_start..]
        .find(['/', '?'])
        .map(|i| rest_start + i)
        .unwrap_or(uri.len());

    match uri[rest_start..authority_end].rfind('@') {
        Some(at) => format!(
            "{}{}{}",
            &uri[..rest_start],
            MASK,
            &uri[rest_start + at..]
        ),
        None => uri.to_string(),
    }
}
