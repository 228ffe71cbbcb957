use std::fmt;

use crate::error::ConfigError;

/// Values shipped in config templates that must be replaced before a run.
pub const PLACEHOLDER_TOKENS: [&str; 3] = ["여기에_토큰을_입력하세요", "YOUR_HF_TOKEN", "hf_xxx"];

/// A validated hub access token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials(String);

impl Credentials {
    pub fn new(token: Option<&str>) -> Result<Self, ConfigError> {
        let token = token.map(str::trim).unwrap_or_default();

        if token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if PLACEHOLDER_TOKENS.contains(&token) {
            return Err(ConfigError::PlaceholderToken);
        }

        Ok(Credentials(token.to_string()))
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials(<redacted>)")
    }
}
