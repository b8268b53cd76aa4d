use std::path::Path;

use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use serde::{Deserialize, Serialize};

use crate::spotify_rs::types::SpotifyTokenResponse;

/// Seconds before the real expiry at which a token is already treated as stale
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Token persisted between runs so the browser round trip only happens once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub scope: String,
    /// Unix timestamp (seconds)
    pub expires_at: i64,
}

impl CachedToken {
    /// Spotify may omit the refresh token on refresh; keep the old one then.
    pub fn from_response(
        response: SpotifyTokenResponse,
        previous_refresh_token: Option<String>,
        now: i64,
    ) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh_token),
            scope: response.scope,
            expires_at: now + response.expires_in as i64,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now + EXPIRY_MARGIN_SECS >= self.expires_at
    }

    /// Whether every scope in `required` was granted to this token
    pub fn covers_scopes(&self, required: &[&str]) -> bool {
        let granted: Vec<&str> = self.scope.split_whitespace().collect();
        required.iter().all(|scope| granted.contains(scope))
    }
}

/// Read the cached token, `None` when nothing has been cached yet
pub fn load(path: &Path) -> Result<Option<CachedToken>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read token cache: {}", path.display()))?;
    let token = serde_json::from_str(&contents)
        .wrap_err_with(|| format!("Failed to parse token cache: {}", path.display()))?;
    Ok(Some(token))
}

pub fn store(path: &Path, token: &CachedToken) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).wrap_err_with(|| {
            format!("Failed to create token cache directory: {}", parent.display())
        })?;
    }

    let contents = serde_json::to_string_pretty(token).wrap_err("Failed to serialize token")?;
    std::fs::write(path, contents)
        .wrap_err_with(|| format!("Failed to write token cache: {}", path.display()))
}
