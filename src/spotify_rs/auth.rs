use std::collections::HashMap;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use rand::Rng;
use sha2::{Digest, Sha256};
use url::Url;

use crate::spotify_rs::types::{OAuthSession, SpotifyAuthResponse, SpotifyTokenResponse};

const SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Scopes needed to read the user's profile, private playlists and library.
pub const SPOTIFY_SCOPES: [&str; 3] = [
    "user-library-read",
    "user-read-private",
    "playlist-read-private",
];

/// Generate a cryptographically secure random string for PKCE
fn generate_random_string(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            const CHARSET: &[u8] =
                b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";
            CHARSET[rng.random_range(0..CHARSET.len())] as char
        })
        .collect()
}

/// Generate PKCE code verifier (43-128 characters)
fn generate_code_verifier() -> String {
    generate_random_string(128)
}

/// Generate PKCE code challenge from verifier using S256 method
fn generate_code_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let hash = hasher.finalize();
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generate a random state parameter for CSRF protection
fn generate_state() -> String {
    generate_random_string(16)
}

/// Initiate Spotify OAuth flow with PKCE
/// Returns the authorization URL and creates an OAuth session
pub fn initiate_oauth(
    client_id: &str,
    redirect_uri: &str,
    scopes: &[&str],
) -> (SpotifyAuthResponse, OAuthSession) {
    let code_verifier = generate_code_verifier();
    let code_challenge = generate_code_challenge(&code_verifier);
    let state = generate_state();

    let auth_url = format!(
        "{}?client_id={}&response_type=code&redirect_uri={}&state={}&scope={}&code_challenge_method=S256&code_challenge={}",
        SPOTIFY_AUTH_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&state),
        urlencoding::encode(&scopes.join(" ")),
        code_challenge,
    );

    let session = OAuthSession {
        code_verifier,
        state: state.clone(),
    };

    let response = SpotifyAuthResponse { auth_url, state };

    (response, session)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RedirectError {
    #[error("Redirect URL is not a valid URL: {0}")]
    InvalidUrl(String),
    #[error("Authorization was denied: {0}")]
    Denied(String),
    #[error("Redirect URL has no authorization code")]
    MissingCode,
    #[error("State mismatch, possible CSRF (expected {expected}, got {actual})")]
    StateMismatch { expected: String, actual: String },
}

/// Pull the authorization code out of the URL Spotify redirected the browser to
pub fn parse_redirect(redirected_url: &str, session: &OAuthSession) -> Result<String, RedirectError> {
    let url = Url::parse(redirected_url.trim())
        .map_err(|error| RedirectError::InvalidUrl(error.to_string()))?;
    let params: HashMap<_, _> = url.query_pairs().into_owned().collect();

    if let Some(error) = params.get("error") {
        return Err(RedirectError::Denied(error.clone()));
    }

    let state = params.get("state").cloned().unwrap_or_default();
    if state != session.state {
        return Err(RedirectError::StateMismatch {
            expected: session.state.clone(),
            actual: state,
        });
    }

    params
        .get("code")
        .filter(|code| !code.is_empty())
        .cloned()
        .ok_or(RedirectError::MissingCode)
}

#[derive(Debug, thiserror::Error)]
pub enum ExchangeCodeForTokenError {
    #[error("Invalid code: {reason}")]
    InvalidCode { reason: String },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response")]
    FailedToParseResponse(reqwest::Error),
}

/// Attach client credentials to a token request. Without a secret the
/// request relies on the PKCE verifier alone.
fn with_client_auth(
    request: reqwest::RequestBuilder,
    client_id: &str,
    client_secret: Option<&str>,
) -> reqwest::RequestBuilder {
    match client_secret {
        Some(secret) => request.header(
            "Authorization",
            format!(
                "Basic {}",
                STANDARD.encode(format!("{}:{}", client_id, secret))
            ),
        ),
        None => request,
    }
}

/// Exchange authorization code for access token
/// https://developer.spotify.com/documentation/web-api/tutorials/code-pkce-flow
pub async fn exchange_code_for_token(
    client: &reqwest::Client,
    client_id: &str,
    client_secret: Option<&str>,
    code: &str,
    // Must match the redirect URI used to initiate the flow
    redirect_uri: &str,
    session: &OAuthSession,
) -> Result<SpotifyTokenResponse, ExchangeCodeForTokenError> {
    let mut params = HashMap::new();
    params.insert("grant_type", "authorization_code");
    params.insert("code", code);
    params.insert("redirect_uri", redirect_uri);
    params.insert("client_id", client_id);
    params.insert("code_verifier", session.code_verifier.as_str());

    let request = client
        .post(SPOTIFY_TOKEN_URL)
        // Serializes to x-www-form-urlencoded and sets the header, as required by spotify
        .form(&params)
        .timeout(Duration::from_secs(10));

    let response = with_client_auth(request, client_id, client_secret)
        .send()
        .await
        .map_err(ExchangeCodeForTokenError::FailedToSendRequest)?;

    if !response.status().is_success() {
        return Err(ExchangeCodeForTokenError::InvalidCode {
            reason: response
                .text()
                .await
                .unwrap_or("Failed to get error text".to_string()),
        });
    }

    response
        .json()
        .await
        .map_err(ExchangeCodeForTokenError::FailedToParseResponse)
}

#[derive(Debug, thiserror::Error)]
pub enum RefreshTokenError {
    #[error("Invalid refresh token: {reason}")]
    InvalidRefreshToken { reason: String },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(reqwest::Error),
}

/// Refresh an access token using a refresh token
pub async fn refresh_access_token(
    client: &reqwest::Client,
    client_id: &str,
    client_secret: Option<&str>,
    refresh_token: &str,
) -> Result<SpotifyTokenResponse, RefreshTokenError> {
    let mut params = HashMap::new();
    params.insert("grant_type", "refresh_token");
    params.insert("refresh_token", refresh_token);
    params.insert("client_id", client_id);

    let request = client
        .post(SPOTIFY_TOKEN_URL)
        .form(&params)
        .timeout(Duration::from_secs(10));

    let response = with_client_auth(request, client_id, client_secret)
        .send()
        .await
        .map_err(RefreshTokenError::FailedToSendRequest)?;

    if !response.status().is_success() {
        return Err(RefreshTokenError::InvalidRefreshToken {
            reason: response
                .text()
                .await
                .unwrap_or("Failed to get error text".to_string()),
        });
    }

    response
        .json()
        .await
        .map_err(RefreshTokenError::FailedToParseResponse)
}
