use serde::{Deserialize, Serialize};

/// Spotify OAuth token response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: String,
}

/// Spotify user profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyUser {
    pub id: String,
    pub display_name: Option<String>,
}

/// Generic paging object returned by every listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u32,
}

/// Simplified playlist from `/me/playlists`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyPlaylist {
    pub id: String,
    pub name: String,
    pub owner: SpotifyPlaylistOwner,
    #[serde(default)]
    pub collaborative: bool,
    pub tracks: SpotifyPlaylistTracks,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyPlaylistOwner {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyPlaylistTracks {
    pub total: u32,
}

/// Entry of a playlist; `track` is null for removed or unavailable items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyPlaylistItem {
    pub track: Option<SpotifyTrack>,
}

/// Entry of the saved tracks library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifySavedTrack {
    pub added_at: Option<String>,
    pub track: SpotifyTrack,
}

/// Entry of the saved albums library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifySavedAlbum {
    pub added_at: Option<String>,
    pub album: SpotifyAlbum,
}

/// Spotify track from API. Local files carry no id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyTrack {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    #[serde(default)]
    pub is_local: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyArtist {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyAlbum {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
}

/// PKCE OAuth session data
#[derive(Debug, Clone)]
pub struct OAuthSession {
    pub code_verifier: String,
    pub state: String,
}

/// Response for authentication initiation
#[derive(Debug, Clone)]
pub struct SpotifyAuthResponse {
    pub auth_url: String,
    pub state: String,
}
