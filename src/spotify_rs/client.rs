use std::time::Duration;

use color_eyre::Result;
use serde::de::DeserializeOwned;

use crate::spotify_rs::types::{
    Paging, SpotifyPlaylist, SpotifyPlaylistItem, SpotifySavedAlbum, SpotifySavedTrack,
    SpotifyUser,
};

const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

/// Maximum number of ids `/me/tracks/contains` accepts per call
pub const MAX_CONTAINS_IDS: usize = 50;

/// Spotify API client
pub struct SpotifyClient {
    access_token: String,
    client: reqwest::Client,
}

impl SpotifyClient {
    pub fn new(client: reqwest::Client, access_token: String) -> Self {
        Self {
            access_token,
            client,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        log::debug!("GET {} {:?}", url, query);
        let response = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(&self.access_token)
            .timeout(Duration::from_secs(10))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        url: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Paging<T>> {
        self.get_json(
            url,
            &[("offset", offset.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    /// Get the current user's profile
    pub async fn get_current_user(&self) -> Result<SpotifyUser> {
        self.get_json(&format!("{}/me", SPOTIFY_API_URL), &[]).await
    }

    /// Get one page of the current user's playlists (owned and followed)
    pub async fn get_user_playlists_page(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Paging<SpotifyPlaylist>> {
        self.get_page(&format!("{}/me/playlists", SPOTIFY_API_URL), offset, limit)
            .await
    }

    /// Get one page of the items in a playlist
    pub async fn get_playlist_items_page(
        &self,
        playlist_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Paging<SpotifyPlaylistItem>> {
        self.get_page(
            &format!("{}/playlists/{}/tracks", SPOTIFY_API_URL, playlist_id),
            offset,
            limit,
        )
        .await
    }

    /// Get one page of the user's saved tracks
    pub async fn get_saved_tracks_page(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Paging<SpotifySavedTrack>> {
        self.get_page(&format!("{}/me/tracks", SPOTIFY_API_URL), offset, limit)
            .await
    }

    /// Get one page of the user's saved albums
    pub async fn get_saved_albums_page(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Paging<SpotifySavedAlbum>> {
        self.get_page(&format!("{}/me/albums", SPOTIFY_API_URL), offset, limit)
            .await
    }

    /// Check whether each track id is in the user's saved tracks.
    /// The answer has the same order as `track_ids`.
    pub async fn check_saved_tracks(&self, track_ids: &[String]) -> Result<Vec<bool>> {
        if track_ids.is_empty() {
            return Ok(Vec::new());
        }
        if track_ids.len() > MAX_CONTAINS_IDS {
            return Err(color_eyre::eyre::eyre!(
                "At most {} track ids can be checked at once, got {}",
                MAX_CONTAINS_IDS,
                track_ids.len()
            ));
        }

        self.get_json(
            &format!("{}/me/tracks/contains", SPOTIFY_API_URL),
            &[("ids", track_ids.join(","))],
        )
        .await
    }
}
