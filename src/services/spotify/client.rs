use std::io::{BufRead, Write};
use std::path::Path;

use color_eyre::eyre::{Result, WrapErr, eyre};

use crate::ports::spotify::{
    Page, SpotifyApiAlbum, SpotifyApiPlaylist, SpotifyApiTrack, SpotifyApiUser, SpotifyClient,
};
use crate::spotify_rs::auth::{
    SPOTIFY_SCOPES, exchange_code_for_token, initiate_oauth, parse_redirect, refresh_access_token,
};
use crate::spotify_rs::client::SpotifyClient as SpotifyRsClient;
use crate::spotify_rs::token_cache::{self, CachedToken};
use crate::spotify_rs::types::{Paging, SpotifyAlbum, SpotifyTrack};

#[derive(Debug, Clone)]
pub struct SpotifyApiCredentials {
    client_id: String,
    client_secret: Option<String>,
    redirect_uri: String,
}

impl SpotifyApiCredentials {
    pub fn new(client_id: String, client_secret: Option<String>, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
        }
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }
}

/// Get a usable access token: from the cache, by refreshing the cached one,
/// or by walking the user through the browser authorization.
pub async fn obtain_access_token<R: BufRead, W: Write>(
    http: &reqwest::Client,
    credentials: &SpotifyApiCredentials,
    cache_path: &Path,
    input: &mut R,
    output: &mut W,
) -> Result<String> {
    let now = chrono::Utc::now().timestamp();

    match token_cache::load(cache_path) {
        Ok(Some(cached)) if cached.covers_scopes(&SPOTIFY_SCOPES) => {
            if !cached.is_expired(now) {
                log::debug!("Using cached spotify token");
                return Ok(cached.access_token);
            }

            if let Some(refresh_token) = cached.refresh_token.clone() {
                log::debug!("Cached spotify token expired, refreshing");
                match refresh_access_token(
                    http,
                    credentials.client_id(),
                    credentials.client_secret(),
                    &refresh_token,
                )
                .await
                {
                    Ok(response) => {
                        let token = CachedToken::from_response(response, Some(refresh_token), now);
                        store_token(cache_path, &token);
                        return Ok(token.access_token);
                    }
                    Err(error) => {
                        log::warn!("Failed to refresh spotify token, re-authorizing: {}", error)
                    }
                }
            }
        }
        Ok(Some(_)) => log::info!("Cached spotify token lacks required scopes, re-authorizing"),
        Ok(None) => log::debug!("No cached spotify token at {}", cache_path.display()),
        Err(error) => log::warn!("Ignoring unreadable token cache: {:?}", error),
    }

    let (auth, session) = initiate_oauth(
        credentials.client_id(),
        credentials.redirect_uri(),
        &SPOTIFY_SCOPES,
    );

    writeln!(output, "Open this URL in your browser to authorize access:")?;
    writeln!(output, "{}", auth.auth_url)?;
    writeln!(output)?;
    write!(output, "Paste the URL you were redirected to: ")?;
    output.flush()?;

    let mut redirected = String::new();
    if input.read_line(&mut redirected)? == 0 {
        return Err(eyre!("No redirect URL entered"));
    }

    let code = parse_redirect(&redirected, &session)?;
    let response = exchange_code_for_token(
        http,
        credentials.client_id(),
        credentials.client_secret(),
        &code,
        credentials.redirect_uri(),
        &session,
    )
    .await
    .wrap_err("Failed to exchange authorization code")?;

    let token = CachedToken::from_response(response, None, chrono::Utc::now().timestamp());
    store_token(cache_path, &token);
    Ok(token.access_token)
}

/// A token that can't be cached only costs another browser round trip next run
fn store_token(cache_path: &Path, token: &CachedToken) {
    if let Err(error) = token_cache::store(cache_path, token) {
        log::warn!("Failed to cache spotify token: {:?}", error);
    }
}

/// `raw_len` counts the entries Spotify returned, before any were filtered out
fn page_from<W, T>(paging: &Paging<W>, raw_len: usize, items: Vec<T>) -> Page<T> {
    let next_offset = match paging.next {
        Some(_) if raw_len > 0 => Some(paging.offset + raw_len as u32),
        _ => None,
    };

    Page {
        items,
        offset: paging.offset,
        total: paging.total,
        next_offset,
    }
}

fn to_api_track(track: SpotifyTrack) -> SpotifyApiTrack {
    let is_local = track.is_local;
    SpotifyApiTrack {
        id: track.id.filter(|_| !is_local),
        name: track.name,
        artists: track.artists.into_iter().map(|artist| artist.name).collect(),
        is_local,
    }
}

fn to_api_album(album: SpotifyAlbum) -> SpotifyApiAlbum {
    SpotifyApiAlbum {
        id: album.id,
        name: album.name,
        artists: album.artists.into_iter().map(|artist| artist.name).collect(),
    }
}

/// Production implementation of the `SpotifyClient` port.
pub struct SpotifyHttpAdapter {
    client: SpotifyRsClient,
}

impl SpotifyHttpAdapter {
    pub fn new(http: reqwest::Client, access_token: String) -> Self {
        Self {
            client: SpotifyRsClient::new(http, access_token),
        }
    }
}

#[async_trait::async_trait]
impl SpotifyClient for SpotifyHttpAdapter {
    async fn current_user(&self) -> Result<SpotifyApiUser> {
        let user = self.client.get_current_user().await?;
        Ok(SpotifyApiUser {
            id: user.id,
            display_name: user.display_name,
        })
    }

    async fn current_user_playlists(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Page<SpotifyApiPlaylist>> {
        let mut paging = self.client.get_user_playlists_page(offset, limit).await?;
        let raw_len = paging.items.len();
        let items = std::mem::take(&mut paging.items)
            .into_iter()
            .map(|playlist| SpotifyApiPlaylist {
                id: playlist.id,
                name: playlist.name,
                owner_id: playlist.owner.id,
                collaborative: playlist.collaborative,
                total_tracks: playlist.tracks.total,
            })
            .collect();
        Ok(page_from(&paging, raw_len, items))
    }

    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<SpotifyApiTrack>> {
        let mut paging = self
            .client
            .get_playlist_items_page(playlist_id, offset, limit)
            .await?;
        let raw_len = paging.items.len();
        // Removed/unavailable entries come back as a null track
        let items = std::mem::take(&mut paging.items)
            .into_iter()
            .filter_map(|item| item.track)
            .map(to_api_track)
            .collect();
        Ok(page_from(&paging, raw_len, items))
    }

    async fn saved_tracks(&self, offset: u32, limit: u32) -> Result<Page<SpotifyApiTrack>> {
        let mut paging = self.client.get_saved_tracks_page(offset, limit).await?;
        let raw_len = paging.items.len();
        let items = std::mem::take(&mut paging.items)
            .into_iter()
            .map(|saved| to_api_track(saved.track))
            .collect();
        Ok(page_from(&paging, raw_len, items))
    }

    async fn saved_albums(&self, offset: u32, limit: u32) -> Result<Page<SpotifyApiAlbum>> {
        let mut paging = self.client.get_saved_albums_page(offset, limit).await?;
        let raw_len = paging.items.len();
        let items = std::mem::take(&mut paging.items)
            .into_iter()
            .map(|saved| to_api_album(saved.album))
            .collect();
        Ok(page_from(&paging, raw_len, items))
    }

    async fn saved_tracks_contains(&self, track_ids: &[String]) -> Result<Vec<bool>> {
        self.client.check_saved_tracks(track_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify_rs::types::SpotifyArtist;

    #[test]
    fn test_to_api_track_drops_id_of_local_files() {
        let local = SpotifyTrack {
            id: Some("spotify:local:x".into()),
            name: "bootleg.mp3".into(),
            artists: vec![],
            is_local: true,
        };
        let converted = to_api_track(local);
        assert!(converted.id.is_none());
        assert!(converted.is_local);
    }

    #[test]
    fn test_to_api_track_keeps_artist_order() {
        let track = SpotifyTrack {
            id: Some("t1".into()),
            name: "Song".into(),
            artists: vec![
                SpotifyArtist {
                    id: Some("a1".into()),
                    name: "First".into(),
                },
                SpotifyArtist {
                    id: Some("a2".into()),
                    name: "Second".into(),
                },
            ],
            is_local: false,
        };
        let converted = to_api_track(track);
        assert_eq!(converted.id.as_deref(), Some("t1"));
        assert_eq!(converted.artists, vec!["First", "Second"]);
    }

    #[test]
    fn test_page_from_counts_filtered_entries() {
        let paging: Paging<()> = Paging {
            items: vec![],
            next: Some("https://api.spotify.com/v1/playlists/p/tracks?offset=100".into()),
            offset: 50,
            limit: 50,
            total: 120,
        };
        // 50 entries came back, two of them were null tracks
        let page = page_from(&paging, 50, vec![0; 48]);
        assert_eq!(page.next_offset, Some(100));
        assert_eq!(page.total, 120);
        assert_eq!(page.items.len(), 48);
    }

    #[test]
    fn test_page_from_last_page() {
        let paging: Paging<()> = Paging {
            items: vec![],
            next: None,
            offset: 100,
            limit: 50,
            total: 120,
        };
        assert_eq!(page_from(&paging, 20, vec![1]).next_offset, None);

        let empty_with_next = Paging {
            next: Some("x".into()),
            ..paging
        };
        assert_eq!(page_from(&empty_with_next, 0, Vec::<i32>::new()).next_offset, None);
    }

    #[tokio::test]
    async fn test_obtain_access_token_uses_fresh_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("token.json");
        let token = CachedToken {
            access_token: "cached-access".into(),
            refresh_token: Some("refresh".into()),
            scope: SPOTIFY_SCOPES.join(" "),
            expires_at: chrono::Utc::now().timestamp() + 3600,
        };
        token_cache::store(&cache_path, &token).unwrap();

        let credentials =
            SpotifyApiCredentials::new("id".into(), None, "http://localhost:8888/callback".into());
        let mut input = std::io::Cursor::new(Vec::new());
        let mut output = Vec::new();

        let access_token = obtain_access_token(
            &reqwest::Client::new(),
            &credentials,
            &cache_path,
            &mut input,
            &mut output,
        )
        .await
        .unwrap();

        assert_eq!(access_token, "cached-access");
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_obtain_access_token_rejects_forged_redirect() {
        let dir = tempfile::tempdir().unwrap();
        let credentials =
            SpotifyApiCredentials::new("id".into(), None, "http://localhost:8888/callback".into());
        let mut input = std::io::Cursor::new(
            b"http://localhost:8888/callback?code=abc&state=forged\n".to_vec(),
        );
        let mut output = Vec::new();

        let result = obtain_access_token(
            &reqwest::Client::new(),
            &credentials,
            &dir.path().join("token.json"),
            &mut input,
            &mut output,
        )
        .await;

        assert!(result.unwrap_err().to_string().contains("State mismatch"));
        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("https://accounts.spotify.com/authorize"));
    }
}
