use color_eyre::eyre::Result;

/// Decoupled representation of the authenticated Spotify user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyApiUser {
    pub id: String,
    pub display_name: Option<String>,
}

/// Decoupled representation of a Spotify playlist from the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyApiPlaylist {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub collaborative: bool,
    pub total_tracks: u32,
}

impl SpotifyApiPlaylist {
    /// Owned by `user` and not open to other editors
    pub fn is_owned_by(&self, user: &SpotifyApiUser) -> bool {
        self.owner_id == user.id && !self.collaborative
    }
}

/// Decoupled representation of a Spotify track from the API.
/// `id` is `None` for local files and unavailable tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyApiTrack {
    pub id: Option<String>,
    pub name: String,
    pub artists: Vec<String>,
    pub is_local: bool,
}

/// Decoupled representation of a saved Spotify album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyApiAlbum {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
}

fn display_line(name: &str, artists: &[String]) -> String {
    let artist = artists
        .first()
        .map(String::as_str)
        .filter(|artist| !artist.is_empty())
        .unwrap_or("Unknown artist");
    format!("{} — {}", name, artist)
}

impl SpotifyApiTrack {
    /// `name — first artist`
    pub fn display_line(&self) -> String {
        display_line(&self.name, &self.artists)
    }
}

impl SpotifyApiAlbum {
    pub fn display_line(&self) -> String {
        display_line(&self.name, &self.artists)
    }
}

/// One page of a listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub offset: u32,
    pub total: u32,
    /// Offset of the following page, `None` on the last page
    pub next_offset: Option<u32>,
}

/// Port trait wrapping the Spotify API capabilities used by business logic.
///
/// Implementations live in `services::spotify::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SpotifyClient: Send + Sync {
    async fn current_user(&self) -> Result<SpotifyApiUser>;
    async fn current_user_playlists(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Page<SpotifyApiPlaylist>>;
    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<SpotifyApiTrack>>;
    async fn saved_tracks(&self, offset: u32, limit: u32) -> Result<Page<SpotifyApiTrack>>;
    async fn saved_albums(&self, offset: u32, limit: u32) -> Result<Page<SpotifyApiAlbum>>;
    /// Same length and order as `track_ids`
    async fn saved_tracks_contains(&self, track_ids: &[String]) -> Result<Vec<bool>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(name: &str, artists: &[&str]) -> SpotifyApiTrack {
        SpotifyApiTrack {
            id: Some("id".into()),
            name: name.into(),
            artists: artists.iter().map(|a| a.to_string()).collect(),
            is_local: false,
        }
    }

    #[test]
    fn test_display_line_uses_first_artist() {
        let line = track("Windowlicker", &["Aphex Twin", "Someone Else"]).display_line();
        assert_eq!(line, "Windowlicker — Aphex Twin");
    }

    #[test]
    fn test_display_line_without_artist() {
        assert_eq!(track("demo.mp3", &[]).display_line(), "demo.mp3 — Unknown artist");
        assert_eq!(track("demo.mp3", &[""]).display_line(), "demo.mp3 — Unknown artist");
    }

    #[test]
    fn test_is_owned_by() {
        let me = SpotifyApiUser {
            id: "me".into(),
            display_name: None,
        };
        let mut playlist = SpotifyApiPlaylist {
            id: "pl".into(),
            name: "Mine".into(),
            owner_id: "me".into(),
            collaborative: false,
            total_tracks: 0,
        };
        assert!(playlist.is_owned_by(&me));

        playlist.collaborative = true;
        assert!(!playlist.is_owned_by(&me));

        playlist.collaborative = false;
        playlist.owner_id = "someone".into();
        assert!(!playlist.is_owned_by(&me));
    }
}
