use std::time::Duration;

use color_eyre::eyre::Result;

use crate::config::Config;
use crate::error::DiffError;
use crate::ports::spotify::{
    Page, SpotifyApiAlbum, SpotifyApiPlaylist, SpotifyApiTrack, SpotifyApiUser, SpotifyClient,
};

/// How fast the library is paged through
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub page_size: u32,
    /// Sleep after every playlist page
    pub request_delay: Duration,
    /// Sleep after every saved tracks / saved albums page
    pub saved_page_delay: Duration,
}

impl Pacing {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_size: config.page_size(),
            request_delay: config.request_delay(),
            saved_page_delay: config.saved_page_delay(),
        }
    }
}

/// Read access to the user's playlists and library, with every failure
/// tagged with the [`DiffError`] category it belongs to.
pub struct SpotifyLibrary<C: SpotifyClient> {
    client: C,
    pacing: Pacing,
}

impl<C: SpotifyClient> SpotifyLibrary<C> {
    pub fn new(client: C, pacing: Pacing) -> Self {
        Self { client, pacing }
    }

    pub async fn current_user(&self) -> Result<SpotifyApiUser> {
        let user = self
            .client
            .current_user()
            .await
            .map_err(DiffError::UserRetrieve)?;
        log::debug!("Authenticated as {} ({:?})", user.id, user.display_name);
        Ok(user)
    }

    /// Every playlist owned by `user` that isn't collaborative, in library order
    pub async fn owned_playlists(&self, user: &SpotifyApiUser) -> Result<Vec<SpotifyApiPlaylist>> {
        let mut owned = Vec::new();
        let mut offset = Some(0);

        while let Some(current) = offset {
            let page = self
                .client
                .current_user_playlists(current, self.pacing.page_size)
                .await
                .map_err(DiffError::PlaylistRetrieve)?;
            log::debug!(
                "Fetched playlists {}..{} of {}",
                page.offset,
                page.offset as usize + page.items.len(),
                page.total
            );

            offset = page.next_offset;
            owned.extend(
                page.items
                    .into_iter()
                    .filter(|playlist| playlist.is_owned_by(user)),
            );
        }

        log::info!("{} playlists owned by {}", owned.len(), user.id);
        Ok(owned)
    }

    /// One page of a playlist's tracks, followed by the request delay
    pub async fn playlist_tracks_page(
        &self,
        playlist: &SpotifyApiPlaylist,
        offset: u32,
    ) -> Result<Page<SpotifyApiTrack>> {
        let page = self
            .client
            .playlist_tracks(&playlist.id, offset, self.pacing.page_size)
            .await
            .map_err(DiffError::PlaylistItemRetrieve)?;
        log::debug!(
            "Fetched {} tracks of '{}' at offset {}",
            page.items.len(),
            playlist.name,
            offset
        );
        tokio::time::sleep(self.pacing.request_delay).await;
        Ok(page)
    }

    /// Whether each track is saved, in the same order as `track_ids`
    pub async fn saved_flags(&self, track_ids: &[String]) -> Result<Vec<bool>> {
        let mut flags = Vec::with_capacity(track_ids.len());

        for chunk in track_ids.chunks(crate::spotify_rs::client::MAX_CONTAINS_IDS) {
            let answer = self
                .client
                .saved_tracks_contains(chunk)
                .await
                .map_err(DiffError::SavedSongs)?;
            if answer.len() != chunk.len() {
                return Err(DiffError::SavedSongs(color_eyre::eyre::eyre!(
                    "Asked about {} tracks but got {} answers",
                    chunk.len(),
                    answer.len()
                ))
                .into());
            }
            flags.extend(answer);
        }

        Ok(flags)
    }

    /// Saved tracks in library order, stopping once `limit` are collected.
    /// `on_page` runs after every page with the number loaded so far.
    pub async fn saved_tracks(
        &self,
        limit: Option<usize>,
        mut on_page: impl FnMut(usize) -> std::io::Result<()>,
    ) -> Result<Vec<SpotifyApiTrack>> {
        let mut tracks = Vec::new();
        let mut offset = Some(0);

        while let Some(current) = offset {
            if limit.is_some_and(|limit| tracks.len() >= limit) {
                break;
            }

            let page = self
                .client
                .saved_tracks(current, self.pacing.page_size)
                .await
                .map_err(DiffError::SavedSongs)?;
            offset = page.next_offset;
            tracks.extend(page.items);

            on_page(tracks.len())?;
            tokio::time::sleep(self.pacing.saved_page_delay).await;
        }

        if let Some(limit) = limit {
            tracks.truncate(limit);
        }
        log::debug!("Loaded {} saved tracks", tracks.len());
        Ok(tracks)
    }

    /// Every saved album in library order
    pub async fn saved_albums(
        &self,
        mut on_page: impl FnMut(usize) -> std::io::Result<()>,
    ) -> Result<Vec<SpotifyApiAlbum>> {
        let mut albums = Vec::new();
        let mut offset = Some(0);

        while let Some(current) = offset {
            let page = self
                .client
                .saved_albums(current, self.pacing.page_size)
                .await
                .map_err(DiffError::SavedAlbums)?;
            offset = page.next_offset;
            albums.extend(page.items);

            on_page(albums.len())?;
            tokio::time::sleep(self.pacing.saved_page_delay).await;
        }

        log::debug!("Loaded {} saved albums", albums.len());
        Ok(albums)
    }
}
