use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;

use color_eyre::eyre::Result;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::error::DiffError;
use crate::ports::spotify::{
    SpotifyApiAlbum, SpotifyApiPlaylist, SpotifyApiTrack, SpotifyApiUser, SpotifyClient,
};
use crate::results::append_results;
use crate::services::spotify::library::{Pacing, SpotifyLibrary};

/// Unsaved tracks found in one playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistDiff {
    pub playlist_name: String,
    pub unsaved: Vec<SpotifyApiTrack>,
}

/// Compares the saved tracks library against the user's own playlists.
///
/// Console output goes to the writer handed to each operation.
pub struct LibraryDiffService<C: SpotifyClient> {
    library: SpotifyLibrary<C>,
    results_path: PathBuf,
}

impl<C: SpotifyClient> LibraryDiffService<C> {
    pub fn new(client: C, pacing: Pacing, results_path: PathBuf) -> Self {
        Self {
            library: SpotifyLibrary::new(client, pacing),
            results_path,
        }
    }

    pub async fn current_user(&self) -> Result<SpotifyApiUser> {
        self.library.current_user().await
    }

    /// Tracks in owned playlists that aren't in the saved tracks library.
    pub async fn find_unsaved_in_playlists<W: Write>(
        &self,
        user: &SpotifyApiUser,
        out: &mut W,
    ) -> Result<Vec<PlaylistDiff>> {
        let playlists = self.library.owned_playlists(user).await?;
        let mut diffs = Vec::with_capacity(playlists.len());

        for playlist in &playlists {
            writeln!(out, "{}", playlist.name)?;
            let unsaved = self.unsaved_in_playlist(playlist, out).await?;
            writeln!(out)?;

            log::info!("{} unsaved tracks in '{}'", unsaved.len(), playlist.name);
            diffs.push(PlaylistDiff {
                playlist_name: playlist.name.clone(),
                unsaved,
            });
        }

        Ok(diffs)
    }

    async fn unsaved_in_playlist<W: Write>(
        &self,
        playlist: &SpotifyApiPlaylist,
        out: &mut W,
    ) -> Result<Vec<SpotifyApiTrack>> {
        log::debug!(
            "Checking '{}' ({} tracks)",
            playlist.name,
            playlist.total_tracks
        );
        let mut unsaved = Vec::new();
        let mut offset = Some(0);

        while let Some(current) = offset {
            let page = self.library.playlist_tracks_page(playlist, current).await?;
            offset = page.next_offset;

            // Local files have no id and can't be saved
            let (checkable, ids): (Vec<_>, Vec<_>) = page
                .items
                .into_iter()
                .filter_map(|track| track.id.clone().map(|id| (track, id)))
                .unzip();
            let flags = self.library.saved_flags(&ids).await?;

            for (track, saved) in checkable.into_iter().zip(flags) {
                if !saved {
                    writeln!(out, "  {}", track.display_line())?;
                    unsaved.push(track);
                }
            }
            writeln!(out, " .")?;
        }

        Ok(unsaved)
    }

    /// Saved tracks that appear in none of the owned playlists. They are
    /// appended to the results file and returned in library order.
    pub async fn find_saved_not_in_playlists<W: Write>(
        &self,
        user: &SpotifyApiUser,
        out: &mut W,
    ) -> Result<Vec<SpotifyApiTrack>> {
        writeln!(out, "Retrieving ALL saved songs...")?;
        writeln!(out, "This may take a while.")?;
        let saved = self
            .library
            .saved_tracks(None, |_| writeln!(out, "."))
            .await?;

        writeln!(out, "Checking saved songs against playlists...")?;
        let playlists = self.library.owned_playlists(user).await?;
        let mut in_playlists: HashSet<String> = HashSet::new();

        for playlist in &playlists {
            writeln!(out, "{}", playlist.name)?;
            let mut offset = Some(0);
            while let Some(current) = offset {
                let page = self.library.playlist_tracks_page(playlist, current).await?;
                offset = page.next_offset;
                in_playlists.extend(page.items.into_iter().filter_map(|track| track.id));
                writeln!(out, " .")?;
            }
            writeln!(out)?;
        }

        let orphaned: Vec<SpotifyApiTrack> = saved
            .into_iter()
            .filter(|track| {
                track
                    .id
                    .as_ref()
                    .is_none_or(|id| !in_playlists.contains(id))
            })
            .collect();
        log::info!("{} saved tracks are in no playlist", orphaned.len());

        append_results(&self.results_path, &orphaned)
            .map_err(|error| DiffError::Results(error.into()))?;
        writeln!(
            out,
            "Found {} saved songs not in any playlists.",
            orphaned.len()
        )?;
        writeln!(out, "Results saved to {}", self.results_path.display())?;

        Ok(orphaned)
    }

    /// Pick one saved album at random. `None` when nothing is saved.
    pub async fn random_saved_album<W: Write, R: Rng>(
        &self,
        rng: &mut R,
        out: &mut W,
    ) -> Result<Option<SpotifyApiAlbum>> {
        let albums = self.library.saved_albums(|_| writeln!(out, ".")).await?;

        let Some(album) = albums.choose(rng).cloned() else {
            writeln!(out, "You have no saved albums.")?;
            writeln!(out)?;
            return Ok(None);
        };

        writeln!(out, "Your random album is: ")?;
        writeln!(out, "{}", album.display_line())?;
        writeln!(out)?;
        Ok(Some(album))
    }

    /// Print the first `count` saved tracks, numbered
    pub async fn list_saved_tracks<W: Write>(
        &self,
        count: usize,
        out: &mut W,
    ) -> Result<Vec<SpotifyApiTrack>> {
        let tracks = self.library.saved_tracks(Some(count), |_| Ok(())).await?;

        if tracks.is_empty() && count > 0 {
            writeln!(out, "You have no saved songs.")?;
        }
        for (index, track) in tracks.iter().enumerate() {
            writeln!(out, "{:>4}. {}", index + 1, track.display_line())?;
        }
        writeln!(out)?;

        Ok(tracks)
    }
}
