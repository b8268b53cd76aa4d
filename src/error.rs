use color_eyre::Report;

/// A failed call to the Spotify API (or to the results file), grouped by what
/// the program was trying to do at the time.
///
/// `Display` renders a fixed message meant for the end user; the underlying
/// cause is kept around for the log.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    #[error("Couldn't authenticate with Spotify.")]
    Authentication(Report),
    #[error("Couldn't get user profile.")]
    UserRetrieve(Report),
    #[error("Couldn't get playlists.")]
    PlaylistRetrieve(Report),
    #[error("Couldn't get playlist items.")]
    PlaylistItemRetrieve(Report),
    #[error("Couldn't check saved songs.")]
    SavedSongs(Report),
    #[error("Couldn't get saved albums.")]
    SavedAlbums(Report),
    #[error("Couldn't write results file.")]
    Results(Report),
}

impl DiffError {
    /// The failure behind the user-facing message
    pub fn report(&self) -> &Report {
        match self {
            DiffError::Authentication(report)
            | DiffError::UserRetrieve(report)
            | DiffError::PlaylistRetrieve(report)
            | DiffError::PlaylistItemRetrieve(report)
            | DiffError::SavedSongs(report)
            | DiffError::SavedAlbums(report)
            | DiffError::Results(report) => report,
        }
    }
}
