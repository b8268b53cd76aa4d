use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::ports::spotify::SpotifyApiTrack;

/// Append one `name — artist` line per track, creating the file if needed.
/// Returns how many lines were written.
pub fn append_results(path: &Path, tracks: &[SpotifyApiTrack]) -> std::io::Result<usize> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);

    for track in tracks {
        writeln!(writer, "{}", track.display_line())?;
    }
    writer.flush()?;

    log::debug!("Appended {} lines to {}", tracks.len(), path.display());
    Ok(tracks.len())
}
