use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::ports::spotify::{
    MockSpotifyClient, Page, SpotifyApiAlbum, SpotifyApiPlaylist, SpotifyApiTrack, SpotifyApiUser,
};
use crate::services::spotify::library::Pacing;

pub fn instant_pacing() -> Pacing {
    Pacing {
        page_size: 50,
        request_delay: Duration::ZERO,
        saved_page_delay: Duration::ZERO,
    }
}

pub fn me() -> SpotifyApiUser {
    SpotifyApiUser {
        id: "me".into(),
        display_name: Some("Me".into()),
    }
}

pub fn playlist(id: &str, name: &str, owner_id: &str, collaborative: bool) -> SpotifyApiPlaylist {
    SpotifyApiPlaylist {
        id: id.into(),
        name: name.into(),
        owner_id: owner_id.into(),
        collaborative,
        total_tracks: 0,
    }
}

pub fn track(id: &str, name: &str, artist: &str) -> SpotifyApiTrack {
    SpotifyApiTrack {
        id: Some(id.into()),
        name: name.into(),
        artists: vec![artist.into()],
        is_local: false,
    }
}

pub fn local_track(name: &str) -> SpotifyApiTrack {
    SpotifyApiTrack {
        id: None,
        name: name.into(),
        artists: vec![],
        is_local: true,
    }
}

pub fn album(id: &str, name: &str, artist: &str) -> SpotifyApiAlbum {
    SpotifyApiAlbum {
        id: id.into(),
        name: name.into(),
        artists: vec![artist.into()],
    }
}

/// The only page of a listing
pub fn single_page<T>(items: Vec<T>) -> Page<T> {
    Page {
        offset: 0,
        total: items.len() as u32,
        next_offset: None,
        items,
    }
}

/// Turn a list of pages into what the API would return for each offset
fn paginate<T: Clone>(pages: Vec<Vec<T>>) -> HashMap<u32, Page<T>> {
    let total: usize = pages.iter().map(Vec::len).sum();
    let count = pages.len();
    let mut offset = 0u32;
    let mut by_offset = HashMap::new();

    for (index, items) in pages.into_iter().enumerate() {
        let len = items.len() as u32;
        let next_offset = (index + 1 < count).then_some(offset + len);
        by_offset.insert(
            offset,
            Page {
                items,
                offset,
                total: total as u32,
                next_offset,
            },
        );
        offset += len;
    }

    if by_offset.is_empty() {
        by_offset.insert(
            0,
            Page {
                items: Vec::new(),
                offset: 0,
                total: 0,
                next_offset: None,
            },
        );
    }
    by_offset
}

fn lookup<T: Clone>(pages: &HashMap<u32, Page<T>>, offset: u32, what: &str) -> Page<T> {
    pages
        .get(&offset)
        .cloned()
        .unwrap_or_else(|| panic!("unexpected {} request at offset {}", what, offset))
}

/// In-memory Spotify account, served through a `MockSpotifyClient`
#[derive(Default)]
pub struct FakeSpotify {
    playlists: Vec<Vec<SpotifyApiPlaylist>>,
    playlist_tracks: HashMap<String, Vec<Vec<SpotifyApiTrack>>>,
    saved: Vec<Vec<SpotifyApiTrack>>,
    albums: Vec<Vec<SpotifyApiAlbum>>,
}

impl FakeSpotify {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn playlist_pages(mut self, pages: Vec<Vec<SpotifyApiPlaylist>>) -> Self {
        self.playlists = pages;
        self
    }

    pub fn tracks(mut self, playlist_id: &str, pages: Vec<Vec<SpotifyApiTrack>>) -> Self {
        self.playlist_tracks.insert(playlist_id.to_string(), pages);
        self
    }

    pub fn saved_pages(mut self, pages: Vec<Vec<SpotifyApiTrack>>) -> Self {
        self.saved = pages;
        self
    }

    pub fn album_pages(mut self, pages: Vec<Vec<SpotifyApiAlbum>>) -> Self {
        self.albums = pages;
        self
    }

    pub fn into_mock(self) -> MockSpotifyClient {
        let saved_ids: HashSet<String> = self
            .saved
            .iter()
            .flatten()
            .filter_map(|track| track.id.clone())
            .collect();
        let playlists = paginate(self.playlists);
        let playlist_tracks: HashMap<String, HashMap<u32, Page<SpotifyApiTrack>>> = self
            .playlist_tracks
            .into_iter()
            .map(|(id, pages)| (id, paginate(pages)))
            .collect();
        let saved = paginate(self.saved);
        let albums = paginate(self.albums);

        let mut client = MockSpotifyClient::new();
        client.expect_current_user().returning(|| Ok(me()));
        client
            .expect_current_user_playlists()
            .returning(move |offset, _| Ok(lookup(&playlists, offset, "playlists")));
        client
            .expect_playlist_tracks()
            .returning(move |playlist_id, offset, _| {
                let pages = playlist_tracks
                    .get(&playlist_id.to_string())
                    .unwrap_or_else(|| panic!("unexpected playlist {}", playlist_id));
                Ok(lookup(pages, offset, "playlist tracks"))
            });
        client
            .expect_saved_tracks()
            .returning(move |offset, _| Ok(lookup(&saved, offset, "saved tracks")));
        client
            .expect_saved_albums()
            .returning(move |offset, _| Ok(lookup(&albums, offset, "saved albums")));
        client
            .expect_saved_tracks_contains()
            .returning(move |ids| Ok(ids.iter().map(|id| saved_ids.contains(id)).collect()));
        client
    }
}
