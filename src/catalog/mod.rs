use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod file;

/// Bucket for tracks with a missing or empty `album` field
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// One entry of a catalog file.
///
/// The JSON value is kept as it was read so that fields this tool does not
/// look at are written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Track(Value);

impl Track {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Best-effort text form of a field. Missing and `null` fields are `None`,
    /// non-string scalars use their JSON text.
    pub fn text(&self, field: &str) -> Option<Cow<'_, str>> {
        match self.0.get(field)? {
            Value::Null => None,
            Value::String(s) => Some(Cow::Borrowed(s)),
            other => Some(Cow::Owned(other.to_string())),
        }
    }

    pub fn name(&self) -> Option<Cow<'_, str>> {
        self.text("name")
    }

    pub fn artist(&self) -> Option<Cow<'_, str>> {
        self.text("artist")
    }

    pub fn album(&self) -> Option<Cow<'_, str>> {
        self.text("album")
    }

    pub fn id(&self) -> Option<Cow<'_, str>> {
        self.text("id")
    }

    pub fn ext(&self) -> Option<Cow<'_, str>> {
        self.text("ext")
    }

    /// In kbps
    pub fn bitrate(&self) -> Option<Cow<'_, str>> {
        self.text("bitrate")
    }

    /// Album name used for grouping and identity keys
    pub fn resolved_album(&self) -> Cow<'_, str> {
        match self.album() {
            Some(album) if !album.is_empty() => album,
            _ => Cow::Borrowed(UNKNOWN_ALBUM),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct AlbumBucket<'a> {
    pub name: String,
    /// In catalog order
    pub tracks: Vec<&'a Track>,
}

/// Album-indexed view over a catalog.
///
/// Buckets are kept in order of first appearance; every track lands in
/// exactly one of them.
#[derive(Debug, PartialEq)]
pub struct CatalogSummary<'a> {
    albums: Vec<AlbumBucket<'a>>,
    index: HashMap<String, usize>,
    total_tracks: usize,
}

impl<'a> CatalogSummary<'a> {
    pub fn analyze<I>(tracks: I) -> Self
    where
        I: IntoIterator<Item = &'a Track>,
    {
        let mut albums: Vec<AlbumBucket<'a>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut total_tracks = 0;

        for track in tracks {
            total_tracks += 1;
            let album = track.resolved_album();
            match index.get(album.as_ref()) {
                Some(&i) => albums[i].tracks.push(track),
                None => {
                    index.insert(album.clone().into_owned(), albums.len());
                    albums.push(AlbumBucket {
                        name: album.into_owned(),
                        tracks: vec![track],
                    });
                }
            }
        }

        Self {
            albums,
            index,
            total_tracks,
        }
    }

    pub fn albums(&self) -> &[AlbumBucket<'a>] {
        &self.albums
    }

    pub fn album(&self, name: &str) -> Option<&AlbumBucket<'a>> {
        self.index.get(name).map(|&i| &self.albums[i])
    }

    pub fn contains_album(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn track_count(&self, album: &str) -> usize {
        self.album(album).map_or(0, |bucket| bucket.tracks.len())
    }

    pub fn total_albums(&self) -> usize {
        self.albums.len()
    }

    pub fn total_tracks(&self) -> usize {
        self.total_tracks
    }

    /// Album names in ascending order
    pub fn sorted_album_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.albums.iter().map(|b| b.name.as_str()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
pub(crate) fn track(value: Value) -> Track {
    Track::new(value)
}
