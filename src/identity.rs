use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::catalog::Track;

const ID_PREFIX: &str = "id_";
const SEPARATOR: &str = "@@";

/// Rule deciding when two tracks are the same logical track.
///
/// Keys are compared verbatim, with no case or whitespace normalization.
/// A separator inside a field value can make two different tracks collide.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize,
)]
pub enum IdentityStrategy {
    /// Tracks without an `id` all share the key `id_` and match each other
    #[value(name = "id")]
    #[serde(rename = "id")]
    Id,
    #[default]
    #[value(name = "name+album")]
    #[serde(rename = "name+album")]
    NameAlbum,
    #[value(name = "name+artist+album")]
    #[serde(rename = "name+artist+album")]
    NameArtistAlbum,
}

impl IdentityStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::NameAlbum => "name+album",
            Self::NameArtistAlbum => "name+artist+album",
        }
    }

    /// Key for `track`, using its resolved album
    pub fn key(self, track: &Track) -> String {
        self.key_in_album(track, &track.resolved_album())
    }

    /// Key for `track` as a member of `album`
    pub fn key_in_album(self, track: &Track, album: &str) -> String {
        let name = track.name().unwrap_or_default();
        match self {
            Self::Id => format!("{ID_PREFIX}{}", track.id().unwrap_or_default()),
            Self::NameAlbum => format!("{name}{SEPARATOR}{album}"),
            Self::NameArtistAlbum => format!(
                "{name}{SEPARATOR}{}{SEPARATOR}{album}",
                track.artist().unwrap_or_default(),
            ),
        }
    }
}

impl fmt::Display for IdentityStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::catalog::{UNKNOWN_ALBUM, track};

    #[test]
    fn test_key_name_album() {
        let t = track(json!({"name": "Song", "artist": "Artist", "album": "Album", "id": 7}));
        assert_eq!(IdentityStrategy::NameAlbum.key(&t), "Song@@Album");
        assert_eq!(
            IdentityStrategy::NameArtistAlbum.key(&t),
            "Song@@Artist@@Album",
        );
        assert_eq!(IdentityStrategy::Id.key(&t), "id_7");
    }

    #[test]
    fn test_key_is_not_normalized() {
        let a = track(json!({"name": "Song", "album": "Album"}));
        let b = track(json!({"name": "song ", "album": "Album"}));
        assert_ne!(
            IdentityStrategy::NameAlbum.key(&a),
            IdentityStrategy::NameAlbum.key(&b),
        );
    }

    #[test]
    fn test_key_missing_album_uses_sentinel() {
        let missing = track(json!({"name": "Song"}));
        let empty = track(json!({"name": "Song", "album": ""}));
        let expected = format!("Song@@{UNKNOWN_ALBUM}");
        assert_eq!(IdentityStrategy::NameAlbum.key(&missing), expected);
        assert_eq!(IdentityStrategy::NameAlbum.key(&empty), expected);
    }

    #[test]
    fn test_key_missing_ids_collide() {
        let a = track(json!({"name": "One", "album": "A"}));
        let b = track(json!({"name": "Two", "album": "B", "id": null}));
        assert_eq!(IdentityStrategy::Id.key(&a), "id_");
        assert_eq!(IdentityStrategy::Id.key(&a), IdentityStrategy::Id.key(&b));
    }

    #[test]
    fn test_key_id_verbatim() {
        let numeric = track(json!({"id": 12}));
        let text = track(json!({"id": " 12"}));
        assert_eq!(IdentityStrategy::Id.key(&numeric), "id_12");
        assert_eq!(IdentityStrategy::Id.key(&text), "id_ 12");
    }

    #[test]
    fn test_key_separator_ambiguity() {
        let a = track(json!({"name": "A@@B", "album": "C"}));
        let b = track(json!({"name": "A", "album": "B@@C"}));
        assert_eq!(
            IdentityStrategy::NameAlbum.key(&a),
            IdentityStrategy::NameAlbum.key(&b),
        );
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(IdentityStrategy::default(), IdentityStrategy::NameAlbum);
        assert_eq!(IdentityStrategy::NameArtistAlbum.to_string(), "name+artist+album");
        let parsed: IdentityStrategy = serde_json::from_str("\"id\"").unwrap();
        assert_eq!(parsed, IdentityStrategy::Id);
        assert_eq!(
            IdentityStrategy::from_str("name+album", false).unwrap(),
            IdentityStrategy::NameAlbum,
        );
    }
}
