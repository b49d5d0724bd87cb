use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::catalog::{CatalogSummary, Track};
use crate::config::{AppendPosition, MergeOptions};
use crate::identity::IdentityStrategy;

/// A track together with the album bucket it was found in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlbumTrack<'a> {
    pub album: &'a str,
    pub track: &'a Track,
}

/// Album names, each list sorted ascending
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AlbumDiff<'a> {
    pub only_in_first: Vec<&'a str>,
    pub only_in_second: Vec<&'a str>,
    pub common: Vec<&'a str>,
}

/// Tracks with no key match on the other side, sorted by album (stable)
#[derive(Debug, Default, PartialEq)]
pub struct TrackDiff<'a> {
    pub only_in_first: Vec<AlbumTrack<'a>>,
    pub only_in_second: Vec<AlbumTrack<'a>>,
}

#[derive(Debug, Default, PartialEq)]
pub struct Difference<'a> {
    pub albums: AlbumDiff<'a>,
    pub tracks: TrackDiff<'a>,
}

pub fn diff_albums<'a>(first: &'a CatalogSummary<'_>, second: &'a CatalogSummary<'_>) -> AlbumDiff<'a> {
    let mut diff = AlbumDiff::default();
    for name in first.sorted_album_names() {
        if second.contains_album(name) {
            diff.common.push(name);
        } else {
            diff.only_in_first.push(name);
        }
    }
    diff.only_in_second = second
        .sorted_album_names()
        .into_iter()
        .filter(|name| !first.contains_album(name))
        .collect();
    diff
}

/// Key → entry map that keeps the position of a key's first appearance while
/// letting later entries with the same key replace the stored one.
struct KeyedTracks<T> {
    entries: Vec<(String, T)>,
    positions: HashMap<String, usize>,
}

impl<T> KeyedTracks<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    fn insert(&mut self, key: String, entry: T) {
        match self.positions.entry(key) {
            Entry::Occupied(position) => self.entries[*position.get()].1 = entry,
            Entry::Vacant(position) => {
                self.entries.push((position.key().clone(), entry));
                position.insert(self.entries.len() - 1);
            }
        }
    }

    fn get(&self, key: &str) -> Option<&T> {
        self.positions.get(key).map(|&i| &self.entries[i].1)
    }

    fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }
}

impl<'a> KeyedTracks<AlbumTrack<'a>> {
    fn from_summary(summary: &'a CatalogSummary<'_>, strategy: IdentityStrategy) -> Self {
        let mut keyed = Self::new();
        for bucket in summary.albums() {
            for &track in &bucket.tracks {
                let key = strategy.key_in_album(track, &bucket.name);
                keyed.insert(
                    key,
                    AlbumTrack {
                        album: &bucket.name,
                        track,
                    },
                );
            }
        }
        keyed
    }

    fn missing_from<U>(&self, other: &KeyedTracks<U>) -> Vec<AlbumTrack<'a>> {
        let mut missing: Vec<AlbumTrack<'a>> = self
            .entries
            .iter()
            .filter(|(key, _)| !other.contains(key))
            .map(|(_, entry)| *entry)
            .collect();
        missing.sort_by(|a, b| a.album.cmp(b.album));
        missing
    }
}

/// Tracks of each side whose key does not occur on the other side. Tracks
/// sharing a key within one side count once.
pub fn diff_tracks<'a>(
    first: &'a CatalogSummary<'_>,
    second: &'a CatalogSummary<'_>,
    strategy: IdentityStrategy,
) -> TrackDiff<'a> {
    let first_keys = KeyedTracks::<AlbumTrack<'_>>::from_summary(first, strategy);
    let second_keys = KeyedTracks::<AlbumTrack<'_>>::from_summary(second, strategy);
    TrackDiff {
        only_in_first: first_keys.missing_from(&second_keys),
        only_in_second: second_keys.missing_from(&first_keys),
    }
}

pub fn diff<'a>(
    first: &'a CatalogSummary<'_>,
    second: &'a CatalogSummary<'_>,
    strategy: IdentityStrategy,
) -> Difference<'a> {
    Difference {
        albums: diff_albums(first, second),
        tracks: diff_tracks(first, second, strategy),
    }
}

/// A secondary track that was not added because its key is already taken
#[derive(Debug, PartialEq)]
pub struct Duplicate<'a> {
    pub key: String,
    /// Main track, or the secondary track that was added for the key
    pub existing: &'a Track,
    pub candidate: &'a Track,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeCounts {
    pub main: usize,
    pub secondary: usize,
    pub new: usize,
    pub duplicates: usize,
}

impl MergeCounts {
    pub fn merged_total(&self) -> usize {
        self.main + self.new
    }
}

#[derive(Debug, PartialEq)]
pub struct MergePlan<'a> {
    pub main_count: usize,
    pub secondary_count: usize,
    /// In order of each key's first appearance in the secondary catalog
    pub new_tracks: Vec<&'a Track>,
    pub duplicates: Vec<Duplicate<'a>>,
}

impl MergePlan<'_> {
    pub fn counts(&self) -> MergeCounts {
        MergeCounts {
            main: self.main_count,
            secondary: self.secondary_count,
            new: self.new_tracks.len(),
            duplicates: self.duplicates.len(),
        }
    }
}

/// Works on the flat catalogs, not the album buckets. Every secondary track
/// ends up either in `new_tracks` or in `duplicates`.
///
/// A key repeated inside the secondary catalog is added once, at the
/// position of its first occurrence and with its last occurrence, the same
/// track `diff_tracks` reports. The other occurrences are duplicates of it.
pub fn plan_merge<'a>(
    main: &'a [Track],
    secondary: &'a [Track],
    strategy: IdentityStrategy,
) -> MergePlan<'a> {
    let main_keys: HashMap<String, &Track> = main
        .iter()
        .map(|track| (strategy.key(track), track))
        .collect();

    let keys: Vec<String> = secondary.iter().map(|track| strategy.key(track)).collect();
    let mut pending: KeyedTracks<&Track> = KeyedTracks::new();
    for (key, track) in keys.iter().zip(secondary) {
        if !main_keys.contains_key(key) {
            pending.insert(key.clone(), track);
        }
    }

    let mut duplicates = Vec::new();
    for (key, candidate) in keys.into_iter().zip(secondary) {
        let existing = match main_keys.get(&key) {
            Some(&existing) => existing,
            None => match pending.get(&key) {
                Some(&kept) if !std::ptr::eq(kept, candidate) => kept,
                _ => continue,
            },
        };
        duplicates.push(Duplicate {
            key,
            existing,
            candidate,
        });
    }

    MergePlan {
        main_count: main.len(),
        secondary_count: secondary.len(),
        new_tracks: pending.entries.into_iter().map(|(_, track)| track).collect(),
        duplicates,
    }
}

/// Missing albums sort as the empty string
fn album_then_name(a: &Track, b: &Track) -> Ordering {
    a.album()
        .unwrap_or_default()
        .cmp(&b.album().unwrap_or_default())
        .then_with(|| a.name().unwrap_or_default().cmp(&b.name().unwrap_or_default()))
}

/// Main tracks in their original order, with the new tracks as one block
/// before or after them.
pub fn apply_merge(main: &[Track], new_tracks: &[&Track], options: &MergeOptions) -> Vec<Track> {
    let mut block: Vec<&Track> = new_tracks.to_vec();
    if options.sort_new_by_album {
        block.sort_by(|a, b| album_then_name(a, b));
    }

    let mut merged = Vec::with_capacity(main.len() + block.len());
    match options.append_position {
        AppendPosition::Start => {
            merged.extend(block.into_iter().cloned());
            merged.extend_from_slice(main);
        }
        AppendPosition::End => {
            merged.extend_from_slice(main);
            merged.extend(block.into_iter().cloned());
        }
    }
    merged
}

/// One fold step of a batch merge: `main` is the result of the previous
/// steps.
pub fn merge_step(
    main: Vec<Track>,
    secondary: &[Track],
    options: &MergeOptions,
) -> (Vec<Track>, MergeCounts) {
    let plan = plan_merge(&main, secondary, options.identity_strategy);
    let counts = plan.counts();
    if plan.new_tracks.is_empty() {
        drop(plan);
        return (main, counts);
    }
    (apply_merge(&main, &plan.new_tracks, options), counts)
}
