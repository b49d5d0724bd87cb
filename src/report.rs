use std::borrow::Cow;

use crate::catalog::{CatalogSummary, Track};
use crate::config::{AppendPosition, MergeOptions};
use crate::reconcile::{AlbumTrack, Difference, MergeCounts, MergePlan};

const RULE: &str = "─────────────────────────────────────────────────────────────";
const DOUBLE_RULE: &str = "═════════════════════════════════════════════════════════════";
const BANNER_WIDTH: usize = 63;

fn banner(lines: &mut Vec<String>, title: &str) {
    lines.push(format!("╔{}╗", "═".repeat(BANNER_WIDTH)));
    lines.push(format!("║{title:^width$}║", width = BANNER_WIDTH));
    lines.push(format!("╚{}╝", "═".repeat(BANNER_WIDTH)));
}

fn section(lines: &mut Vec<String>, title: &str) {
    lines.push(DOUBLE_RULE.to_owned());
    lines.push(title.to_owned());
    lines.push(DOUBLE_RULE.to_owned());
}

fn signed(delta: i64) -> String {
    if delta > 0 {
        format!("+{delta}")
    } else {
        delta.to_string()
    }
}

fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

fn shown(value: Option<Cow<'_, str>>) -> Cow<'_, str> {
    value.unwrap_or(Cow::Borrowed("-"))
}

fn delta(from: usize, to: usize) -> i64 {
    to as i64 - from as i64
}

/// `name - artist [ext, 320kbps]`
fn track_line(track: &Track) -> String {
    format!(
        "{} - {} [{}, {}kbps]",
        shown(track.name()),
        shown(track.artist()),
        shown(track.ext()),
        shown(track.bitrate()),
    )
}

/// One side of a comparison
pub struct Side<'a, 'b> {
    pub label: &'a str,
    pub summary: &'a CatalogSummary<'b>,
}

fn albums_only_in(lines: &mut Vec<String>, side: &Side<'_, '_>, albums: &[&str]) {
    if albums.is_empty() {
        lines.push(format!("📁 Albums only in {}: none", side.label));
        lines.push(String::new());
        return;
    }
    lines.push(format!(
        "📁 Albums only in {} ({}):",
        side.label,
        count(albums.len(), "album"),
    ));
    lines.push(RULE.to_owned());
    for &album in albums {
        let Some(bucket) = side.summary.album(album) else {
            continue;
        };
        lines.push(format!(
            "  ▶ {album} ({})",
            count(bucket.tracks.len(), "track"),
        ));
        for (i, track) in bucket.tracks.iter().enumerate() {
            lines.push(format!(
                "      {}. {} - {}",
                i + 1,
                shown(track.name()),
                shown(track.artist()),
            ));
        }
        lines.push(String::new());
    }
}

/// Album header once per run of tracks sharing an album
fn tracks_only_in(lines: &mut Vec<String>, label: &str, tracks: &[AlbumTrack<'_>]) {
    if tracks.is_empty() {
        lines.push(format!("🎶 Tracks only in {label}: none"));
        lines.push(String::new());
        return;
    }
    lines.push(format!(
        "🎶 Tracks only in {label} ({}):",
        count(tracks.len(), "track"),
    ));
    lines.push(RULE.to_owned());
    let mut current_album: Option<&str> = None;
    for entry in tracks {
        if current_album != Some(entry.album) {
            if current_album.is_some() {
                lines.push(String::new());
            }
            current_album = Some(entry.album);
            lines.push(format!("  【{}】", entry.album));
        }
        lines.push(format!("    • {}", track_line(entry.track)));
    }
    lines.push(String::new());
}

pub fn diff_report(first: &Side<'_, '_>, second: &Side<'_, '_>, difference: &Difference<'_>) -> String {
    let mut lines = Vec::new();
    let albums = &difference.albums;
    let tracks = &difference.tracks;

    banner(&mut lines, "Music Catalog Comparison Report");
    lines.push(String::new());

    lines.push("📊 Overall statistics".to_owned());
    lines.push(RULE.to_owned());
    for (n, side) in [(1, first), (2, second)] {
        lines.push(format!("File {n}: {}", side.label));
        lines.push(format!("  - Albums: {}", side.summary.total_albums()));
        lines.push(format!("  - Tracks: {}", side.summary.total_tracks()));
        lines.push(String::new());
    }
    lines.push("Differences:".to_owned());
    lines.push(format!(
        "  - Album count delta: {}",
        signed(delta(first.summary.total_albums(), second.summary.total_albums())),
    ));
    lines.push(format!(
        "  - Track count delta: {}",
        signed(delta(first.summary.total_tracks(), second.summary.total_tracks())),
    ));
    lines.push(String::new());

    section(&mut lines, "🔍 Album differences");
    lines.push(String::new());
    albums_only_in(&mut lines, first, &albums.only_in_first);
    albums_only_in(&mut lines, second, &albums.only_in_second);

    section(
        &mut lines,
        &format!("📂 Common albums ({})", albums.common.len()),
    );
    lines.push(String::new());
    for &album in &albums.common {
        let first_count = first.summary.track_count(album);
        let second_count = second.summary.track_count(album);
        let change = delta(first_count, second_count);
        lines.push(format!("  ▶ {album}"));
        lines.push(format!(
            "      {}: {} | {}: {} [{}]",
            first.label,
            count(first_count, "track"),
            second.label,
            count(second_count, "track"),
            signed(change),
        ));
        if change != 0 {
            lines.push("      ⚠️ Track counts differ, see track differences below".to_owned());
        }
        lines.push(String::new());
    }

    section(&mut lines, "🎵 Track differences");
    lines.push(String::new());
    tracks_only_in(&mut lines, first.label, &tracks.only_in_first);
    tracks_only_in(&mut lines, second.label, &tracks.only_in_second);

    section(&mut lines, "📋 Summary");
    lines.push(format!("Albums only in file 1: {}", albums.only_in_first.len()));
    lines.push(format!("Albums only in file 2: {}", albums.only_in_second.len()));
    lines.push(format!("Common albums: {}", albums.common.len()));
    lines.push(format!("Tracks only in file 1: {}", tracks.only_in_first.len()));
    lines.push(format!("Tracks only in file 2: {}", tracks.only_in_second.len()));
    lines.push(format!(
        "Differing tracks: {}",
        tracks.only_in_first.len() + tracks.only_in_second.len(),
    ));
    lines.push(String::new());

    lines.join("\n")
}

fn merge_statistics(lines: &mut Vec<String>, counts: MergeCounts, indent: &str) {
    lines.push(format!("{indent}Main catalog tracks: {}", counts.main));
    lines.push(format!("{indent}Secondary catalog tracks: {}", counts.secondary));
    lines.push(format!("{indent}New tracks: {}", counts.new));
    lines.push(format!("{indent}Duplicates (not added): {}", counts.duplicates));
    lines.push(format!("{indent}Total after merge: {}", counts.merged_total()));
}

pub fn merge_preview(plan: &MergePlan<'_>) -> String {
    let mut lines = Vec::new();
    banner(&mut lines, "Merge Preview");
    lines.push(String::new());
    lines.push("📊 Statistics".to_owned());
    merge_statistics(&mut lines, plan.counts(), "  - ");
    lines.push(String::new());

    if !plan.new_tracks.is_empty() {
        lines.push(RULE.to_owned());
        lines.push("🆕 Tracks to add:".to_owned());
        lines.push(RULE.to_owned());

        let grouped = CatalogSummary::analyze(plan.new_tracks.iter().copied());
        for album in grouped.sorted_album_names() {
            let Some(bucket) = grouped.album(album) else {
                continue;
            };
            lines.push(String::new());
            lines.push(format!(
                "  【{album}】 ({})",
                count(bucket.tracks.len(), "track"),
            ));
            for (i, track) in bucket.tracks.iter().enumerate() {
                lines.push(format!("    {}. {}", i + 1, track_line(track)));
            }
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Everything the merge report echoes besides the plan itself
pub struct MergeReportContext<'a> {
    pub main_file: &'a str,
    pub secondary_file: &'a str,
    pub output_file: &'a str,
    pub options: &'a MergeOptions,
    /// Rendered by the caller so the report stays reproducible
    pub generated_at: &'a str,
}

pub fn merge_report(plan: &MergePlan<'_>, context: &MergeReportContext<'_>) -> String {
    let mut lines = Vec::new();
    banner(&mut lines, "Music Catalog Merge Report");
    lines.push(String::new());
    lines.push(format!("Generated: {}", context.generated_at));
    lines.push(String::new());

    lines.push("📋 Files".to_owned());
    lines.push(RULE.to_owned());
    lines.push(format!("Main file: {}", context.main_file));
    lines.push(format!("Secondary file: {}", context.secondary_file));
    lines.push(format!("Output file: {}", context.output_file));
    lines.push(String::new());

    lines.push("📊 Merge statistics".to_owned());
    lines.push(RULE.to_owned());
    merge_statistics(&mut lines, plan.counts(), "");
    lines.push(String::new());

    let options = context.options;
    lines.push("⚙️ Merge strategy".to_owned());
    lines.push(RULE.to_owned());
    lines.push(format!("Identity strategy: {}", options.identity_strategy));
    lines.push(format!(
        "New tracks placed at: {}",
        match options.append_position {
            AppendPosition::Start => "start",
            AppendPosition::End => "end",
        },
    ));
    lines.push(format!(
        "New tracks sorted: {}",
        if options.sort_new_by_album {
            "yes (by album, then name)"
        } else {
            "no"
        },
    ));
    lines.push(String::new());

    if !plan.new_tracks.is_empty() {
        section(&mut lines, "🆕 New tracks");
        lines.push(String::new());

        let grouped = CatalogSummary::analyze(plan.new_tracks.iter().copied());
        lines.push(format!("{} affected:", count(grouped.total_albums(), "album")));
        lines.push(String::new());

        for album in grouped.sorted_album_names() {
            let Some(bucket) = grouped.album(album) else {
                continue;
            };
            lines.push(format!(
                "【{album}】 ({})",
                count(bucket.tracks.len(), "track"),
            ));
            for (i, track) in bucket.tracks.iter().enumerate() {
                lines.push(format!("  {}. {}", i + 1, shown(track.name())));
                lines.push(format!("     Artist: {}", shown(track.artist())));
                lines.push(format!(
                    "     Format: {} | Bitrate: {}kbps | ID: {}",
                    shown(track.ext()),
                    shown(track.bitrate()),
                    shown(track.id()),
                ));
            }
            lines.push(String::new());
        }
    }

    section(&mut lines, "✅ Merge complete");
    lines.join("\n")
}

/// Outcome of one secondary file in a batch merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchStep {
    pub file: String,
    pub counts: MergeCounts,
}

pub fn batch_summary(steps: &[BatchStep], final_count: usize) -> String {
    let mut lines = Vec::new();
    banner(&mut lines, "Batch Merge Summary");
    lines.push(String::new());
    for (i, step) in steps.iter().enumerate() {
        lines.push(format!(
            "[{}/{}] {}: {} new, {} duplicate",
            i + 1,
            steps.len(),
            step.file,
            step.counts.new,
            step.counts.duplicates,
        ));
    }
    lines.push(String::new());
    lines.push(format!(
        "Tracks added: {}",
        steps.iter().map(|s| s.counts.new).sum::<usize>(),
    ));
    lines.push(format!("Final catalog size: {final_count}"));
    lines.push(String::new());
    lines.join("\n")
}
