use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::catalog::Track;
use crate::error::CatalogError;

/// A catalog as read from disk, tagged with the document shape so a rewrite
/// keeps it.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogFile {
    /// Top-level array
    Bare(Vec<Track>),
    /// `{ "data": [...] }`
    Wrapped(Vec<Track>),
}

#[derive(Serialize)]
struct WrappedDocument<'a> {
    data: &'a [Track],
}

impl CatalogFile {
    /// Anything that is neither an array nor an object with a `data` array
    /// is read as an empty wrapped catalog.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Bare(items.into_iter().map(Track::new).collect()),
            Value::Object(mut object) => match object.remove("data") {
                Some(Value::Array(items)) => {
                    Self::Wrapped(items.into_iter().map(Track::new).collect())
                }
                _ => Self::Wrapped(Vec::new()),
            },
            _ => Self::Wrapped(Vec::new()),
        }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::InputRead {
            path: path.to_owned(),
            source,
        })?;
        let value: Value =
            serde_json::from_str(&content).map_err(|source| CatalogError::InputParse {
                path: path.to_owned(),
                source,
            })?;
        Ok(Self::from_value(value))
    }

    pub fn tracks(&self) -> &[Track] {
        match self {
            Self::Bare(tracks) | Self::Wrapped(tracks) => tracks,
        }
    }

    /// Same shape, different contents
    pub fn with_tracks(&self, tracks: Vec<Track>) -> Self {
        match self {
            Self::Bare(_) => Self::Bare(tracks),
            Self::Wrapped(_) => Self::Wrapped(tracks),
        }
    }

    /// Pretty-printed with two-space indentation
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Bare(tracks) => serde_json::to_string_pretty(tracks),
            Self::Wrapped(tracks) => serde_json::to_string_pretty(&WrappedDocument { data: tracks }),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        let json = self
            .to_json_string()
            .map_err(|source| CatalogError::Serialize {
                path: path.to_owned(),
                source,
            })?;
        write_text(path, &json)
    }
}

/// Writes `contents` to `path`, creating missing parent directories.
pub fn write_text(path: &Path, contents: &str) -> Result<(), CatalogError> {
    let to_error = |source| CatalogError::OutputWrite {
        path: path.to_owned(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(to_error)?;
    }
    fs::write(path, contents).map_err(to_error)
}

/// `<dir>/<stem>.backup.<timestamp><ext>` next to `source`
pub fn backup_path_for(source: &Path, now: DateTime<Utc>) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let timestamp = now.format("%Y-%m-%dT%H-%M-%S");
    source.with_file_name(format!("{stem}.backup.{timestamp}{ext}"))
}

/// Copies `source` byte for byte, to `explicit` if given. Returns the path
/// of the copy.
pub fn create_backup(
    source: &Path,
    explicit: Option<&Path>,
    now: DateTime<Utc>,
) -> Result<PathBuf, CatalogError> {
    let backup = match explicit {
        Some(path) => path.to_owned(),
        None => backup_path_for(source, now),
    };
    fs::copy(source, &backup).map_err(|source_error| CatalogError::Backup {
        path: source.to_owned(),
        backup: backup.clone(),
        source: source_error,
    })?;
    Ok(backup)
}

/// `merged.json` → `merged.merge-report.txt`
pub fn report_path_for(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = name.strip_suffix(".json").unwrap_or(&name);
    output.with_file_name(format!("{base}.merge-report.txt"))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::catalog::track;

    #[test]
    fn test_from_value_bare() {
        let file = CatalogFile::from_value(json!([{"name": "A"}, {"name": "B"}]));
        assert_eq!(
            file,
            CatalogFile::Bare(vec![track(json!({"name": "A"})), track(json!({"name": "B"}))]),
        );
    }

    #[test]
    fn test_from_value_wrapped() {
        let file = CatalogFile::from_value(json!({"data": [{"name": "A"}], "total": 1}));
        assert_eq!(file, CatalogFile::Wrapped(vec![track(json!({"name": "A"}))]));
    }

    #[test]
    fn test_from_value_other_shapes_are_empty() {
        assert_eq!(
            CatalogFile::from_value(json!({"items": []})),
            CatalogFile::Wrapped(vec![]),
        );
        assert_eq!(
            CatalogFile::from_value(json!({"data": "nope"})),
            CatalogFile::Wrapped(vec![]),
        );
        assert_eq!(CatalogFile::from_value(json!(3)), CatalogFile::Wrapped(vec![]));
    }

    #[test]
    fn test_with_tracks_keeps_shape() {
        let wrapped = CatalogFile::Wrapped(vec![]);
        let tracks = vec![track(json!({"name": "A"}))];
        assert_eq!(
            wrapped.with_tracks(tracks.clone()),
            CatalogFile::Wrapped(tracks.clone()),
        );
        assert_eq!(
            CatalogFile::Bare(vec![]).with_tracks(tracks.clone()),
            CatalogFile::Bare(tracks),
        );
    }

    #[test]
    fn test_to_json_string_wrapped() {
        let file = CatalogFile::Wrapped(vec![track(json!({"name": "A", "album": "X"}))]);
        assert_eq!(
            file.to_json_string().unwrap(),
            "{\n  \"data\": [\n    {\n      \"name\": \"A\",\n      \"album\": \"X\"\n    }\n  ]\n}",
        );
    }

    #[test]
    fn test_to_json_string_keeps_field_order() {
        let file = CatalogFile::Bare(vec![track(json!({"z": 1, "a": 2, "name": "A"}))]);
        assert_eq!(
            file.to_json_string().unwrap(),
            "[\n  {\n    \"z\": 1,\n    \"a\": 2,\n    \"name\": \"A\"\n  }\n]",
        );
    }

    #[test]
    fn test_load_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("main.json");
        fs::write(&input, r#"{"data": [{"name": "A", "album": "X", "custom": [1, 2]}]}"#).unwrap();

        let file = CatalogFile::load(&input).unwrap();
        assert_eq!(file.tracks().len(), 1);

        let output = dir.path().join("nested").join("out.json");
        file.save(&output).unwrap();
        let reloaded = CatalogFile::load(&output).unwrap();
        assert_eq!(reloaded, file);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = CatalogFile::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CatalogError::InputRead { .. }));
    }

    #[test]
    fn test_load_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "[{\"name\": ").unwrap();
        let err = CatalogFile::load(&path).unwrap_err();
        assert!(matches!(err, CatalogError::InputParse { ref path, .. } if path.ends_with("broken.json")));
    }

    #[test]
    fn test_backup_path_for() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(
            backup_path_for(Path::new("/music/main.json"), now),
            PathBuf::from("/music/main.backup.2024-03-05T07-08-09.json"),
        );
        assert_eq!(
            backup_path_for(Path::new("catalog"), now),
            PathBuf::from("catalog.backup.2024-03-05T07-08-09"),
        );
    }

    #[test]
    fn test_create_backup_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("main.json");
        let contents = "[ {\"name\":\"A\"} ]\n";
        fs::write(&source, contents).unwrap();

        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let backup = create_backup(&source, None, now).unwrap();
        assert_eq!(backup, dir.path().join("main.backup.2024-01-01T00-00-00.json"));
        assert_eq!(fs::read_to_string(&backup).unwrap(), contents);

        let explicit = dir.path().join("copy.json");
        assert_eq!(create_backup(&source, Some(&explicit), now).unwrap(), explicit);
        assert_eq!(fs::read_to_string(&explicit).unwrap(), contents);
    }

    #[test]
    fn test_create_backup_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_backup(&dir.path().join("missing.json"), None, Utc::now()).unwrap_err();
        assert!(matches!(err, CatalogError::Backup { .. }));
    }

    #[test]
    fn test_write_text_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();
        let err = write_text(&blocker.join("report.txt"), "x").unwrap_err();
        assert!(matches!(err, CatalogError::OutputWrite { .. }));
    }

    #[test]
    fn test_report_path_for() {
        assert_eq!(
            report_path_for(Path::new("out/merged.json")),
            PathBuf::from("out/merged.merge-report.txt"),
        );
        assert_eq!(
            report_path_for(Path::new("out/merged")),
            PathBuf::from("out/merged.merge-report.txt"),
        );
    }
}
