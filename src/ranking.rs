use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::catalog::Track;

/// Numbers as-is, numeric strings parsed, anything else 0
fn count_of(entry: &Map<String, Value>) -> f64 {
    let count = match entry.get("count") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => Some(0.0),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    count.filter(|c| !c.is_nan()).unwrap_or(0.0)
}

fn name_of(entry: &Map<String, Value>) -> Cow<'_, str> {
    match entry.get("name") {
        Some(Value::String(s)) => Cow::Borrowed(s),
        Some(Value::Null) | None => Cow::Borrowed(""),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

fn by_count_then_name(a: &Map<String, Value>, b: &Map<String, Value>) -> Ordering {
    count_of(b)
        .total_cmp(&count_of(a))
        .then_with(|| name_of(a).cmp(&name_of(b)))
}

/// Shallow-merges entries of both lists that share an `id`, later fields
/// winning, then ranks them by `count` descending and `name` ascending.
///
/// Entries that are not objects or have no `id` are dropped. An id keeps the
/// position where it was first seen, which only matters for full ties.
pub fn combine_by_id(primary: &[Track], secondary: &[Track]) -> Vec<Track> {
    let mut entries: Vec<Map<String, Value>> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for track in primary.iter().chain(secondary) {
        let Some(object) = track.as_value().as_object() else {
            continue;
        };
        let Some(id) = object.get("id").filter(|id| !id.is_null()) else {
            continue;
        };
        // JSON text keeps `1` and `"1"` apart
        let key = id.to_string();
        match positions.get(&key) {
            Some(&i) => entries[i].extend(object.clone()),
            None => {
                positions.insert(key, entries.len());
                entries.push(object.clone());
            }
        }
    }

    entries.sort_by(by_count_then_name);
    entries
        .into_iter()
        .map(|entry| Track::new(Value::Object(entry)))
        .collect()
}
