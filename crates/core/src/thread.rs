//! Indentation levels for nested replies.
//!
//! Each record walks its own parent chain; nothing is memoized across
//! records or calls, since links may change between invocations.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Deepest indentation a record can receive.
pub const MAX_THREAD_DEPTH: usize = 5;

/// Anything that can name itself and, optionally, its parent.
pub trait ThreadLink {
    fn thread_id(&self) -> Option<&str>;
    fn parent_thread_id(&self) -> Option<&str>;
}

/// Minimal `{id, parent_id}` record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "parentId", alias = "parent")]
    pub parent_id: Option<String>,
}

impl ThreadRecord {
    pub fn new(id: &str, parent_id: Option<&str>) -> Self {
        Self {
            id: Some(id.to_string()),
            parent_id: parent_id.map(str::to_string),
        }
    }
}

impl ThreadLink for ThreadRecord {
    fn thread_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn parent_thread_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadNode {
    pub id: String,
    pub parent_id: Option<String>,
    pub indent_level: usize,
    pub is_child: bool,
}

fn non_empty(id: Option<&str>) -> Option<&str> {
    id.map(str::trim).filter(|id| !id.is_empty())
}

/// Thread map capped at [`MAX_THREAD_DEPTH`].
pub fn build_thread_map<R: ThreadLink>(records: &[R]) -> HashMap<String, ThreadNode> {
    build_thread_map_with_depth(records, MAX_THREAD_DEPTH)
}

/// Map each identified record to its indentation level.
///
/// A walk stops at a parent missing from `records`, at `max_depth` hops,
/// or when it revisits an id. Records without an id are left out. When an
/// id repeats, the first record carrying it is the one consulted.
pub fn build_thread_map_with_depth<R: ThreadLink>(
    records: &[R],
    max_depth: usize,
) -> HashMap<String, ThreadNode> {
    let mut parents: HashMap<&str, Option<&str>> = HashMap::with_capacity(records.len());
    for record in records {
        if let Some(id) = non_empty(record.thread_id()) {
            parents
                .entry(id)
                .or_insert_with(|| non_empty(record.parent_thread_id()));
        }
    }

    let mut map = HashMap::with_capacity(parents.len());
    for record in records {
        let Some(id) = non_empty(record.thread_id()) else {
            continue;
        };
        if map.contains_key(id) {
            continue;
        }
        let parent_id = parents.get(id).copied().flatten();
        let indent_level = walk_depth(id, parent_id, &parents, max_depth);
        map.insert(
            id.to_string(),
            ThreadNode {
                id: id.to_string(),
                parent_id: parent_id.map(str::to_string),
                indent_level,
                is_child: indent_level > 0,
            },
        );
    }
    map
}

fn walk_depth<'a>(
    id: &'a str,
    mut parent: Option<&'a str>,
    parents: &HashMap<&'a str, Option<&'a str>>,
    max_depth: usize,
) -> usize {
    let mut visited: HashSet<&'a str> = HashSet::from([id]);
    let mut depth = 0;
    while let Some(current) = parent {
        if depth >= max_depth {
            tracing::trace!(id, depth, "thread depth capped");
            break;
        }
        let Some(next) = parents.get(current) else {
            break;
        };
        if !visited.insert(current) {
            tracing::trace!(id, revisited = current, "thread cycle");
            break;
        }
        depth += 1;
        parent = *next;
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(len: usize) -> Vec<ThreadRecord> {
        (0..len)
            .map(|i| {
                let parent = (i > 0).then(|| format!("n{}", i - 1));
                ThreadRecord::new(&format!("n{i}"), parent.as_deref())
            })
            .collect()
    }

    #[test]
    fn linear_chain_caps_at_five() {
        let map = build_thread_map(&chain(8));
        let levels: Vec<usize> = (0..8).map(|i| map[&format!("n{i}")].indent_level).collect();
        assert_eq!(levels, vec![0, 1, 2, 3, 4, 5, 5, 5]);
        assert!(!map["n0"].is_child);
        assert!(map["n7"].is_child);
        assert_eq!(map["n7"].parent_id.as_deref(), Some("n6"));
    }

    #[test]
    fn absent_parent_is_root() {
        let map = build_thread_map(&[ThreadRecord::new("a", Some("ghost"))]);
        assert_eq!(map["a"].indent_level, 0);
        assert!(!map["a"].is_child);
        assert_eq!(map["a"].parent_id.as_deref(), Some("ghost"));
    }

    #[test]
    fn mutual_cycle_terminates() {
        let records = [
            ThreadRecord::new("a", Some("b")),
            ThreadRecord::new("b", Some("a")),
        ];
        let map = build_thread_map(&records);
        assert!(map["a"].indent_level + map["b"].indent_level <= 2);
    }

    #[test]
    fn self_parent_is_root() {
        let map = build_thread_map(&[ThreadRecord::new("a", Some("a"))]);
        assert_eq!(map["a"].indent_level, 0);
    }

    #[test]
    fn records_without_id_are_excluded() {
        let records = [
            ThreadRecord::default(),
            ThreadRecord::new("", None),
            ThreadRecord::new("  ", Some("x")),
            ThreadRecord::new("kept", None),
        ];
        let map = build_thread_map(&records);
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("kept"));
    }

    #[test]
    fn first_duplicate_id_wins() {
        let records = [
            ThreadRecord::new("root", None),
            ThreadRecord::new("dup", None),
            ThreadRecord::new("dup", Some("root")),
        ];
        let map = build_thread_map(&records);
        assert_eq!(map["dup"].indent_level, 0);
    }

    #[test]
    fn custom_depth_cap() {
        let map = build_thread_map_with_depth(&chain(4), 2);
        assert_eq!(map["n3"].indent_level, 2);
    }

    #[test]
    fn thousand_records_stay_linear() {
        let records = chain(1000);
        let started = std::time::Instant::now();
        let map = build_thread_map(&records);
        assert_eq!(map.len(), 1000);
        assert_eq!(map["n999"].indent_level, MAX_THREAD_DEPTH);
        assert!(started.elapsed().as_secs_f64() < 1.0);
    }

    #[test]
    fn records_deserialize_with_aliases() {
        let record: ThreadRecord =
            serde_json::from_str(r#"{"id": "b", "parentId": "a"}"#).unwrap();
        assert_eq!(record, ThreadRecord::new("b", Some("a")));
    }
}
