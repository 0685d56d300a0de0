//! Adapter from persisted hook-callback records to normalized events.

use crate::category::Category;
use crate::event::{deserialize_timestamp, EventPayload, NormalizedEvent};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Metadata key under which the original hook record is embedded.
pub const HOOK_EVENT_KEY: &str = "hook_event";

/// A hook callback as persisted by the hook-history store.
///
/// The typed fields are a read-only view; `raw` is the record exactly as it
/// was read and is what gets serialized and embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct HookEventRecord {
    pub id: String,
    pub timestamp: Option<f64>,
    pub event_name: String,
    pub tool_name: Option<String>,
    pub label: String,
    pub group: String,
    pub context: Option<Value>,
    pub raw: Value,
}

#[derive(Deserialize)]
struct HookFields {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    timestamp: Option<f64>,
    event_name: String,
    #[serde(default)]
    tool_name: Option<String>,
    #[serde(default)]
    label: String,
    #[serde(default)]
    group: String,
    #[serde(default)]
    context: Option<Value>,
}

impl HookEventRecord {
    /// Parse the typed view of `raw`, keeping `raw` untouched.
    pub fn from_raw(raw: Value) -> Result<Self, serde_json::Error> {
        let fields = HookFields::deserialize(&raw)?;
        Ok(Self {
            id: fields.id,
            timestamp: fields.timestamp,
            event_name: fields.event_name,
            tool_name: fields.tool_name,
            label: fields.label,
            group: fields.group,
            context: fields.context,
            raw,
        })
    }
}

impl<'de> Deserialize<'de> for HookEventRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Self::from_raw(raw).map_err(serde::de::Error::custom)
    }
}

impl Serialize for HookEventRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.raw.serialize(serializer)
    }
}

/// Convert hook records into `hook` events, one per record, order preserved.
pub fn adapt_hook_events(records: &[HookEventRecord]) -> Vec<NormalizedEvent> {
    records.iter().map(adapt_hook_event).collect()
}

pub fn adapt_hook_event(record: &HookEventRecord) -> NormalizedEvent {
    let mut metadata = Map::new();
    metadata.insert(HOOK_EVENT_KEY.to_string(), record.raw.clone());

    NormalizedEvent::new(
        EventPayload::Hook {
            tool_name: record.tool_name.clone(),
            input: record.context.clone(),
        },
        format!("Hook: {} — {}", record.event_name, record.label),
    )
    // Zero stands for "no timestamp"; ordering treats it as unknown.
    .with_timestamp(Some(record.timestamp.unwrap_or(0.0)))
    .with_category_hint(Some(Category::Hook))
    .with_metadata(Some(Value::Object(metadata)))
}

/// Recover the embedded hook record from a hook event's metadata.
pub fn embedded_hook_record(event: &NormalizedEvent) -> Option<HookEventRecord> {
    let raw = event.metadata.as_ref()?.get(HOOK_EVENT_KEY)?;
    HookEventRecord::from_raw(raw.clone()).ok()
}

/// Sort ascending by timestamp then id; records without a timestamp go last.
pub fn sort_hook_records(records: &mut [HookEventRecord]) {
    records.sort_by(|a, b| {
        let by_time = match (a.timestamp, b.timestamp) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_time.then_with(|| a.id.cmp(&b.id))
    });
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "hook id must be a string or number, got {other}"
        ))),
    }
}
