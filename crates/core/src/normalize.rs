//! Event normalizer: persisted session records to [`NormalizedEvent`]s.

use crate::category::Category;
use crate::content::strip_control_markup;
use crate::event::{
    deserialize_null_as_empty, deserialize_timestamp, str_field, EventPayload, NormalizedEvent,
    ProgressSubtype, SystemSubtype,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One record from the paginated session history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub role: String,
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    #[serde(default, alias = "toolCalls", skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<f64>,
    #[serde(
        default,
        deserialize_with = "deserialize_category",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<Category>,
}

/// A single tool call attached to a `tool_invocation` record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default, alias = "tool_name", alias = "toolName")]
    pub name: String,
    #[serde(default, alias = "arguments", skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(
        default,
        deserialize_with = "deserialize_category",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<Category>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRole {
    User,
    Assistant,
    ToolInvocation,
    ToolOutcome,
    System,
    Progress,
    Summary,
}

impl RecordRole {
    /// Known role names and their common aliases; `None` for anything else.
    pub fn parse(role: &str) -> Option<Self> {
        let role = role.trim().to_ascii_lowercase();
        match role.as_str() {
            "user" | "human" => Some(RecordRole::User),
            "assistant" | "agent" | "model" => Some(RecordRole::Assistant),
            "tool_invocation" | "tool_use" | "tool_call" => Some(RecordRole::ToolInvocation),
            "tool_outcome" | "tool_result" | "tool" => Some(RecordRole::ToolOutcome),
            "system" => Some(RecordRole::System),
            "progress" => Some(RecordRole::Progress),
            "summary" => Some(RecordRole::Summary),
            _ => None,
        }
    }
}

/// Stateful across records: outcomes carry the category of the latest
/// invocation as a continuity hint.
#[derive(Debug, Default)]
pub struct EventNormalizer {
    last_invocation_category: Option<Category>,
}

impl EventNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero or more events for one record, in emission order.
    pub fn normalize(&mut self, record: SessionRecord) -> Vec<NormalizedEvent> {
        let Some(role) = RecordRole::parse(&record.role) else {
            tracing::debug!(role = %record.role, "unknown session record role; dropped");
            return Vec::new();
        };

        let mut events = Vec::new();
        let timestamp = record.timestamp;

        if let Some(thinking) = record.thinking.as_deref().map(strip_control_markup)
            && !thinking.is_empty()
        {
            events.push(
                NormalizedEvent::new(EventPayload::Thinking, thinking).with_timestamp(timestamp),
            );
        }

        match role {
            RecordRole::User | RecordRole::Assistant => {
                let content = strip_control_markup(&record.content);
                if !content.is_empty() {
                    let payload = if role == RecordRole::User {
                        EventPayload::User
                    } else {
                        EventPayload::Assistant
                    };
                    events.push(
                        NormalizedEvent::new(payload, content)
                            .with_timestamp(timestamp)
                            .with_category_hint(record.category),
                    );
                }
            }
            RecordRole::ToolInvocation => self.push_invocations(record, &mut events),
            RecordRole::ToolOutcome => {
                let content = strip_control_markup(&record.content);
                if !content.is_empty() {
                    events.push(
                        NormalizedEvent::new(EventPayload::ToolOutcome, content)
                            .with_timestamp(timestamp)
                            .with_category_hint(self.last_invocation_category)
                            .with_metadata(record.metadata),
                    );
                }
            }
            RecordRole::System => {
                let subtype = SystemSubtype::from_metadata(record.metadata.as_ref());
                let hint = record.category.or_else(|| subtype.implied_category());
                events.push(
                    NormalizedEvent::new(EventPayload::System(subtype), record.content)
                        .with_timestamp(timestamp)
                        .with_category_hint(hint)
                        .with_metadata(record.metadata),
                );
            }
            RecordRole::Progress => {
                let subtype = ProgressSubtype::from_metadata(record.metadata.as_ref());
                events.push(
                    NormalizedEvent::new(EventPayload::Progress(subtype), record.content)
                        .with_timestamp(timestamp)
                        .with_category_hint(record.category)
                        .with_metadata(record.metadata),
                );
            }
            RecordRole::Summary => {
                let content = if record.content.trim().is_empty() {
                    record
                        .metadata
                        .as_ref()
                        .and_then(|meta| str_field(meta, &["summary"]))
                        .unwrap_or_default()
                } else {
                    record.content
                };
                events.push(
                    NormalizedEvent::new(EventPayload::Summary, content)
                        .with_timestamp(timestamp)
                        .with_category_hint(record.category)
                        .with_metadata(record.metadata),
                );
            }
        }

        events
    }

    fn push_invocations(&mut self, record: SessionRecord, events: &mut Vec<NormalizedEvent>) {
        let timestamp = record.timestamp;

        if record.tool_calls.is_empty() {
            let category = record.category.unwrap_or(Category::Builtin);
            self.last_invocation_category = Some(category);
            let input = (!record.content.is_empty()).then(|| Value::String(record.content.clone()));
            events.push(
                NormalizedEvent::new(
                    EventPayload::ToolInvocation {
                        tool_name: "tool".to_string(),
                        input,
                    },
                    record.content,
                )
                .with_timestamp(timestamp)
                .with_category_hint(Some(category))
                .with_metadata(record.metadata),
            );
            return;
        }

        for call in record.tool_calls {
            let name = if call.name.trim().is_empty() {
                "tool".to_string()
            } else {
                call.name
            };
            let category = call.category.unwrap_or(Category::Builtin);
            self.last_invocation_category = Some(category);
            events.push(
                NormalizedEvent::new(
                    EventPayload::ToolInvocation {
                        tool_name: name,
                        input: call.input,
                    },
                    "",
                )
                .with_timestamp(timestamp)
                .with_category_hint(Some(category)),
            );
        }
    }
}

/// Normalize a page of records in order.
pub fn normalize_records<I>(records: I) -> Vec<NormalizedEvent>
where
    I: IntoIterator<Item = SessionRecord>,
{
    let mut normalizer = EventNormalizer::new();
    records
        .into_iter()
        .flat_map(|record| normalizer.normalize(record))
        .collect()
}

/// Unknown category tags are ignored rather than failing the record.
fn deserialize_category<'de, D>(deserializer: D) -> Result<Option<Category>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|tag| tag.parse().ok()))
}
