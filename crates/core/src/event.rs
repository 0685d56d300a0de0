use crate::category::Category;
use chrono::DateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Discriminator of a [`NormalizedEvent`]. Closed and exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    User,
    Assistant,
    Thinking,
    ToolInvocation,
    ToolOutcome,
    System,
    Progress,
    Summary,
    Hook,
    Error,
}

/// Typed view of a `system` event's `metadata.subtype`.
#[derive(Debug, Clone, PartialEq)]
pub enum SystemSubtype {
    CompactBoundary,
    TurnDuration { duration_ms: Option<u64> },
    ApiError { message: Option<String> },
    LocalCommand,
    Informational,
    FileHistorySnapshot,
    QueueOperation { operation: Option<String> },
    Result,
    Other(String),
    Unspecified,
}

impl SystemSubtype {
    pub fn from_metadata(metadata: Option<&Value>) -> Self {
        let Some(subtype) = metadata.and_then(subtype_of) else {
            return SystemSubtype::Unspecified;
        };
        match subtype.as_str() {
            "compact_boundary" => SystemSubtype::CompactBoundary,
            "turn_duration" => SystemSubtype::TurnDuration {
                duration_ms: metadata.and_then(|m| u64_field(m, &["durationMs", "duration_ms"])),
            },
            "api_error" => SystemSubtype::ApiError {
                message: metadata.and_then(|m| str_field(m, &["message", "error"])),
            },
            "local_command" => SystemSubtype::LocalCommand,
            "informational" => SystemSubtype::Informational,
            "file_history_snapshot" | "file-history-snapshot" => {
                SystemSubtype::FileHistorySnapshot
            }
            "queue_operation" | "queue-operation" => SystemSubtype::QueueOperation {
                operation: metadata.and_then(|m| str_field(m, &["operation"])),
            },
            "result" => SystemSubtype::Result,
            _ => SystemSubtype::Other(subtype),
        }
    }

    /// Canonical subtype string, `None` when the record had none.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SystemSubtype::CompactBoundary => Some("compact_boundary"),
            SystemSubtype::TurnDuration { .. } => Some("turn_duration"),
            SystemSubtype::ApiError { .. } => Some("api_error"),
            SystemSubtype::LocalCommand => Some("local_command"),
            SystemSubtype::Informational => Some("informational"),
            SystemSubtype::FileHistorySnapshot => Some("file_history_snapshot"),
            SystemSubtype::QueueOperation { .. } => Some("queue_operation"),
            SystemSubtype::Result => Some("result"),
            SystemSubtype::Other(subtype) => Some(subtype.as_str()),
            SystemSubtype::Unspecified => None,
        }
    }

    /// Category implied by the subtype when the source assigned none.
    pub fn implied_category(&self) -> Option<Category> {
        match self {
            SystemSubtype::CompactBoundary => Some(Category::Context),
            SystemSubtype::FileHistorySnapshot => Some(Category::Snapshot),
            SystemSubtype::QueueOperation { .. } => Some(Category::Queue),
            SystemSubtype::Result => Some(Category::Result),
            SystemSubtype::ApiError { .. } => Some(Category::Error),
            SystemSubtype::TurnDuration { .. }
            | SystemSubtype::LocalCommand
            | SystemSubtype::Informational
            | SystemSubtype::Other(_)
            | SystemSubtype::Unspecified => None,
        }
    }
}

/// Typed view of a `progress` event's `metadata.subtype`.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressSubtype {
    Agent {
        agent_id: Option<String>,
        prompt: Option<String>,
    },
    Bash {
        command: Option<String>,
    },
    Mcp {
        server: Option<String>,
        tool: Option<String>,
    },
    HookProgress {
        hook_name: Option<String>,
        text: Option<String>,
    },
    HookEvent {
        event_name: Option<String>,
        tool_name: Option<String>,
    },
    QueueWait {
        description: Option<String>,
    },
    Unknown(String),
}

impl ProgressSubtype {
    pub fn from_metadata(metadata: Option<&Value>) -> Self {
        let Some(meta) = metadata else {
            return ProgressSubtype::Unknown("progress".to_string());
        };
        let Some(subtype) = subtype_of(meta) else {
            return ProgressSubtype::Unknown("progress".to_string());
        };
        match subtype.as_str() {
            "agent_progress" => ProgressSubtype::Agent {
                agent_id: str_field(meta, &["agentId", "agent_id"]),
                prompt: str_field(meta, &["prompt", "message", "description"]),
            },
            "bash_progress" => ProgressSubtype::Bash {
                command: str_field(meta, &["command"]),
            },
            "mcp_progress" => ProgressSubtype::Mcp {
                server: str_field(meta, &["serverName", "server_name", "server"]),
                tool: str_field(meta, &["toolName", "tool_name", "tool"]),
            },
            "hook_progress" => ProgressSubtype::HookProgress {
                hook_name: str_field(meta, &["hookName", "hook_name"]),
                text: str_field(meta, &["content", "text", "message"]),
            },
            "hook_event" => ProgressSubtype::HookEvent {
                event_name: str_field(meta, &["hookEventName", "hook_event_name", "event_name"]),
                tool_name: str_field(meta, &["toolName", "tool_name"]),
            },
            "waiting_for_task" | "queue_wait" => ProgressSubtype::QueueWait {
                description: str_field(
                    meta,
                    &["taskDescription", "task_description", "description"],
                ),
            },
            _ => ProgressSubtype::Unknown(subtype),
        }
    }
}

/// Kind-specific part of a normalized event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    User,
    Assistant,
    Thinking,
    ToolInvocation {
        tool_name: String,
        input: Option<Value>,
    },
    ToolOutcome,
    System(SystemSubtype),
    Progress(ProgressSubtype),
    Summary,
    Hook {
        tool_name: Option<String>,
        input: Option<Value>,
    },
    Error,
}

/// The unit consumed by the timeline builder.
///
/// `metadata` is carried verbatim from the source record; the typed
/// subtypes inside [`EventPayload`] are derived from it, never the reverse.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    pub payload: EventPayload,
    pub content: String,
    /// Seconds since the Unix epoch.
    pub timestamp: Option<f64>,
    pub category_hint: Option<Category>,
    pub metadata: Option<Value>,
}

impl NormalizedEvent {
    pub fn new(payload: EventPayload, content: impl Into<String>) -> Self {
        Self {
            payload,
            content: content.into(),
            timestamp: None,
            category_hint: None,
            metadata: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: Option<f64>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_category_hint(mut self, category: Option<Category>) -> Self {
        self.category_hint = category;
        self
    }

    pub fn with_metadata(mut self, metadata: Option<Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn kind(&self) -> EventKind {
        match self.payload {
            EventPayload::User => EventKind::User,
            EventPayload::Assistant => EventKind::Assistant,
            EventPayload::Thinking => EventKind::Thinking,
            EventPayload::ToolInvocation { .. } => EventKind::ToolInvocation,
            EventPayload::ToolOutcome => EventKind::ToolOutcome,
            EventPayload::System(_) => EventKind::System,
            EventPayload::Progress(_) => EventKind::Progress,
            EventPayload::Summary => EventKind::Summary,
            EventPayload::Hook { .. } => EventKind::Hook,
            EventPayload::Error => EventKind::Error,
        }
    }

    pub fn tool_name(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::ToolInvocation { tool_name, .. } => Some(tool_name),
            EventPayload::Hook { tool_name, .. } => tool_name.as_deref(),
            _ => None,
        }
    }

    /// Timestamp usable for ordering; zero and negative values mean unknown.
    pub fn ordering_key(&self) -> Option<f64> {
        known_timestamp(self.timestamp)
    }
}

/// Normalized-shape record as delivered by the live transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEvent {
    pub kind: EventKind,
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub content: String,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub timestamp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_hint: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl From<WireEvent> for NormalizedEvent {
    fn from(wire: WireEvent) -> Self {
        let payload = match wire.kind {
            EventKind::User => EventPayload::User,
            EventKind::Assistant => EventPayload::Assistant,
            EventKind::Thinking => EventPayload::Thinking,
            EventKind::ToolInvocation => EventPayload::ToolInvocation {
                tool_name: wire
                    .tool_name
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| "tool".to_string()),
                input: wire.input,
            },
            EventKind::ToolOutcome => EventPayload::ToolOutcome,
            EventKind::System => EventPayload::System(SystemSubtype::from_metadata(
                wire.metadata.as_ref(),
            )),
            EventKind::Progress => EventPayload::Progress(ProgressSubtype::from_metadata(
                wire.metadata.as_ref(),
            )),
            EventKind::Summary => EventPayload::Summary,
            EventKind::Hook => EventPayload::Hook {
                tool_name: wire.tool_name.or_else(|| {
                    wire.metadata
                        .as_ref()
                        .and_then(|m| m.get(crate::hooks::HOOK_EVENT_KEY))
                        .and_then(|record| str_field(record, &["tool_name"]))
                }),
                input: wire.input,
            },
            EventKind::Error => EventPayload::Error,
        };
        NormalizedEvent {
            payload,
            content: wire.content,
            timestamp: wire.timestamp,
            category_hint: wire.category_hint,
            metadata: wire.metadata,
        }
    }
}

// ── Field helpers ───────────────────────────────────────────────────────────

fn subtype_of(meta: &Value) -> Option<String> {
    str_field(meta, &["subtype", "type"])
}

/// First non-empty string among `keys`.
pub(crate) fn str_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        value
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn u64_field(value: &Value, keys: &[&str]) -> Option<u64> {
    keys.iter()
        .find_map(|key| value.get(key).and_then(Value::as_u64))
}

// ── Timestamps ──────────────────────────────────────────────────────────────

/// Values above this are taken to be epoch milliseconds.
const MILLIS_THRESHOLD: f64 = 100_000_000_000.0;

/// Keep only timestamps that can take part in ordering.
pub fn known_timestamp(timestamp: Option<f64>) -> Option<f64> {
    timestamp.filter(|t| t.is_finite() && *t > 0.0)
}

/// Parse epoch seconds, epoch milliseconds, or RFC 3339 into epoch seconds.
pub fn parse_timestamp(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().map(normalize_epoch),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(secs) = trimmed.parse::<f64>() {
                return Some(normalize_epoch(secs));
            }
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.timestamp_millis() as f64 / 1000.0)
        }
        _ => None,
    }
}

fn normalize_epoch(raw: f64) -> f64 {
    if raw > MILLIS_THRESHOLD {
        raw / 1000.0
    } else {
        raw
    }
}

pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(parse_timestamp))
}

pub(crate) fn deserialize_null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_follows_payload() {
        let event = NormalizedEvent::new(
            EventPayload::ToolInvocation {
                tool_name: "Read".to_string(),
                input: None,
            },
            "",
        );
        assert_eq!(event.kind(), EventKind::ToolInvocation);
        assert_eq!(event.tool_name(), Some("Read"));
        assert_eq!(
            NormalizedEvent::new(EventPayload::Error, "x").kind(),
            EventKind::Error
        );
    }

    #[test]
    fn ordering_key_treats_zero_as_unknown() {
        let event = NormalizedEvent::new(EventPayload::User, "hi").with_timestamp(Some(0.0));
        assert_eq!(event.ordering_key(), None);
        let event = event.with_timestamp(Some(12.5));
        assert_eq!(event.ordering_key(), Some(12.5));
    }

    #[test]
    fn progress_subtype_dispatch() {
        let meta = json!({"subtype": "bash_progress", "command": "ls -la"});
        assert_eq!(
            ProgressSubtype::from_metadata(Some(&meta)),
            ProgressSubtype::Bash {
                command: Some("ls -la".to_string())
            }
        );
        let meta = json!({"type": "mcp_progress", "serverName": "github", "toolName": "search"});
        assert_eq!(
            ProgressSubtype::from_metadata(Some(&meta)),
            ProgressSubtype::Mcp {
                server: Some("github".to_string()),
                tool: Some("search".to_string())
            }
        );
        let meta = json!({"subtype": "mystery"});
        assert_eq!(
            ProgressSubtype::from_metadata(Some(&meta)),
            ProgressSubtype::Unknown("mystery".to_string())
        );
        assert_eq!(
            ProgressSubtype::from_metadata(None),
            ProgressSubtype::Unknown("progress".to_string())
        );
    }

    #[test]
    fn system_subtype_dispatch_and_implied_category() {
        let meta = json!({"subtype": "compact_boundary"});
        let subtype = SystemSubtype::from_metadata(Some(&meta));
        assert_eq!(subtype, SystemSubtype::CompactBoundary);
        assert_eq!(subtype.implied_category(), Some(Category::Context));

        let meta = json!({"subtype": "turn_duration", "durationMs": 1500});
        assert_eq!(
            SystemSubtype::from_metadata(Some(&meta)),
            SystemSubtype::TurnDuration {
                duration_ms: Some(1500)
            }
        );

        let meta = json!({"subtype": "custom_notice"});
        let subtype = SystemSubtype::from_metadata(Some(&meta));
        assert_eq!(subtype.as_str(), Some("custom_notice"));
        assert_eq!(subtype.implied_category(), None);

        assert_eq!(SystemSubtype::from_metadata(None).as_str(), None);
    }

    #[test]
    fn parse_timestamp_accepts_numbers_and_rfc3339() {
        assert_eq!(parse_timestamp(&json!(1700000000)), Some(1_700_000_000.0));
        assert_eq!(
            parse_timestamp(&json!(1700000000500u64)),
            Some(1_700_000_000.5)
        );
        assert_eq!(
            parse_timestamp(&json!("2023-11-14T22:13:20Z")),
            Some(1_700_000_000.0)
        );
        assert_eq!(parse_timestamp(&json!("not a time")), None);
        assert_eq!(parse_timestamp(&json!(null)), None);
    }

    #[test]
    fn wire_event_converts_with_subtypes() {
        let wire: WireEvent = serde_json::from_value(json!({
            "kind": "progress",
            "content": null,
            "timestamp": "2023-11-14T22:13:20Z",
            "metadata": {"subtype": "bash_progress", "command": "cargo test"}
        }))
        .unwrap();
        let event = NormalizedEvent::from(wire);
        assert_eq!(event.kind(), EventKind::Progress);
        assert_eq!(event.content, "");
        assert_eq!(event.timestamp, Some(1_700_000_000.0));
        assert!(matches!(
            event.payload,
            EventPayload::Progress(ProgressSubtype::Bash { .. })
        ));
        assert_eq!(
            event.metadata,
            Some(json!({"subtype": "bash_progress", "command": "cargo test"}))
        );
    }

    #[test]
    fn wire_invocation_without_name_falls_back_to_tool() {
        let wire: WireEvent =
            serde_json::from_value(json!({"kind": "tool_invocation", "content": "x"})).unwrap();
        let event = NormalizedEvent::from(wire);
        assert_eq!(event.tool_name(), Some("tool"));
    }
}
