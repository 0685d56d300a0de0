use crate::event::{EventPayload, NormalizedEvent, ProgressSubtype, SystemSubtype};
use crate::hooks::HookEventRecord;
use crate::normalize::SessionRecord;
use serde_json::{json, Value};

pub fn user(text: &str) -> NormalizedEvent {
    NormalizedEvent::new(EventPayload::User, text)
}

pub fn assistant(text: &str) -> NormalizedEvent {
    NormalizedEvent::new(EventPayload::Assistant, text)
}

pub fn thinking(text: &str) -> NormalizedEvent {
    NormalizedEvent::new(EventPayload::Thinking, text)
}

/// Tool invocation with structured input and no category hint.
pub fn invocation(tool_name: &str, input: Value) -> NormalizedEvent {
    NormalizedEvent::new(
        EventPayload::ToolInvocation {
            tool_name: tool_name.to_string(),
            input: Some(input),
        },
        "",
    )
}

pub fn outcome(text: &str) -> NormalizedEvent {
    NormalizedEvent::new(EventPayload::ToolOutcome, text)
}

/// Progress event whose subtype is read from `metadata`.
pub fn progress(metadata: Value) -> NormalizedEvent {
    let subtype = ProgressSubtype::from_metadata(Some(&metadata));
    NormalizedEvent::new(EventPayload::Progress(subtype), "").with_metadata(Some(metadata))
}

pub fn system(text: &str, metadata: Value) -> NormalizedEvent {
    let subtype = SystemSubtype::from_metadata(Some(&metadata));
    NormalizedEvent::new(EventPayload::System(subtype), text).with_metadata(Some(metadata))
}

pub fn summary(text: &str) -> NormalizedEvent {
    NormalizedEvent::new(EventPayload::Summary, text)
}

/// Session record with only role and content set.
pub fn record(role: &str, content: &str) -> SessionRecord {
    SessionRecord {
        role: role.to_string(),
        content: content.to_string(),
        ..SessionRecord::default()
    }
}

/// Hook record built from its raw JSON form.
pub fn hook_record(
    id: &str,
    timestamp: Option<f64>,
    event_name: &str,
    label: &str,
) -> HookEventRecord {
    let mut raw = json!({"id": id, "event_name": event_name, "label": label});
    if let Some(timestamp) = timestamp {
        raw["timestamp"] = json!(timestamp);
    }
    HookEventRecord {
        id: id.to_string(),
        timestamp,
        event_name: event_name.to_string(),
        tool_name: None,
        label: label.to_string(),
        group: String::new(),
        context: None,
        raw,
    }
}
