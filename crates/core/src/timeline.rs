//! Timeline builder: reduces an ordered stream of normalized events into
//! turn markers and action items.
//!
//! Tool invocations are paired with outcomes through a LIFO stack of open
//! invocations. Pairing is positional, not by name or id: an outcome always
//! resolves the most recently opened invocation. An outcome arriving with no
//! open invocation is dropped.
//!
//! An open invocation lives on the stack, not in the output. Its output slot
//! is reserved when it opens; resolving it moves the action off the stack and
//! writes the resolved form into that slot.

use crate::category::Category;
use crate::classify::classify_tool_name;
use crate::content::{first_line, strip_control_markup, truncate_chars};
use crate::event::{
    known_timestamp, EventPayload, NormalizedEvent, ProgressSubtype, SystemSubtype,
};
use crate::label::tool_label;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Display limits used while building items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineConfig {
    pub turn_clip_chars: usize,
    pub label_max_chars: usize,
    pub shell_label_chars: usize,
    pub task_label_chars: usize,
    pub summary_label_max_chars: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            turn_clip_chars: 200,
            label_max_chars: 80,
            shell_label_chars: 60,
            task_label_chars: 50,
            summary_label_max_chars: 80,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

/// Start of a conversational exchange. Never paired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnMarker {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub id: u64,
    pub timestamp: Option<f64>,
    pub category: Category,
    pub tool_name: String,
    pub label: String,
    pub status: ActionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ActionItem {
    pub fn is_pending(&self) -> bool {
        self.status == ActionStatus::Pending
    }

    /// Pending to resolved. Consumes the pending form.
    fn resolve(self, output: String, status: ActionStatus, duration_ms: Option<u64>) -> Self {
        debug_assert!(self.is_pending());
        Self {
            output: Some(output),
            status,
            duration_ms,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimelineItem {
    Turn(TurnMarker),
    Action(ActionItem),
}

impl TimelineItem {
    pub fn as_action(&self) -> Option<&ActionItem> {
        match self {
            TimelineItem::Action(action) => Some(action),
            TimelineItem::Turn(_) => None,
        }
    }

    pub fn timestamp(&self) -> Option<f64> {
        match self {
            TimelineItem::Turn(turn) => turn.timestamp,
            TimelineItem::Action(action) => action.timestamp,
        }
    }
}

/// True when a tool outcome's text reports a failure.
pub fn is_error_output(content: &str) -> bool {
    content.starts_with("Error:")
        || content.starts_with("FAILED")
        || content.contains("exit code")
        || content.contains("Command failed")
}

/// Milliseconds between two known timestamps, rounded, never negative.
fn elapsed_ms(started: Option<f64>, finished: Option<f64>) -> Option<u64> {
    let (started, finished) = (known_timestamp(started)?, known_timestamp(finished)?);
    Some(((finished - started) * 1000.0).round().max(0.0) as u64)
}

enum Slot {
    Filled(TimelineItem),
    Open,
}

struct OpenInvocation {
    slot: usize,
    action: ActionItem,
}

/// Incremental builder; feed events in order with [`TimelineBuilder::push`].
pub struct TimelineBuilder<'a> {
    config: &'a TimelineConfig,
    slots: Vec<Slot>,
    open: Vec<OpenInvocation>,
    next_id: u64,
}

impl<'a> TimelineBuilder<'a> {
    pub fn new(config: &'a TimelineConfig) -> Self {
        Self {
            config,
            slots: Vec::new(),
            open: Vec::new(),
            next_id: 1,
        }
    }

    /// Number of tool invocations still waiting for an outcome.
    pub fn open_invocations(&self) -> usize {
        self.open.len()
    }

    pub fn push(&mut self, event: NormalizedEvent) {
        let NormalizedEvent {
            payload,
            content,
            timestamp,
            category_hint,
            metadata,
        } = event;

        match payload {
            EventPayload::User => self.push_turn(TurnRole::User, &content, timestamp),
            EventPayload::Assistant => self.push_turn(TurnRole::Assistant, &content, timestamp),
            EventPayload::Thinking => {
                let label = self.line_label(&content, "Thinking");
                let action = self.action(
                    timestamp,
                    Category::System,
                    "thinking",
                    label,
                    ActionStatus::Success,
                );
                self.push_action(ActionItem {
                    output: Some(content),
                    ..action
                });
            }
            EventPayload::ToolInvocation { tool_name, input } => {
                let category = category_hint.unwrap_or_else(|| classify_tool_name(&tool_name));
                let label = tool_label(&tool_name, input.as_ref(), self.config);
                let action = self.action(
                    timestamp,
                    category,
                    &tool_name,
                    label,
                    ActionStatus::Pending,
                );
                self.slots.push(Slot::Open);
                self.open.push(OpenInvocation {
                    slot: self.slots.len() - 1,
                    action: ActionItem { input, ..action },
                });
            }
            EventPayload::ToolOutcome => self.resolve_outcome(content, timestamp),
            EventPayload::Progress(subtype) => {
                let (category, tool_name, label) = self.progress_parts(&subtype, &content);
                let action = self.action(
                    timestamp,
                    category,
                    &tool_name,
                    label,
                    ActionStatus::Success,
                );
                self.push_action(ActionItem {
                    input: metadata,
                    output: non_empty(content),
                    ..action
                });
            }
            EventPayload::System(subtype) => {
                let tool_name = subtype.as_str().unwrap_or("system").to_string();
                let label = self.system_label(&subtype, &content, &tool_name);
                let status = match subtype {
                    SystemSubtype::ApiError { .. } => ActionStatus::Error,
                    _ => ActionStatus::Success,
                };
                let action = self.action(
                    timestamp,
                    category_hint.unwrap_or(Category::System),
                    &tool_name,
                    label,
                    status,
                );
                self.push_action(ActionItem {
                    input: metadata,
                    output: non_empty(content),
                    ..action
                });
            }
            EventPayload::Summary => {
                let label = self.summary_label(&content);
                let action = self.action(
                    timestamp,
                    category_hint.unwrap_or(Category::Summary),
                    "summary",
                    label,
                    ActionStatus::Success,
                );
                self.push_action(ActionItem {
                    output: non_empty(content),
                    ..action
                });
            }
            EventPayload::Hook { tool_name, input } => {
                let tool_name = tool_name
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| "hook".to_string());
                let label = truncate_chars(content.trim(), self.config.label_max_chars);
                let action = self.action(
                    timestamp,
                    Category::Hook,
                    &tool_name,
                    label,
                    ActionStatus::Success,
                );
                self.push_action(ActionItem {
                    output: input.as_ref().map(render_value),
                    ..action
                });
            }
            EventPayload::Error => {
                let label = self.line_label(&content, "Error");
                let action = self.action(
                    timestamp,
                    Category::Error,
                    "Error",
                    label,
                    ActionStatus::Error,
                );
                self.push_action(ActionItem {
                    output: non_empty(content),
                    ..action
                });
            }
        }
    }

    /// Current items, open invocations shown as pending.
    pub fn snapshot(&self) -> Vec<TimelineItem> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Filled(item) => Some(item.clone()),
                Slot::Open => self
                    .open
                    .iter()
                    .find(|open| open.slot == index)
                    .map(|open| TimelineItem::Action(open.action.clone())),
            })
            .collect()
    }

    /// Finish the build. Invocations never answered stay pending.
    pub fn finish(mut self) -> Vec<TimelineItem> {
        for open in self.open.drain(..) {
            self.slots[open.slot] = Slot::Filled(TimelineItem::Action(open.action));
        }
        self.slots
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Filled(item) => Some(item),
                Slot::Open => None,
            })
            .collect()
    }

    fn push_turn(&mut self, role: TurnRole, content: &str, timestamp: Option<f64>) {
        let stripped = strip_control_markup(content);
        if stripped.is_empty() {
            return;
        }
        self.slots.push(Slot::Filled(TimelineItem::Turn(TurnMarker {
            role,
            content: truncate_chars(&stripped, self.config.turn_clip_chars),
            timestamp,
        })));
    }

    fn push_action(&mut self, action: ActionItem) {
        self.slots.push(Slot::Filled(TimelineItem::Action(action)));
    }

    fn resolve_outcome(&mut self, content: String, timestamp: Option<f64>) {
        let Some(open) = self.open.pop() else {
            tracing::debug!("tool outcome with no open invocation; dropped");
            return;
        };
        let status = if is_error_output(&content) {
            ActionStatus::Error
        } else {
            ActionStatus::Success
        };
        let duration_ms = elapsed_ms(open.action.timestamp, timestamp);
        let resolved = open.action.resolve(content, status, duration_ms);
        self.slots[open.slot] = Slot::Filled(TimelineItem::Action(resolved));
    }

    fn action(
        &mut self,
        timestamp: Option<f64>,
        category: Category,
        tool_name: &str,
        label: String,
        status: ActionStatus,
    ) -> ActionItem {
        let id = self.next_id;
        self.next_id += 1;
        ActionItem {
            id,
            timestamp,
            category,
            tool_name: tool_name.to_string(),
            label,
            status,
            input: None,
            output: None,
            duration_ms: None,
        }
    }

    fn line_label(&self, content: &str, fallback: &str) -> String {
        let line = first_line(content);
        if line.is_empty() {
            fallback.to_string()
        } else {
            truncate_chars(line, self.config.label_max_chars)
        }
    }

    fn progress_parts(
        &self,
        subtype: &ProgressSubtype,
        content: &str,
    ) -> (Category, String, String) {
        let max = self.config.label_max_chars;
        match subtype {
            ProgressSubtype::Agent { agent_id, prompt } => {
                let label = match (prompt, agent_id) {
                    (Some(prompt), _) => {
                        format!("Agent: {}", truncate_chars(first_line(prompt), max))
                    }
                    (None, Some(id)) => format!("Agent {id}"),
                    (None, None) => self.line_label(content, "Agent progress"),
                };
                (Category::Agent, "agent".to_string(), label)
            }
            ProgressSubtype::Bash { command } => {
                let label = match command {
                    Some(command) => format!(
                        "$ {}",
                        truncate_chars(first_line(command), self.config.shell_label_chars)
                    ),
                    None => self.line_label(content, "Bash progress"),
                };
                (Category::Builtin, "Bash".to_string(), label)
            }
            ProgressSubtype::Mcp { server, tool } => {
                let label = match (server, tool) {
                    (Some(server), Some(tool)) => format!("{server}/{tool}"),
                    (None, Some(tool)) => tool.clone(),
                    (Some(server), None) => server.clone(),
                    (None, None) => self.line_label(content, "MCP progress"),
                };
                let tool_name = tool.clone().unwrap_or_else(|| "mcp".to_string());
                (Category::Mcp, tool_name, label)
            }
            ProgressSubtype::HookProgress { hook_name, text } => {
                let label = match text {
                    Some(text) => truncate_chars(first_line(text), max),
                    None => self.line_label(content, "Hook progress"),
                };
                let tool_name = hook_name.clone().unwrap_or_else(|| "hook".to_string());
                (Category::HookProgress, tool_name, label)
            }
            ProgressSubtype::HookEvent {
                event_name,
                tool_name,
            } => {
                let label = match event_name {
                    Some(event_name) => format!("Hook: {event_name}"),
                    None => self.line_label(content, "Hook event"),
                };
                let tool_name = tool_name.clone().unwrap_or_else(|| "hook".to_string());
                (Category::Hook, tool_name, label)
            }
            ProgressSubtype::QueueWait { description } => {
                let label = match description {
                    Some(description) => format!("Waiting: {}", truncate_chars(description, max)),
                    None => self.line_label(content, "Waiting in queue"),
                };
                (Category::Queue, "queue".to_string(), label)
            }
            ProgressSubtype::Unknown(subtype) => {
                (Category::System, subtype.clone(), subtype.clone())
            }
        }
    }

    fn system_label(&self, subtype: &SystemSubtype, content: &str, tool_name: &str) -> String {
        if !first_line(content).is_empty() {
            return self.line_label(content, tool_name);
        }
        match subtype {
            SystemSubtype::TurnDuration {
                duration_ms: Some(ms),
            } => format!("Turn took {ms} ms"),
            SystemSubtype::ApiError {
                message: Some(message),
            } => truncate_chars(message, self.config.label_max_chars),
            SystemSubtype::QueueOperation {
                operation: Some(operation),
            } => format!("Queue: {operation}"),
            SystemSubtype::CompactBoundary => "Context compacted".to_string(),
            SystemSubtype::FileHistorySnapshot => "File snapshot".to_string(),
            _ => tool_name.to_string(),
        }
    }

    fn summary_label(&self, content: &str) -> String {
        let trimmed = content.trim();
        let is_short = !trimmed.contains('\n')
            && trimmed.chars().count() <= self.config.summary_label_max_chars;
        if trimmed.is_empty() {
            "Session summary".to_string()
        } else if is_short {
            trimmed.to_string()
        } else {
            format!(
                "Session summary ({}w)",
                trimmed.split_whitespace().count()
            )
        }
    }
}

fn non_empty(content: String) -> Option<String> {
    if content.trim().is_empty() {
        None
    } else {
        Some(content)
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_default(),
    }
}

/// Batch form of [`TimelineBuilder`].
pub fn build_timeline<I>(events: I, config: &TimelineConfig) -> Vec<TimelineItem>
where
    I: IntoIterator<Item = NormalizedEvent>,
{
    let mut builder = TimelineBuilder::new(config);
    for event in events {
        builder.push(event);
    }
    builder.finish()
}

/// Keep turn markers and the actions whose category is selected.
/// An empty selection keeps everything.
pub fn filter_by_categories<'a>(
    items: &'a [TimelineItem],
    selected: &BTreeSet<Category>,
) -> Vec<&'a TimelineItem> {
    items
        .iter()
        .filter(|item| match item {
            TimelineItem::Turn(_) => true,
            TimelineItem::Action(action) => {
                selected.is_empty() || selected.contains(&action.category)
            }
        })
        .collect()
}
