//! Configuration types for sessionlens.
//!
//! The CLI reads `sessionlens.toml` into [`LensConfig`]. Every field has a
//! default so partial files are accepted; file discovery lives in the CLI.

use serde::{Deserialize, Serialize};

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "sessionlens.toml";

/// Top-level configuration (persisted as `sessionlens.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LensConfig {
    #[serde(default)]
    pub timeline: TimelineSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

/// Display limits for timeline construction, in characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelineSettings {
    #[serde(default = "default_turn_clip_chars")]
    pub turn_clip_chars: usize,
    #[serde(default = "default_label_max_chars")]
    pub label_max_chars: usize,
    #[serde(default = "default_shell_label_chars")]
    pub shell_label_chars: usize,
    #[serde(default = "default_task_label_chars")]
    pub task_label_chars: usize,
    /// Summaries up to this length are shown verbatim.
    #[serde(default = "default_summary_label_max_chars")]
    pub summary_label_max_chars: usize,
    /// Deepest indentation for threaded records.
    #[serde(default = "default_thread_max_depth")]
    pub thread_max_depth: usize,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            turn_clip_chars: default_turn_clip_chars(),
            label_max_chars: default_label_max_chars(),
            shell_label_chars: default_shell_label_chars(),
            task_label_chars: default_task_label_chars(),
            summary_label_max_chars: default_summary_label_max_chars(),
            thread_max_depth: default_thread_max_depth(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormatSetting {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormatSetting,
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormatSetting::Text,
            show_timestamps: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_turn_clip_chars() -> usize {
    200
}

fn default_label_max_chars() -> usize {
    80
}

fn default_shell_label_chars() -> usize {
    60
}

fn default_task_label_chars() -> usize {
    50
}

fn default_summary_label_max_chars() -> usize {
    80
}

fn default_thread_max_depth() -> usize {
    5
}

/// Reset zero-valued limits to their defaults. Returns whether anything changed.
///
/// A zero `thread_max_depth` is a legitimate "flat" setting and is kept.
pub fn apply_compat_fallbacks(config: &mut LensConfig) -> bool {
    let mut changed = false;
    let timeline = &mut config.timeline;

    for (value, default) in [
        (&mut timeline.turn_clip_chars, default_turn_clip_chars()),
        (&mut timeline.label_max_chars, default_label_max_chars()),
        (&mut timeline.shell_label_chars, default_shell_label_chars()),
        (&mut timeline.task_label_chars, default_task_label_chars()),
        (
            &mut timeline.summary_label_max_chars,
            default_summary_label_max_chars(),
        ),
    ] {
        if *value == 0 {
            *value = default;
            changed = true;
        }
    }

    changed
}
