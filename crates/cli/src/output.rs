use chrono::{DateTime, Utc};
use sessionlens_core::timeline::{ActionStatus, TimelineItem, TurnRole};
use sessionlens_runtime_config::{OutputFormatSetting, OutputSettings};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// The command-line flag wins over the configured default.
    pub fn resolve(flag: Option<OutputFormat>, settings: &OutputSettings) -> Self {
        flag.unwrap_or(match settings.format {
            OutputFormatSetting::Text => OutputFormat::Text,
            OutputFormatSetting::Json => OutputFormat::Json,
        })
    }
}

/// `HH:MM:SS` in UTC, or a placeholder when the time is unknown.
pub fn format_clock(timestamp: Option<f64>) -> String {
    timestamp
        .filter(|t| t.is_finite() && *t > 0.0)
        .and_then(|t| DateTime::<Utc>::from_timestamp_millis((t * 1000.0).round() as i64))
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

/// One display line per timeline item.
pub fn render_item_line(item: &TimelineItem, show_timestamps: bool) -> String {
    let mut line = String::new();
    if show_timestamps {
        line.push_str(&format_clock(item.timestamp()));
        line.push(' ');
    }
    match item {
        TimelineItem::Turn(turn) => {
            let role = match turn.role {
                TurnRole::User => "user",
                TurnRole::Assistant => "assistant",
            };
            let content = turn.content.replace('\n', " ");
            line.push_str(&format!("{role:<13} > {content}"));
        }
        TimelineItem::Action(action) => {
            let status = match action.status {
                ActionStatus::Pending => "pending",
                ActionStatus::Success => "ok",
                ActionStatus::Error => "error",
            };
            line.push_str(&format!(
                "{:<13} {status:<7} {}",
                action.category.as_str(),
                action.label
            ));
            if let Some(ms) = action.duration_ms {
                line.push_str(&format!(" ({ms} ms)"));
            }
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use sessionlens_core::testing;
    use sessionlens_core::{build_timeline, TimelineConfig};
    use serde_json::json;

    #[test]
    fn flag_overrides_configured_format() {
        let settings = OutputSettings {
            format: OutputFormatSetting::Json,
            show_timestamps: true,
        };
        assert_eq!(OutputFormat::resolve(None, &settings), OutputFormat::Json);
        assert_eq!(
            OutputFormat::resolve(Some(OutputFormat::Text), &settings),
            OutputFormat::Text
        );
    }

    #[test]
    fn clock_formats_known_and_unknown_times() {
        assert_eq!(format_clock(Some(1_700_000_000.0)), "22:13:20");
        assert_eq!(format_clock(Some(0.0)), "--:--:--");
        assert_eq!(format_clock(None), "--:--:--");
    }

    #[test]
    fn action_line_shows_category_status_and_duration() {
        let items = build_timeline(
            vec![
                testing::invocation("Bash", json!({"command": "cargo build"}))
                    .with_timestamp(Some(10.0)),
                testing::outcome("Finished").with_timestamp(Some(12.0)),
            ],
            &TimelineConfig::default(),
        );
        let line = render_item_line(&items[0], false);
        assert!(line.starts_with("builtin"));
        assert!(line.contains("ok"));
        assert!(line.contains("cargo build"));
        assert!(line.ends_with("(2000 ms)"));
    }

    #[test]
    fn turn_line_flattens_newlines() {
        let items = build_timeline(
            vec![testing::user("first\nsecond")],
            &TimelineConfig::default(),
        );
        let line = render_item_line(&items[0], true);
        assert!(line.starts_with("--:--:-- user"));
        assert!(line.ends_with("> first second"));
    }
}
