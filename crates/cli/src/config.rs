use anyhow::{bail, Context, Result};
use sessionlens_core::TimelineConfig;
use sessionlens_runtime_config::{
    apply_compat_fallbacks, LensConfig, TimelineSettings, CONFIG_FILE_NAME,
};
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.config/sessionlens/)
pub fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home).join(".config").join("sessionlens"))
}

/// Canonical config file path.
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the explicit config file, or the default one when it exists.
///
/// A missing default file yields defaults; a missing explicit file is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<LensConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            path.to_path_buf()
        }
        None => match config_path() {
            Ok(path) if path.exists() => path,
            _ => return Ok(LensConfig::default()),
        },
    };
    read_config(&path)
}

fn read_config(path: &Path) -> Result<LensConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    let mut config: LensConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config at {}", path.display()))?;
    if apply_compat_fallbacks(&mut config) {
        tracing::warn!(
            path = %path.display(),
            "zero-valued timeline limits replaced with defaults"
        );
    }
    Ok(config)
}

pub fn timeline_config(settings: &TimelineSettings) -> TimelineConfig {
    TimelineConfig {
        turn_clip_chars: settings.turn_clip_chars,
        label_max_chars: settings.label_max_chars,
        shell_label_chars: settings.shell_label_chars,
        task_label_chars: settings.task_label_chars,
        summary_label_max_chars: settings.summary_label_max_chars,
    }
}
