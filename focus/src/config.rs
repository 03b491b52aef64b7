use anyhow::{Context, Result};
use directories::ProjectDirs;
use focus_core::{EditPolicy, PhaseDurations};
use ratatui::style::Color;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Environment variables that switch on second-scale phases when set to `dev`.
const DEV_ENV_VARS: [&str; 2] = ["FOCUS_ENV", "ENV"];

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub timer: TimerConfig,
    pub alerts: AlertConfig,
    pub theme: Theme,
    pub icons: Icons,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TimerConfig {
    pub work_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    pub edit_policy: EditPolicy,
    pub dev_mode: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AlertConfig {
    pub sound: bool,
    pub notifications: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Theme {
    #[serde(deserialize_with = "hex_to_color")]
    pub background: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub foreground: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub black: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub green: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub yellow: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub blue: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub magenta: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub gray: Color,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Icons {
    pub running: String,
    pub paused: String,
    pub separator: String,
}

impl Config {
    /// Phase lengths to start the timer with. Dev mode wins over minutes.
    pub fn durations(&self) -> Result<PhaseDurations> {
        if self.timer.dev_mode {
            return Ok(PhaseDurations::dev());
        }
        PhaseDurations::from_minutes(
            self.timer.work_minutes,
            self.timer.short_break_minutes,
            self.timer.long_break_minutes,
        )
        .context("Invalid [timer] durations in config")
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if DEV_ENV_VARS
            .iter()
            .any(|var| lookup(var).is_some_and(|value| value.eq_ignore_ascii_case("dev")))
        {
            self.timer.dev_mode = true;
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            edit_policy: EditPolicy::Digit,
            dev_mode: false,
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            sound: true,
            notifications: true,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Rgb(9, 14, 19),
            foreground: Color::Rgb(197, 201, 199),
            black: Color::Rgb(13, 12, 12),
            green: Color::Rgb(138, 154, 123),
            yellow: Color::Rgb(196, 178, 138),
            blue: Color::Rgb(127, 180, 202),
            magenta: Color::Rgb(162, 146, 163),
            gray: Color::Rgb(110, 112, 110),
        }
    }
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            running: "▶".to_string(),
            paused: "⏸".to_string(),
            separator: "│".to_string(),
        }
    }
}

fn hex_to_color<'de, D>(deserializer: D) -> Result<Color, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = serde::Deserialize::deserialize(deserializer)?;
    let hex = s
        .strip_prefix('#')
        .filter(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .ok_or_else(|| serde::de::Error::custom("invalid hex color format"))?;
    let rgb = u32::from_str_radix(hex, 16).map_err(serde::de::Error::custom)?;
    Ok(Color::Rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8))
}

/// Reads `focus.toml` from the platform config directory, then applies
/// environment overrides. A missing file means defaults. Variables from a
/// `.env` file in the working directory apply unless the process
/// environment already sets them.
pub fn load_config() -> Result<Config> {
    let mut config = match ProjectDirs::from("com", "focus", "focus") {
        Some(proj_dirs) => load_config_from(&proj_dirs.config_dir().join("focus.toml"))?,
        None => Config::default(),
    };
    let dotenv = read_dotenv(Path::new(".env"));
    config.apply_env(|var| std::env::var(var).ok().or_else(|| dotenv.get(var).cloned()));
    Ok(config)
}

/// Variables from a dotenv file; empty when the file is missing.
fn read_dotenv(path: &Path) -> HashMap<String, String> {
    let Ok(entries) = dotenvy::from_path_iter(path) else {
        return HashMap::new();
    };
    entries
        .filter_map(|entry| match entry {
            Ok(pair) => Some(pair),
            Err(e) => {
                warn!(path = %path.display(), "skipping bad .env line: {}", e);
                None
            }
        })
        .collect()
}

fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {:?}", path))?;
    toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file at {:?}", path))
}
