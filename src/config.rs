//! Region attachment data and persisted CLI defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

use crate::tracker::DEFAULT_DEBOUNCE_MS;

/// One synchronizable surface, as described by the host page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditableRegion {
    #[serde(alias = "section")]
    pub region_id: String,
    /// Portable markup the surface starts with.
    #[serde(default, alias = "content")]
    pub initial_content: String,
    #[serde(
        default = "default_debounce_ms",
        alias = "debounce",
        deserialize_with = "positive_debounce"
    )]
    pub debounce_ms: u64,
}

impl EditableRegion {
    pub fn new(region_id: impl Into<String>, initial_content: impl Into<String>) -> Self {
        Self {
            region_id: region_id.into(),
            initial_content: initial_content.into(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }

    #[must_use]
    pub fn with_debounce(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = if debounce_ms == 0 {
            DEFAULT_DEBOUNCE_MS
        } else {
            debounce_ms
        };
        self
    }

    /// Build from raw string attributes. A missing, non-numeric or zero
    /// debounce falls back to the default.
    pub fn from_attributes(
        section: &str,
        content: &str,
        debounce: Option<&str>,
    ) -> Self {
        Self::new(section, content).with_debounce(parse_debounce(debounce))
    }
}

const fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn positive_debounce<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let ms = u64::deserialize(deserializer)?;
    Ok(if ms == 0 { DEFAULT_DEBOUNCE_MS } else { ms })
}

/// Leading decimal digits of a raw attribute, or the default.
pub fn parse_debounce(raw: Option<&str>) -> u64 {
    raw.map(|s| {
        s.trim()
            .chars()
            .take_while(char::is_ascii_digit)
            .collect::<String>()
    })
    .and_then(|digits| digits.parse::<u64>().ok())
    .filter(|&ms| ms > 0)
    .unwrap_or(DEFAULT_DEBOUNCE_MS)
}

/// Defaults that can be saved with `--save`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub debounce_ms: Option<u64>,
    pub plain: bool,
    pub section: Option<String>,
    pub pretty: bool,
}

impl ConfigFlags {
    /// Merge with `other` taking precedence for valued flags.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            debounce_ms: other.debounce_ms.or(self.debounce_ms),
            plain: self.plain || other.plain,
            section: other.section.clone().or_else(|| self.section.clone()),
            pretty: self.pretty || other.pretty,
        }
    }
}

/// Per-user defaults file, in the platform's usual config location.
pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("draftsync").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("draftsync")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("draftsync").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("draftsync")
                .join("config");
        }
    }

    PathBuf::from(".draftsyncrc")
}

/// Working-directory defaults, layered over the global file.
pub fn local_override_path() -> PathBuf {
    PathBuf::from(".draftsyncrc")
}

/// Read saved flags. A missing file means no saved defaults.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// Write `flags` as one token group per line, creating parent directories.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# draftsync defaults (saved with --save)".to_string());
    if let Some(ms) = flags.debounce_ms {
        lines.push(format!("--debounce {ms}"));
    }
    if flags.plain {
        lines.push("--plain".to_string());
    }
    if let Some(section) = &flags.section {
        lines.push(format!("--section {section}"));
    }
    if flags.pretty {
        lines.push("--pretty".to_string());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

/// Remove saved defaults, if any.
pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the known flags out of CLI-style tokens; everything else is ignored.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token == "--plain" {
            flags.plain = true;
        } else if token == "--pretty" {
            flags.pretty = true;
        } else if token == "--debounce" {
            if let Some(next) = tokens.get(i + 1) {
                flags.debounce_ms = Some(parse_debounce(Some(next)));
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--debounce=") {
            flags.debounce_ms = Some(parse_debounce(Some(value)));
        } else if token == "--section" {
            if let Some(next) = tokens.get(i + 1) {
                flags.section = Some(next.clone());
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--section=") {
            flags.section = Some(value.to_string());
        }
        i += 1;
    }
    flags
}
