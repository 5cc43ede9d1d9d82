// Keysync Config Parser - TOML with Serde
// Parses platform tables and checked keys from TOML files

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use strum::IntoEnumIterator;

use crate::key::{LogicalKey, PhysicalKey};
use crate::mapping::{gtk, KeyMapping, Platform};
use crate::modifier::{CheckedKey, CheckedKeyTable};
use crate::responder::ResponderConfig;

/// Largest accepted `time_scale`: native seconds to microseconds
pub const MAX_TIME_SCALE: u64 = 1_000_000;

/// Configuration parser errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Unknown platform '{name}' (expected one of: {expected})")]
    UnknownPlatform { name: String, expected: String },

    #[error("Bit {bit:#x} is listed twice in [[{table}]]")]
    DuplicateBit { table: &'static str, bit: u32 },

    #[error("Bit 0 in [[{table}]] can never be set")]
    ZeroBit { table: &'static str },

    #[error("Invalid time_scale {0} (expected 1..={max})", max = MAX_TIME_SCALE)]
    InvalidTimeScale(u64),
}

/// Root TOML table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigToml {
    /// Platform selection
    #[serde(default)]
    pub platform: Option<PlatformToml>,

    /// Native code to physical key additions
    #[serde(default)]
    pub physical: HashMap<String, u64>,

    /// Native value to logical key additions
    #[serde(default)]
    pub logical: HashMap<String, u64>,

    /// Modifier bits, replacing the platform's when present
    #[serde(default)]
    pub modifier: Vec<CheckedKeyToml>,

    /// Lock bits, replacing the platform's when present
    #[serde(default)]
    pub lock: Vec<CheckedKeyToml>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformToml {
    /// "gtk" or "generic"
    pub name: Option<String>,
    /// Plane for ids generated from unknown native codes
    pub plane: Option<u64>,
    /// Microseconds per native time unit
    pub time_scale: Option<u64>,
}

/// One `[[modifier]]` or `[[lock]]` entry
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckedKeyToml {
    pub bit: u32,
    pub primary_physical: u64,
    pub primary_logical: u64,
    pub secondary_logical: Option<u64>,
    #[serde(default)]
    pub caps_lock: bool,
}

impl CheckedKeyToml {
    fn to_checked_key(&self) -> CheckedKey {
        CheckedKey {
            primary_logical_key: LogicalKey(self.primary_logical),
            primary_physical_key: PhysicalKey(self.primary_physical),
            secondary_logical_key: self.secondary_logical.map(LogicalKey),
            is_caps_lock: self.caps_lock,
        }
    }
}

/// Validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub platform: Platform,
    /// Overrides the platform plane
    pub plane: Option<u64>,
    /// Overrides the platform time scale
    pub time_scale: Option<u64>,
    pub physical: Vec<(u32, PhysicalKey)>,
    pub logical: Vec<(u32, LogicalKey)>,
    /// `None` keeps the platform's modifier table
    pub modifiers: Option<CheckedKeyTable>,
    /// `None` keeps the platform's lock table
    pub locks: Option<CheckedKeyTable>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            platform: Platform::Gtk,
            plane: None,
            time_scale: None,
            physical: vec![],
            logical: vec![],
            modifiers: None,
            locks: None,
        }
    }
}

impl Config {
    /// Parse a TOML configuration file
    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let toml_config: ConfigToml =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;
        toml_config.to_config()
    }

    /// Default config location, `~/.config/keysync/keysync.toml` on Linux
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("keysync").join("keysync.toml"))
    }

    /// Load the file at [`default_path`](Self::default_path), or the
    /// defaults if there is none
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_toml_path(path),
            _ => Ok(Self::default()),
        }
    }

    /// Build the tables a responder runs on
    pub fn to_responder_config(&self) -> ResponderConfig {
        let mut mapping = KeyMapping::for_platform(self.platform);
        if let Some(plane) = self.plane {
            mapping = mapping.with_plane(plane);
        }
        if let Some(time_scale) = self.time_scale {
            mapping = mapping.with_time_scale(time_scale);
        }
        for &(code, key) in &self.physical {
            mapping.insert_physical(code, key);
        }
        for &(value, key) in &self.logical {
            mapping.insert_logical(value, key);
        }

        let (default_modifiers, default_locks) = match self.platform {
            Platform::Gtk => (gtk::modifier_checked_keys(), gtk::lock_checked_keys()),
            Platform::Generic => (CheckedKeyTable::new(), CheckedKeyTable::new()),
        };

        log::debug!(
            "responder config: platform={} physical+{} logical+{}",
            self.platform,
            self.physical.len(),
            self.logical.len()
        );

        ResponderConfig {
            mapping,
            modifiers: self.modifiers.clone().unwrap_or(default_modifiers),
            locks: self.locks.clone().unwrap_or(default_locks),
        }
    }
}

impl ConfigToml {
    /// Convert parsed TOML to internal Config structure
    fn to_config(&self) -> Result<Config, ConfigError> {
        let mut config = Config::default();

        if let Some(platform) = &self.platform {
            if let Some(name) = &platform.name {
                config.platform = parse_platform(name)?;
            }
            config.plane = platform.plane;
            if let Some(time_scale) = platform.time_scale {
                if time_scale == 0 || time_scale > MAX_TIME_SCALE {
                    return Err(ConfigError::InvalidTimeScale(time_scale));
                }
            }
            config.time_scale = platform.time_scale;
        }

        for (code, &id) in &self.physical {
            config.physical.push((parse_number(code)?, PhysicalKey(id)));
        }
        for (value, &id) in &self.logical {
            config.logical.push((parse_number(value)?, LogicalKey(id)));
        }
        // HashMap order is arbitrary
        config.physical.sort();
        config.logical.sort();

        if !self.modifier.is_empty() {
            config.modifiers = Some(checked_key_table("modifier", &self.modifier)?);
        }
        if !self.lock.is_empty() {
            config.locks = Some(checked_key_table("lock", &self.lock)?);
        }

        Ok(config)
    }
}

fn parse_platform(name: &str) -> Result<Platform, ConfigError> {
    Platform::from_str(&name.to_lowercase()).map_err(|_| ConfigError::UnknownPlatform {
        name: name.to_string(),
        expected: Platform::iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

fn checked_key_table(table: &'static str, entries: &[CheckedKeyToml]) -> Result<CheckedKeyTable, ConfigError> {
    let mut keys = CheckedKeyTable::new();
    for entry in entries {
        if entry.bit == 0 {
            return Err(ConfigError::ZeroBit { table });
        }
        if keys.insert(entry.bit, entry.to_checked_key()).is_some() {
            return Err(ConfigError::DuplicateBit {
                table,
                bit: entry.bit,
            });
        }
    }
    Ok(keys)
}

/// Parse a decimal or `0x` hexadecimal table key
pub fn parse_number(s: &str) -> Result<u32, ConfigError> {
    let trimmed = s.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => trimmed.parse::<u32>(),
    };
    parsed.map_err(|_| ConfigError::InvalidNumber(s.to_string()))
}
