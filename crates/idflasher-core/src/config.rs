//! Provisioning profile
//!
//! Defaults match a stock ESP32 dev board: application image at `0x10000`
//! and the serial record at `0x9000`, written at 921600 baud. A profile file
//! in TOML overrides any of them:
//!
//! ```toml
//! [tool]
//! path = "/opt/esptool/esptool.py"
//!
//! [target]
//! chip = "esp32"
//! baud = 921600
//! firmware_offset = 0x10000
//! serial_offset = "0x9000"
//! ```

use crate::error::{Error, Result};
use crate::tool::FlashTool;
use std::fs;
use std::path::{Path, PathBuf};

/// Chip family passed to `--chip`
pub const DEFAULT_CHIP: &str = "esp32";
/// Baud rate passed to `--baud`
pub const DEFAULT_BAUD: u32 = 921_600;
/// Flash offset of the application image
pub const FIRMWARE_OFFSET: u32 = 0x10000;
/// Flash offset of the serial record
pub const SERIAL_RECORD_OFFSET: u32 = 0x9000;

/// Where and how payloads are written on the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    pub chip: String,
    pub baud: u32,
    pub firmware_offset: u32,
    pub serial_offset: u32,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            chip: DEFAULT_CHIP.to_string(),
            baud: DEFAULT_BAUD,
            firmware_offset: FIRMWARE_OFFSET,
            serial_offset: SERIAL_RECORD_OFFSET,
        }
    }
}

/// Complete provisioning profile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Explicit tool path, skipping the `PATH` lookup
    pub tool: Option<PathBuf>,
    pub target: TargetConfig,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfigFile {
    #[serde(default)]
    tool: TomlTool,
    #[serde(default)]
    target: TomlTarget,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlTool {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlTarget {
    chip: Option<String>,
    baud: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_hex_u32")]
    firmware_offset: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_hex_u32")]
    serial_offset: Option<u32>,
}

/// Deserialize a u32 that can be hex (0x...) or decimal
fn deserialize_hex_u32<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum HexOrInt {
        Int(u32),
        Str(String),
    }

    match HexOrInt::deserialize(deserializer)? {
        HexOrInt::Int(n) => Ok(Some(n)),
        HexOrInt::Str(s) => parse_number(&s).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Parse a number that can be hex (0x...) or decimal
pub fn parse_number(s: &str) -> std::result::Result<u32, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("invalid hex: {}", e))
    } else {
        s.parse().map_err(|e| format!("invalid number: {}", e))
    }
}

impl Config {
    /// Load a profile from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded profile from {}", path.display());
        Ok(config)
    }

    /// Parse a profile from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: TomlConfigFile = toml::from_str(content)?;
        let defaults = TargetConfig::default();

        let config = Config {
            tool: file.tool.path,
            target: TargetConfig {
                chip: file.target.chip.unwrap_or(defaults.chip),
                baud: file.target.baud.unwrap_or(defaults.baud),
                firmware_offset: file.target.firmware_offset.unwrap_or(defaults.firmware_offset),
                serial_offset: file.target.serial_offset.unwrap_or(defaults.serial_offset),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the flashing tool could never accept
    pub fn validate(&self) -> Result<()> {
        if self.target.chip.trim().is_empty() {
            return Err(Error::InvalidConfig {
                field: "target.chip",
                reason: "must not be empty".to_string(),
            });
        }
        if self.target.baud == 0 {
            return Err(Error::InvalidConfig {
                field: "target.baud",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.target.firmware_offset == self.target.serial_offset {
            return Err(Error::InvalidConfig {
                field: "target.serial_offset",
                reason: format!(
                    "0x{:X} collides with the firmware offset",
                    self.target.serial_offset
                ),
            });
        }
        Ok(())
    }

    /// The tool to run: the configured path, or the process-wide lookup
    pub fn flash_tool(&self) -> FlashTool {
        match &self.tool {
            Some(path) => FlashTool::Executable(path.clone()),
            None => FlashTool::system().clone(),
        }
    }
}
