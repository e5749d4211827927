//! Capture configuration management

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub general: GeneralSettings,
    pub device: DeviceSettings,
    pub capture: CaptureSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    pub log_level: String,
}

/// Which device to open and how to prepare it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Device to open, VID:PID (e.g., "0x0582:0x000c")
    pub id: String,
    /// Interface holding the bulk IN endpoint
    pub interface: u8,
    #[serde(default)]
    pub alt_setting: u8,
    /// Detach an active kernel driver before claiming the interface
    #[serde(default = "DeviceSettings::default_detach")]
    pub detach_kernel_driver: bool,
}

impl DeviceSettings {
    fn default_detach() -> bool {
        true
    }

    /// Parse `id` into (vendor_id, product_id)
    pub fn vendor_product(&self) -> Result<(u16, u16)> {
        parse_device_id(&self.id)
    }
}

/// Read loop parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    #[serde(default = "CaptureSettings::default_endpoint")]
    pub endpoint: u8,
    /// Bytes requested per read
    #[serde(default = "CaptureSettings::default_length")]
    pub length: usize,
    /// Per-read timeout in milliseconds (0 or less waits indefinitely)
    #[serde(default = "CaptureSettings::default_timeout_ms")]
    pub timeout_ms: i64,
    /// Number of reads to issue
    #[serde(default = "CaptureSettings::default_reads")]
    pub reads: u32,
    /// File receiving the raw payloads; nothing is written when unset
    #[serde(default)]
    pub output: Option<String>,
    /// Record sizes to look for in each payload
    #[serde(default = "CaptureSettings::default_frame_sizes")]
    pub frame_sizes: Vec<usize>,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            endpoint: Self::default_endpoint(),
            length: Self::default_length(),
            timeout_ms: Self::default_timeout_ms(),
            reads: Self::default_reads(),
            output: None,
            frame_sizes: Self::default_frame_sizes(),
        }
    }
}

impl CaptureSettings {
    fn default_endpoint() -> u8 {
        0x81
    }

    fn default_length() -> usize {
        3120 // 10 frames of 312 bytes
    }

    fn default_timeout_ms() -> i64 {
        1000
    }

    fn default_reads() -> u32 {
        50
    }

    fn default_frame_sizes() -> Vec<usize> {
        vec![288, 312]
    }

    /// Output path with `~` expanded
    pub fn output_path(&self) -> Option<PathBuf> {
        self.output
            .as_deref()
            .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()))
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            general: GeneralSettings {
                log_level: "info".to_string(),
            },
            device: DeviceSettings {
                id: "0x0582:0x000c".to_string(),
                interface: 1,
                alt_setting: 1,
                detach_kernel_driver: DeviceSettings::default_detach(),
            },
            capture: CaptureSettings::default(),
        }
    }
}

impl CaptureConfig {
    /// Load configuration from the specified path, or from the first
    /// standard location that exists
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(p) => Self::load_file(&p),
            None => Self::load_first(&Self::candidate_paths())?
                .ok_or_else(|| anyhow!("No configuration file found, using defaults")),
        }
    }

    /// Load the standard configuration file, or return defaults if none exists.
    ///
    /// A file that exists but cannot be read, parsed, or validated is an error
    /// rather than silently replaced by the defaults.
    pub fn load_or_default() -> Result<Self> {
        match Self::load_first(&Self::candidate_paths())? {
            Some(config) => Ok(config),
            None => {
                tracing::debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn candidate_paths() -> Vec<PathBuf> {
        vec![
            Self::default_path(),
            PathBuf::from("/etc/usb-reader/capture.toml"),
        ]
    }

    /// Load the first existing file among `candidates`
    fn load_first(candidates: &[PathBuf]) -> Result<Option<Self>> {
        candidates
            .iter()
            .find(|p| p.exists())
            .map(|p| Self::load_file(p))
            .transpose()
    }

    fn load_file(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: CaptureConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", config_path.display()))?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("usb-reader").join("capture.toml")
        } else {
            PathBuf::from(".config/usb-reader/capture.toml")
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.general.log_level,
                valid_levels.join(", ")
            ));
        }

        parse_device_id(&self.device.id)?;

        if self.capture.endpoint & 0x80 == 0 {
            return Err(anyhow!(
                "Endpoint {:#04x} is not an IN endpoint (bit 7 must be set)",
                self.capture.endpoint
            ));
        }

        if self.capture.frame_sizes.contains(&0) {
            return Err(anyhow!("Frame sizes must be greater than 0"));
        }

        Ok(())
    }
}

/// Parse a device id of the form "0xVVVV:0xPPPP"
pub fn parse_device_id(id: &str) -> Result<(u16, u16)> {
    let parts: Vec<&str> = id.split(':').collect();
    if parts.len() != 2 {
        return Err(anyhow!(
            "Invalid device id '{}', expected VID:PID (e.g., '0x0582:0x000c')",
            id
        ));
    }

    Ok((parse_hex_id(parts[0], "VID")?, parse_hex_id(parts[1], "PID")?))
}

fn parse_hex_id(id: &str, name: &str) -> Result<u16> {
    let hex_part = id
        .strip_prefix("0x")
        .or_else(|| id.strip_prefix("0X"))
        .ok_or_else(|| {
            anyhow!(
                "Invalid {} '{}', must start with '0x' (e.g., '0x1234')",
                name,
                id
            )
        })?;

    if hex_part.is_empty() || hex_part.len() > 4 {
        return Err(anyhow!(
            "Invalid {} '{}', hex part must be 1-4 digits",
            name,
            id
        ));
    }

    u16::from_str_radix(hex_part, 16)
        .map_err(|_| anyhow!("Invalid {} '{}', not a valid hex number", name, id))
}

/// Parse an endpoint address given as hex ("0x81") or decimal ("129")
pub fn parse_endpoint(s: &str) -> std::result::Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|_| format!("Invalid endpoint '{}', expected e.g. 0x81", s))
}
