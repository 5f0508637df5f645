//! TOML configuration for the bridge daemon.
//!
//! Read from `$XDG_CONFIG_HOME/bthid/config.toml`, falling back to
//! `~/.config/bthid/config.toml`.  A missing file means "all defaults".
//!
//! ```toml
//! [device]
//! name = "Rust HID Bridge"
//!
//! [bluetooth]
//! adapter = "hci0"
//!
//! [input]
//! devices = ["/dev/input/event4"]
//! grab_delay_ms = 0
//!
//! [scheduler]
//! pointer_speed = 1.5
//! ```
//!
//! # Serde default values
//!
//! Every section and every field has a default, so any subset of the file is
//! valid.  Fields annotated with `#[serde(default = "some_fn")]` take the
//! value of `some_fn()` when absent.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bthid_core::{MotionScale, ReportScheduler};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::bridge::ServiceRecord;
use crate::application::transport_session::{SessionConfig, DEFAULT_ACCEPT_RETRY};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither `XDG_CONFIG_HOME` nor `HOME` is set.
    #[error("could not determine config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The file parsed but a value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub bluetooth: BluetoothConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How the device presents itself in service discovery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    /// SDP service name; also set as the adapter alias.
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_provider")]
    pub provider: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BluetoothConfig {
    /// Adapter name such as `hci0`.  `None` uses the system default adapter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter: Option<String>,
    #[serde(default = "default_control_psm")]
    pub control_psm: u16,
    #[serde(default = "default_interrupt_psm")]
    pub interrupt_psm: u16,
    /// Power the adapter on and make it discoverable and pairable.
    #[serde(default = "default_true")]
    pub discoverable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputConfig {
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    /// Case-insensitive substring a keyboard's name must contain.
    #[serde(default = "default_keyboard_match")]
    pub keyboard_match: String,
    #[serde(default = "default_mouse_match")]
    pub mouse_match: String,
    /// Explicit device nodes.  Non-empty disables scanning and name matching.
    #[serde(default)]
    pub devices: Vec<PathBuf>,
    #[serde(default = "default_grab_delay_ms")]
    pub grab_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulerConfig {
    /// Period of the motion report tick, in microseconds.
    #[serde(default = "default_report_interval_us")]
    pub report_interval_us: u64,
    #[serde(default = "default_speed")]
    pub pointer_speed: f64,
    #[serde(default = "default_speed")]
    pub wheel_speed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_name() -> String {
    "Rust HID Bridge".to_string()
}
fn default_description() -> String {
    "Keyboard and Mouse".to_string()
}
fn default_provider() -> String {
    "bthid".to_string()
}
fn default_control_psm() -> u16 {
    0x11
}
fn default_interrupt_psm() -> u16 {
    0x13
}
fn default_true() -> bool {
    true
}
fn default_input_dir() -> PathBuf {
    PathBuf::from("/dev/input")
}
fn default_keyboard_match() -> String {
    "keyboard".to_string()
}
fn default_mouse_match() -> String {
    "mouse".to_string()
}
fn default_grab_delay_ms() -> u64 {
    2000
}
fn default_report_interval_us() -> u64 {
    1000
}
/// Largest accepted `pointer_speed` / `wheel_speed`.
pub const MAX_SPEED: f64 = 100.0;

fn default_speed() -> f64 {
    1.0
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            description: default_description(),
            provider: default_provider(),
        }
    }
}

impl Default for BluetoothConfig {
    fn default() -> Self {
        Self {
            adapter: None,
            control_psm: default_control_psm(),
            interrupt_psm: default_interrupt_psm(),
            discoverable: default_true(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            keyboard_match: default_keyboard_match(),
            mouse_match: default_mouse_match(),
            devices: Vec::new(),
            grab_delay_ms: default_grab_delay_ms(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            report_interval_us: default_report_interval_us(),
            pointer_speed: default_speed(),
            wheel_speed: default_speed(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// ── Validation and derived settings ───────────────────────────────────────────

impl AppConfig {
    /// Checks value ranges that the TOML types cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bt = &self.bluetooth;
        // L2CAP PSMs must be odd with an even upper byte.
        for (field, psm) in [("control_psm", bt.control_psm), ("interrupt_psm", bt.interrupt_psm)] {
            if psm & 0x0001 == 0 || psm & 0x0100 != 0 {
                return Err(ConfigError::Invalid(format!(
                    "bluetooth.{field} = {psm:#06x} is not a valid L2CAP PSM"
                )));
            }
        }
        if bt.control_psm == bt.interrupt_psm {
            return Err(ConfigError::Invalid(
                "bluetooth.control_psm and bluetooth.interrupt_psm must differ".into(),
            ));
        }

        let sched = &self.scheduler;
        if sched.report_interval_us == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.report_interval_us must be greater than 0".into(),
            ));
        }
        for (field, speed) in [("pointer_speed", sched.pointer_speed), ("wheel_speed", sched.wheel_speed)] {
            if !speed.is_finite() || speed <= 0.0 || speed > MAX_SPEED {
                return Err(ConfigError::Invalid(format!(
                    "scheduler.{field} = {speed} must be greater than 0 and at most {MAX_SPEED}"
                )));
            }
        }
        Ok(())
    }

    pub fn service_record(&self) -> ServiceRecord {
        ServiceRecord {
            name: self.device.name.clone(),
            description: self.device.description.clone(),
            provider: self.device.provider.clone(),
            control_psm: self.bluetooth.control_psm,
            interrupt_psm: self.bluetooth.interrupt_psm,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            scheduler: ReportScheduler::new(Duration::from_micros(self.scheduler.report_interval_us)),
            motion_scale: MotionScale {
                pointer: self.scheduler.pointer_speed,
                wheel: self.scheduler.wheel_speed,
            },
            accept_retry: DEFAULT_ACCEPT_RETRY,
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the default config file path.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when neither `XDG_CONFIG_HOME`
/// nor `HOME` is set.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok_or(ConfigError::NoPlatformConfigDir)?;
    Ok(base.join("bthid").join("config.toml"))
}

/// Loads the configuration.  Values are not range-checked here; call
/// [`AppConfig::validate`] once every override has been applied.
///
/// With `explicit = Some(path)` the file must exist.  Without it, the default
/// location is used and a missing file yields [`AppConfig::default()`].
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for unreadable files and [`ConfigError::Parse`]
/// for malformed TOML.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config_file_path()?,
    };

    let cfg = match std::fs::read_to_string(&path) {
        Ok(content) => toml::from_str::<AppConfig>(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && explicit.is_none() => {
            AppConfig::default()
        }
        Err(e) => return Err(ConfigError::Io { path, source: e }),
    };
    Ok(cfg)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bthid_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_app_config_default_uses_hid_psms() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.bluetooth.control_psm, 0x11);
        assert_eq!(cfg.bluetooth.interrupt_psm, 0x13);
        assert!(cfg.bluetooth.adapter.is_none());
    }

    #[test]
    fn test_app_config_default_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_session_config_ticks_every_millisecond() {
        let session = AppConfig::default().session_config();
        assert_eq!(session.scheduler.interval(), Duration::from_millis(1));
        assert_eq!(session.motion_scale, MotionScale::default());
    }

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_empty_toml_yields_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        // Arrange
        let toml_str = r#"
[scheduler]
pointer_speed = 2.5

[input]
devices = ["/dev/input/event4"]
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.scheduler.pointer_speed, 2.5);
        assert_eq!(cfg.scheduler.wheel_speed, 1.0);
        assert_eq!(cfg.scheduler.report_interval_us, 1000);
        assert_eq!(cfg.input.devices, vec![PathBuf::from("/dev/input/event4")]);
        assert_eq!(cfg.input.keyboard_match, "keyboard");
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let mut cfg = AppConfig::default();
        cfg.bluetooth.adapter = Some("hci1".into());
        cfg.device.name = "Desk Bridge".into();

        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: AppConfig = toml::from_str(&text).expect("deserialize");

        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_service_record_reflects_device_and_psms() {
        let mut cfg = AppConfig::default();
        cfg.device.name = "Desk Bridge".into();

        let record = cfg.service_record();

        assert_eq!(record.name, "Desk Bridge");
        assert_eq!(record.control_psm, 0x11);
        assert_eq!(record.interrupt_psm, 0x13);
    }

    // ── Validation ────────────────────────────────────────────────────────────

    #[test]
    fn test_zero_report_interval_is_invalid() {
        let mut cfg = AppConfig::default();
        cfg.scheduler.report_interval_us = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_non_positive_or_nan_speed_is_invalid() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e308, MAX_SPEED + 0.5] {
            let mut cfg = AppConfig::default();
            cfg.scheduler.wheel_speed = bad;
            assert!(cfg.validate().is_err(), "wheel_speed {bad} must be rejected");
        }
    }

    #[test]
    fn test_speed_at_upper_bound_is_valid() {
        let mut cfg = AppConfig::default();
        cfg.scheduler.pointer_speed = MAX_SPEED;
        cfg.scheduler.wheel_speed = 0.25;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_even_psm_is_invalid() {
        let mut cfg = AppConfig::default();
        cfg.bluetooth.control_psm = 0x12;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_identical_psms_are_invalid() {
        let mut cfg = AppConfig::default();
        cfg.bluetooth.interrupt_psm = cfg.bluetooth.control_psm;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    // ── Loading ───────────────────────────────────────────────────────────────

    #[test]
    fn test_load_config_from_explicit_path() {
        // Arrange
        let path = temp_config("[logging]\nlog_level = \"debug\"\n");

        // Act
        let cfg = load_config(Some(&path)).expect("load");

        // Assert
        assert_eq!(cfg.logging.log_level, "debug");
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_load_config_missing_explicit_path_is_io_error() {
        let path = PathBuf::from("/nonexistent/path/that/cannot/exist/config.toml");
        assert!(matches!(load_config(Some(&path)), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_config_rejects_malformed_toml() {
        let path = temp_config("[[[ not valid toml");

        let result = load_config(Some(&path));

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_load_config_leaves_range_checks_to_validate() {
        // Arrange
        let path = temp_config("[scheduler]\nreport_interval_us = 0\npointer_speed = 1e308\n");

        // Act
        let cfg = load_config(Some(&path)).expect("out-of-range values still parse");

        // Assert
        assert_eq!(cfg.scheduler.report_interval_us, 0);
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_config_file_path_ends_with_bthid_config_toml() {
        // May be NoPlatformConfigDir in a stripped environment; that is acceptable.
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("bthid/config.toml"), "got {path:?}");
        }
    }
}
