//! Configuration loading
//!
//! All three nodes read the same TOML file and pick their own section.
//! The file is located in this priority order:
//! 1. `--config` command-line argument (highest priority)
//! 2. `ABUS_CONFIG` environment variable
//! 3. `~/.config/abus/config.toml`
//! 4. `/etc/abus/config.toml`
//!
//! If no file is found every value falls back to the compiled default, which
//! reproduces the original installation. A file that exists but does not
//! parse is an error.

use crate::route::{RouteInfo, RouteTable};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "ABUS_CONFIG";

/// Passenger call station (`[call]`)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CallConfig {
    pub port: u16,
    /// Stop name sent with every CALL
    pub stop_name: String,
    /// `/call` endpoints of the stop station and driver terminal
    pub peers: Vec<String>,
    /// GPIO line enabling the speaker amplifier
    pub amp_pin: Option<u32>,
    /// Poll interval for button lines
    pub button_poll_ms: u64,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            port: 5001,
            stop_name: "광주대학교 정류장".to_string(),
            peers: vec![
                "http://172.30.1.36:5000/call".to_string(),
                "http://172.30.1.45:5000/call".to_string(),
            ],
            amp_pin: Some(22),
            button_poll_ms: 10,
        }
    }
}

/// Stop station (`[stop]`)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StopConfig {
    pub port: u16,
    /// `/release` endpoint of the call station
    pub release_url: String,
    pub amp_pin: Option<u32>,
    pub camera_index: i32,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            release_url: "http://172.30.1.100:5001/release".to_string(),
            amp_pin: Some(25),
            camera_index: 0,
            frame_width: 640,
            frame_height: 480,
        }
    }
}

/// Driver alert terminal (`[driver]`)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub port: u16,
    pub amp_pin: Option<u32>,
    /// Stop name used when a CALL arrives without one
    pub default_stop_name: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            amp_pin: Some(25),
            default_stop_name: "정류장".to_string(),
        }
    }
}

/// How announcement clips are played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerBackend {
    /// External player process, one invocation per clip
    Command,
    /// In-process decode and output (requires the `cpal-audio` feature)
    Cpal,
}

/// Speaker output shared by all nodes (`[audio]`)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Directory holding the pre-generated clips
    pub tts_dir: PathBuf,
    pub backend: PlayerBackend,
    /// Player command line; the clip path is appended
    pub player_command: Vec<String>,
    /// Delay between amplifier enable and first clip
    pub amp_settle_ms: u64,
    /// sysfs GPIO root
    pub gpio_root: PathBuf,
    /// Output device name for the cpal backend (None = default device)
    pub device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            tts_dir: PathBuf::from("/home/pi/bus_detection/tts"),
            backend: PlayerBackend::Command,
            player_command: vec!["mpg123".to_string(), "-q".to_string()],
            amp_settle_ms: 50,
            gpio_root: PathBuf::from("/sys/class/gpio"),
            device: None,
        }
    }
}

impl AudioConfig {
    pub fn amp_settle(&self) -> Duration {
        Duration::from_millis(self.amp_settle_ms)
    }
}

/// Notification bus timeouts (`[bus]`)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Timeout for CALL broadcasts from the call station
    pub call_timeout_ms: u64,
    /// Timeout for RELEASE from the stop station
    pub release_timeout_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: 500,
            release_timeout_ms: 1000,
        }
    }
}

impl BusConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn release_timeout(&self) -> Duration {
        Duration::from_millis(self.release_timeout_ms)
    }
}

/// Plane order of the detector's input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    Rgb,
    /// Blue plane first, what the shipped `bus_number.onnx` was exported with
    Bgr,
}

/// Arrival detection tuning (`[detection]`)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// ONNX sign detector
    pub model_path: PathBuf,
    /// Minimum confidence of the best box
    pub confidence_threshold: f32,
    pub gamma: f32,
    pub saturation: f32,
    /// Square model input edge in pixels
    pub input_size: u32,
    pub input_channel_order: ChannelOrder,
    /// Text recognition executable
    pub tesseract: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("/home/pi/bus_detection/models/bus_number.onnx"),
            confidence_threshold: 0.30,
            gamma: 0.8,
            saturation: 1.3,
            input_size: 640,
            input_channel_order: ChannelOrder::Bgr,
            tesseract: "tesseract".to_string(),
        }
    }
}

/// Complete configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub call: CallConfig,
    pub stop: StopConfig,
    pub driver: DriverConfig,
    pub audio: AudioConfig,
    pub bus: BusConfig,
    pub detection: DetectionConfig,
    pub routes: Vec<RouteInfo>,
}

impl Config {
    /// Parse configuration text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve and load the configuration file
    ///
    /// `cli_path` must exist when given; the other locations are optional.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = cli_path {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_file(path);
        }

        match ConfigResolver::new().resolve() {
            Some(path) => Self::load_file(&path),
            None => {
                warn!("No configuration file found, using compiled defaults");
                Ok(Self::default())
            }
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        info!("Loading configuration from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Route table from `[[routes]]`, or the default site when none are listed
    pub fn route_table(&self) -> Result<RouteTable> {
        if self.routes.is_empty() {
            Ok(RouteTable::default_site())
        } else {
            RouteTable::new(self.routes.clone())
        }
    }

    fn validate(&self) -> Result<()> {
        self.route_table()?;
        if !(0.0..=1.0).contains(&self.detection.confidence_threshold) {
            return Err(Error::Config(format!(
                "detection.confidence_threshold out of range: {}",
                self.detection.confidence_threshold
            )));
        }
        if !self.detection.gamma.is_finite() || self.detection.gamma <= 0.0 {
            return Err(Error::Config(format!(
                "detection.gamma must be a positive number: {}",
                self.detection.gamma
            )));
        }
        if !self.detection.saturation.is_finite() || self.detection.saturation <= 0.0 {
            return Err(Error::Config(format!(
                "detection.saturation must be a positive number: {}",
                self.detection.saturation
            )));
        }
        if self.detection.input_size == 0 {
            return Err(Error::Config("detection.input_size must be non-zero".to_string()));
        }
        if self.audio.backend == PlayerBackend::Command && self.audio.player_command.is_empty() {
            return Err(Error::Config("audio.player_command is empty".to_string()));
        }
        Ok(())
    }
}

/// Locates the configuration file when none is given on the command line
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    candidates: Vec<PathBuf>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        let mut candidates = Vec::new();
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.is_empty() {
                candidates.push(PathBuf::from(path));
            }
        }
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("abus").join("config.toml"));
        }
        candidates.push(PathBuf::from("/etc/abus/config.toml"));
        Self { candidates }
    }

    /// First candidate that exists on disk
    pub fn resolve(&self) -> Option<PathBuf> {
        self.candidates.iter().find(|p| p.exists()).cloned()
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_site() {
        let config = Config::default();
        assert_eq!(config.call.port, 5001);
        assert_eq!(config.stop.port, 5000);
        assert_eq!(config.call.peers.len(), 2);
        assert_eq!(config.detection.confidence_threshold, 0.30);
        assert_eq!(config.detection.input_size, 640);
        assert_eq!(config.route_table().unwrap().len(), 4);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
            [stop]
            release_url = "http://10.0.0.5:5001/release"

            [[routes]]
            id = "09"
            name_ko = "9번 버스"
            name_en = "bus number nine"
            "#,
        )
        .unwrap();

        assert_eq!(config.stop.release_url, "http://10.0.0.5:5001/release");
        assert_eq!(config.stop.port, 5000);
        assert_eq!(config.audio.player_command, vec!["mpg123", "-q"]);

        let table = config.route_table().unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.lookup("09").is_some());
        assert!(table.lookup("03").is_none());
    }

    #[test]
    fn test_invalid_route_id_rejected() {
        let result = Config::from_toml(
            r#"
            [[routes]]
            id = "A1"
            name_ko = "x"
            name_en = "x"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_threshold_range_checked() {
        let result = Config::from_toml("[detection]\nconfidence_threshold = 1.5\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_colour_correction_must_be_finite_and_positive() {
        for text in [
            "gamma = nan",
            "gamma = inf",
            "gamma = 0.0",
            "saturation = nan",
            "saturation = -inf",
            "saturation = 0.0",
            "saturation = -1.3",
        ] {
            let result = Config::from_toml(&format!("[detection]\n{}\n", text));
            assert!(matches!(result, Err(Error::Config(_))), "{} accepted", text);
        }
    }

    #[test]
    fn test_channel_order_parsing() {
        assert_eq!(Config::default().detection.input_channel_order, ChannelOrder::Bgr);
        let config = Config::from_toml("[detection]\ninput_channel_order = \"rgb\"\n").unwrap();
        assert_eq!(config.detection.input_channel_order, ChannelOrder::Rgb);
        assert!(Config::from_toml("[detection]\ninput_channel_order = \"bgra\"\n").is_err());
    }

    #[test]
    fn test_backend_parsing() {
        let config = Config::from_toml("[audio]\nbackend = \"cpal\"\n").unwrap();
        assert_eq!(config.audio.backend, PlayerBackend::Cpal);
    }
}
