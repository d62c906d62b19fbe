//! Application configuration — TOML-based, platform-aware paths.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color;
use crate::error::{Result, VolstripError};
use crate::input::KeyMap;
use crate::render::RenderConfig;

/// Header comment prepended to saved config files.
const CONFIG_HEADER: &str =
    "# volstrip configuration — edit while the program is not running.\n\n";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mixer: MixerConfig,
    #[serde(default)]
    pub strip: StripConfig,
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub rotary: RotaryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixerConfig {
    /// Mixer control name. Overridable on the command line.
    #[serde(default = "default_control")]
    pub control: String,

    /// ALSA card index. `None` = default card. Mutually exclusive with `device`.
    #[serde(default)]
    pub card: Option<i32>,

    /// ALSA device string (e.g. "hw:1"). Overrides `card` when set.
    #[serde(default)]
    pub device: Option<String>,

    /// Volume step as a fraction of the control's range.
    #[serde(default = "default_step")]
    pub step: f64,

    /// Bounded wait of the change listener, in milliseconds.
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripConfig {
    /// Number of pixels on the strip.
    #[serde(default = "default_length")]
    pub length: usize,

    /// Bar color (hex or name). Default: "jade".
    #[serde(default = "default_color")]
    pub color: String,

    /// Mute fill color (hex or name). Default: "red".
    #[serde(default = "default_mute_color")]
    pub mute_color: String,

    /// Peak intensity of the head and solid segment.
    #[serde(default = "default_intensity")]
    pub intensity: f64,

    /// Trail floor intensity.
    #[serde(default = "default_min_intensity")]
    pub min_intensity: f64,

    /// Mute fill intensity.
    #[serde(default = "default_mute_intensity")]
    pub mute_intensity: f64,

    /// Gamma exponent for perceptual brightness correction.
    #[serde(default = "default_gamma")]
    pub gamma: f64,

    /// Width in pixels of the solid segment behind the head.
    #[serde(default = "default_head_width")]
    pub head_width: f64,

    /// Distance in pixels behind the head where the trail reaches the floor.
    #[serde(default = "default_end_width")]
    pub end_width: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysConfig {
    #[serde(default = "default_key_volume_up")]
    pub volume_up: u16,
    #[serde(default = "default_key_volume_down")]
    pub volume_down: u16,
    #[serde(default = "default_key_mute")]
    pub mute: u16,
    #[serde(default = "default_key_quit")]
    pub quit: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotaryConfig {
    /// Whether to attach the GPIO rotary encoder at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_pin_a")]
    pub pin_a: u8,
    #[serde(default = "default_pin_b")]
    pub pin_b: u8,
}

fn default_control() -> String {
    "Master".into()
}
fn default_step() -> f64 {
    0.03
}
fn default_poll_timeout_ms() -> u64 {
    500
}
fn default_length() -> usize {
    12
}
fn default_color() -> String {
    "jade".into()
}
fn default_mute_color() -> String {
    "red".into()
}
fn default_intensity() -> f64 {
    0.3
}
fn default_min_intensity() -> f64 {
    0.02
}
fn default_mute_intensity() -> f64 {
    0.3
}
fn default_gamma() -> f64 {
    2.8
}
fn default_head_width() -> f64 {
    1.3
}
fn default_end_width() -> f64 {
    4.0
}
fn default_key_volume_up() -> u16 {
    115
}
fn default_key_volume_down() -> u16 {
    114
}
fn default_key_mute() -> u16 {
    113
}
fn default_key_quit() -> u16 {
    79
}
fn default_true() -> bool {
    true
}
fn default_pin_a() -> u8 {
    22
}
fn default_pin_b() -> u8 {
    27
}

impl Default for MixerConfig {
    fn default() -> Self {
        MixerConfig {
            control: default_control(),
            card: None,
            device: None,
            step: default_step(),
            poll_timeout_ms: default_poll_timeout_ms(),
        }
    }
}

impl Default for StripConfig {
    fn default() -> Self {
        StripConfig {
            length: default_length(),
            color: default_color(),
            mute_color: default_mute_color(),
            intensity: default_intensity(),
            min_intensity: default_min_intensity(),
            mute_intensity: default_mute_intensity(),
            gamma: default_gamma(),
            head_width: default_head_width(),
            end_width: default_end_width(),
        }
    }
}

impl Default for KeysConfig {
    fn default() -> Self {
        KeysConfig {
            volume_up: default_key_volume_up(),
            volume_down: default_key_volume_down(),
            mute: default_key_mute(),
            quit: default_key_quit(),
        }
    }
}

impl Default for RotaryConfig {
    fn default() -> Self {
        RotaryConfig {
            enabled: true,
            pin_a: default_pin_a(),
            pin_b: default_pin_b(),
        }
    }
}

impl Config {
    /// Platform config file location (`~/.config/volstrip/config.toml` on
    /// Linux), or `None` when no config directory exists.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("volstrip").join("config.toml"))
    }

    /// Load from an explicit path or the platform location. A missing file
    /// is normal and yields defaults; an unreadable file logs and falls back.
    pub fn load(path: Option<&Path>) -> Config {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::config_path) else {
            return Config::default();
        };
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            // Missing file is the normal first-run case, not worth a log line.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Config::default(),
            Err(e) => {
                log::warn!("cannot read config {}: {e}; using defaults", path.display());
                return Config::default();
            }
        };
        match toml::from_str(&text) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("invalid config {}: {e}; using defaults", path.display());
                Config::default()
            }
        }
    }

    /// Serialize to TOML (with the header comment) and write to `path`,
    /// creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let body =
            toml::to_string_pretty(self).map_err(|e| VolstripError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, format!("{CONFIG_HEADER}{body}"))?;
        Ok(())
    }

    /// Resolve the strip section into a validated [`RenderConfig`].
    pub fn render_config(&self) -> Result<RenderConfig> {
        let config = RenderConfig {
            color: color::parse_color(&self.strip.color)?,
            mute_color: color::parse_color(&self.strip.mute_color)?,
            intensity: self.strip.intensity,
            min_intensity: self.strip.min_intensity,
            mute_intensity: self.strip.mute_intensity,
            gamma: self.strip.gamma,
            head_width: self.strip.head_width,
            end_width: self.strip.end_width,
            strip_length: self.strip.length,
        };
        config.validate().map_err(VolstripError::Config)?;
        Ok(config)
    }

    pub fn keymap(&self) -> KeyMap {
        KeyMap {
            volume_up: self.keys.volume_up,
            volume_down: self.keys.volume_down,
            mute: self.keys.mute,
            quit: self.keys.quit,
        }
    }

    pub fn poll_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.mixer.poll_timeout_ms)
    }

    /// Validate everything the control loop relies on.
    pub fn validate(&self) -> Result<()> {
        if !(self.mixer.step > 0.0 && self.mixer.step <= 1.0) {
            return Err(VolstripError::Config(format!(
                "mixer.step {} not in (0, 1]",
                self.mixer.step
            )));
        }
        if self.mixer.poll_timeout_ms == 0 {
            return Err(VolstripError::Config(
                "mixer.poll_timeout_ms must be positive".into(),
            ));
        }
        if self.rotary.pin_a == self.rotary.pin_b {
            return Err(VolstripError::Config(
                "rotary.pin_a and rotary.pin_b must differ".into(),
            ));
        }
        self.render_config()?;
        Ok(())
    }
}
