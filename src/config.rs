use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::SurfaceResult;
use crate::io::sysex::DEFAULT_ACK_TIMEOUT;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub midi: MidiConfig,
    pub sysex: SysExConfig,
    pub osc: OscConfig,
    pub session: SessionConfig,
    pub bindings: Vec<BindingConfig>,
    pub debug: bool,
}

/// Port names and the controller's MIDI layout.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    pub input_port: String,
    pub output_port: String,
    /// 1-based, as printed on the hardware.
    pub channel: u8,
    pub knobs_offset_cc: u8,
    pub steps_offset_cc: u8,
    pub pads_offset: u8,
    pub pads_message: PadMessage,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            input_port: "BeatStep".to_string(),
            output_port: "BeatStep".to_string(),
            channel: 16,
            knobs_offset_cc: 1,
            steps_offset_cc: 21,
            pads_offset: 36,
            pads_message: PadMessage::Note,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadMessage {
    Note,
    Cc,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SysExConfig {
    pub ack_timeout_secs: f64,
    pub reset_value: i32,
    pub reset_on_start: bool,
    pub probe_on_start: bool,
}

impl Default for SysExConfig {
    fn default() -> Self {
        Self {
            ack_timeout_secs: DEFAULT_ACK_TIMEOUT.as_secs_f64(),
            reset_value: 10,
            reset_on_start: true,
            probe_on_start: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OscConfig {
    pub enabled: bool,
    pub target: String,
    pub path_prefix: String,
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            target: "127.0.0.1:9000".to_string(),
            path_prefix: "/beatstep".to_string(),
        }
    }
}

/// The tracks the surface controls and the session they live in.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub group_name: String,
    pub track_names: Vec<String>,
    pub tracks: Vec<TrackConfig>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            group_name: "BeatStep Impro".to_string(),
            track_names: vec![
                "Sequencer 1".to_string(),
                "Sequencer 2".to_string(),
                "Drum".to_string(),
                "FX".to_string(),
            ],
            tracks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackConfig {
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParameterConfig {
    pub name: String,
    #[serde(default)]
    pub min: f64,
    #[serde(default = "default_parameter_max")]
    pub max: f64,
    #[serde(default)]
    pub value: f64,
}

fn default_parameter_max() -> f64 {
    127.0
}

/// One knob-to-target assignment.
#[derive(Debug, Clone, Deserialize)]
pub struct BindingConfig {
    pub knob: usize,
    pub target: BindingTarget,
    #[serde(default)]
    pub when: Condition,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BindingTarget {
    Mixer { track: String },
    Parameter { track: String, device: String, parameter: String },
}

impl BindingTarget {
    pub fn track(&self) -> &str {
        match self {
            Self::Mixer { track } | Self::Parameter { track, .. } => track,
        }
    }
}

/// Button state a binding depends on, checked each time the knob moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    #[default]
    Always,
    StepPressed(usize),
    StepReleased(usize),
    PadPressed(usize),
}

/// Read and parse the config at `path`.
pub fn load_config(path: &Path) -> SurfaceResult<Config> {
    let text = fs::read_to_string(path)?;
    let config = serde_json::from_str(&text)?;
    Ok(config)
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_config_or_default(path: &Path) -> SurfaceResult<Config> {
    if !path.exists() {
        log::warn!("Config file {} not found, using defaults", path.display());
        return Ok(Config::default());
    }
    load_config(path)
}
