//! Track / device / parameter model the surface writes into.
//!
//! The surface never owns the session: it looks tracks up through [`Session`]
//! and keeps [`ParameterHandle`]s to the parameters it is bound to.

use std::cell::Cell;
use std::rc::Rc;

use crate::config::{SessionConfig, TrackConfig};

pub type ParameterHandle = Rc<Parameter>;

/// Receives every parameter write, e.g. to forward it to the application that
/// really owns the session.
pub trait ParameterObserver {
    fn parameter_changed(&self, parameter: &Parameter);
}

pub struct Parameter {
    name: String,
    path: Vec<String>,
    min: f64,
    max: f64,
    value: Cell<f64>,
    observer: Option<Rc<dyn ParameterObserver>>,
}

impl Parameter {
    pub fn new(name: &str, path: Vec<String>, min: f64, max: f64, value: f64) -> Self {
        Self {
            name: name.to_string(),
            path,
            min,
            max,
            value: Cell::new(value.clamp(min.min(max), max.max(min))),
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Option<Rc<dyn ParameterObserver>>) -> Self {
        self.observer = observer;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names from the track down to this parameter.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn value(&self) -> f64 {
        self.value.get()
    }

    /// Writes are saturated into `[min, max]`.
    pub fn set_value(&self, value: f64) {
        let clamped = value.clamp(self.min.min(self.max), self.max.max(self.min));
        self.value.set(clamped);
        log::debug!("{} = {:.4}", self.path.join(" / "), clamped);
        if let Some(observer) = &self.observer {
            observer.parameter_changed(self);
        }
    }
}

impl std::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameter")
            .field("path", &self.path)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("value", &self.value.get())
            .finish()
    }
}

#[derive(Debug)]
pub struct Device {
    pub name: String,
    pub parameters: Vec<ParameterHandle>,
}

#[derive(Debug)]
pub struct Track {
    pub name: String,
    pub group: Option<String>,
    pub devices: Vec<Device>,
    pub volume: ParameterHandle,
}

impl Track {
    pub fn is_grouped(&self) -> bool {
        self.group.is_some()
    }

    /// First parameter named `parameter_name` in the first device named
    /// `device_name` that has it.
    pub fn find_parameter(&self, device_name: &str, parameter_name: &str) -> Option<ParameterHandle> {
        self.devices
            .iter()
            .filter(|device| device.name == device_name)
            .flat_map(|device| device.parameters.iter())
            .find(|param| param.name() == parameter_name)
            .cloned()
    }
}

pub trait Session {
    fn tracks(&self) -> &[Track];
}

/// Session described entirely by the config file.
#[derive(Debug, Default)]
pub struct LocalSession {
    tracks: Vec<Track>,
}

impl LocalSession {
    pub fn from_config(config: &SessionConfig, observer: Option<Rc<dyn ParameterObserver>>) -> Self {
        let tracks = config
            .tracks
            .iter()
            .map(|track| build_track(track, &observer))
            .collect();
        Self { tracks }
    }
}

impl Session for LocalSession {
    fn tracks(&self) -> &[Track] {
        &self.tracks
    }
}

fn build_track(config: &TrackConfig, observer: &Option<Rc<dyn ParameterObserver>>) -> Track {
    let devices = config
        .devices
        .iter()
        .map(|device| Device {
            name: device.name.clone(),
            parameters: device
                .parameters
                .iter()
                .map(|p| {
                    let path = vec![config.name.clone(), device.name.clone(), p.name.clone()];
                    Rc::new(Parameter::new(&p.name, path, p.min, p.max, p.value).with_observer(observer.clone()))
                })
                .collect(),
        })
        .collect();

    // Mixer volume, 0.0 is silence and 1.0 is full scale
    let volume_path = vec![config.name.clone(), "Mixer".to_string(), "Volume".to_string()];
    let volume = Rc::new(Parameter::new("Volume", volume_path, 0.0, 1.0, 0.85).with_observer(observer.clone()));

    Track {
        name: config.name.clone(),
        group: config.group.clone(),
        devices,
        volume,
    }
}
