//! Knob bindings: parameter and mixer "plugins" plus the button conditions
//! that select between them.

use super::element::{ButtonState, ControlElement, ControlId, ControlKind};
use super::listeners::ListenerId;
use super::ControlSurface;
use crate::config::{BindingConfig, BindingTarget, Condition};
use crate::general::rescale::rescale_midi;
use crate::io::transport::MidiTransport;
use crate::session::{Session, Track};

/// A [`Condition`] resolved against the surface's buttons.
#[derive(Debug, Clone)]
pub struct ActiveWhen {
    button: Option<ButtonState>,
    pressed: bool,
}

impl ActiveWhen {
    pub fn always() -> Self {
        Self { button: None, pressed: true }
    }

    pub fn holds(&self) -> bool {
        match &self.button {
            Some(button) => button.is_pressed() == self.pressed,
            None => true,
        }
    }
}

impl<T: MidiTransport> ControlSurface<T> {
    /// `None` when the condition names a button the surface does not have.
    pub fn resolve_condition(&self, condition: Condition) -> Option<ActiveWhen> {
        let (kind, index, pressed) = match condition {
            Condition::Always => return Some(ActiveWhen::always()),
            Condition::StepPressed(i) => (ControlKind::Step, i, true),
            Condition::StepReleased(i) => (ControlKind::Step, i, false),
            Condition::PadPressed(i) => (ControlKind::Pad, i, true),
        };
        let button = self.element(kind, index)?.button_state();
        Some(ActiveWhen { button: Some(button), pressed })
    }

    /// Drive `parameter_name` of the track's `device_name` with knob `knob`
    /// while `condition` holds. The knob's 0..=127 is spread over the
    /// parameter's range.
    ///
    /// Returns `None`, after logging a warning, when the knob, the condition's
    /// button or the parameter does not exist; the binding is then a no-op.
    pub fn add_parameter_control(
        &mut self,
        knob: usize,
        track: &Track,
        device_name: &str,
        parameter_name: &str,
        condition: Condition,
    ) -> Option<ListenerId> {
        let Some(param) = track.find_parameter(device_name, parameter_name) else {
            log::warn!(
                "Parameter \"{}\" for track \"{}\" wasn't found in the device \"{}\"",
                parameter_name, track.name, device_name
            );
            return None;
        };
        let (control, active) = self.knob_and_condition(knob, condition)?;

        let listener = move |value: u8, _: &ControlElement| {
            if active.holds() {
                param.set_value(rescale_midi(param.min(), param.max(), value));
            }
        };
        Some(self.add_value_listener(control, Box::new(listener)))
    }

    /// Drive the track's mixer volume with knob `knob` while `condition` holds.
    pub fn add_mixer_control(&mut self, knob: usize, track: &Track, condition: Condition) -> Option<ListenerId> {
        let (control, active) = self.knob_and_condition(knob, condition)?;
        let volume = track.volume.clone();

        let listener = move |value: u8, _: &ControlElement| {
            if active.holds() {
                volume.set_value(rescale_midi(0.0, 1.0, value));
            }
        };
        Some(self.add_value_listener(control, Box::new(listener)))
    }

    fn knob_and_condition(&self, knob: usize, condition: Condition) -> Option<(ControlId, ActiveWhen)> {
        let Some(element) = self.knobs.get(knob) else {
            log::warn!("Knob {} does not exist, binding skipped", knob);
            return None;
        };
        let Some(active) = self.resolve_condition(condition) else {
            log::warn!("Condition {:?} refers to a missing button, binding skipped", condition);
            return None;
        };
        Some((element.id(), active))
    }
}

/// Look up the configured tracks: one slot per name, filled with the track
/// of that name grouped under `group_name`.
pub fn find_tracks<'a>(session: &'a dyn Session, group_name: &str, track_names: &[String]) -> Vec<Option<&'a Track>> {
    let mut tracks: Vec<Option<&Track>> = vec![None; track_names.len()];
    for track in session.tracks() {
        if !track.is_grouped() || track.group.as_deref() != Some(group_name) {
            continue;
        }
        if let Some(idx) = track_names.iter().position(|name| *name == track.name) {
            tracks[idx] = Some(track);
        }
    }

    if tracks.iter().any(Option::is_none) {
        log::warn!(
            "Either mandatory group {} is missing or any of its tracks ({}).",
            group_name,
            track_names.join(", ")
        );
    }
    tracks
}

/// Install every configured binding that can be resolved. Returns how many
/// were installed; the rest are skipped with a warning.
pub fn apply_bindings<T: MidiTransport>(
    surface: &mut ControlSurface<T>,
    track_names: &[String],
    tracks: &[Option<&Track>],
    bindings: &[BindingConfig],
) -> usize {
    let mut installed = 0;
    for binding in bindings {
        let track_name = binding.target.track();
        let track = track_names
            .iter()
            .position(|name| name == track_name)
            .and_then(|idx| tracks.get(idx).copied().flatten());
        let Some(track) = track else {
            log::warn!("Track \"{}\" is not available, knob {} binding skipped", track_name, binding.knob);
            continue;
        };

        let id = match &binding.target {
            BindingTarget::Mixer { .. } => surface.add_mixer_control(binding.knob, track, binding.when),
            BindingTarget::Parameter { device, parameter, .. } => {
                surface.add_parameter_control(binding.knob, track, device, parameter, binding.when)
            }
        };
        if id.is_some() {
            installed += 1;
        }
    }
    log::info!("{} of {} knob bindings installed", installed, bindings.len());
    installed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeviceConfig, ParameterConfig, SessionConfig, TrackConfig};
    use crate::io::transport::MockTransport;
    use crate::session::LocalSession;
    use crate::surface::SurfaceLayout;

    const GROUP: &str = "BeatStep Impro";

    fn track(name: &str, group: Option<&str>, params: &[(&str, &str)]) -> TrackConfig {
        let mut devices: Vec<DeviceConfig> = Vec::new();
        for (device, param) in params {
            let parameter = ParameterConfig { name: param.to_string(), min: 0.0, max: 127.0, value: 0.0 };
            match devices.iter_mut().find(|d| d.name == *device) {
                Some(d) => d.parameters.push(parameter),
                None => devices.push(DeviceConfig { name: device.to_string(), parameters: vec![parameter] }),
            }
        }
        TrackConfig { name: name.to_string(), group: group.map(str::to_string), devices }
    }

    fn session() -> LocalSession {
        let config = SessionConfig {
            tracks: vec![
                track("Sequencer 1", Some(GROUP), &[("Instrument Rack", "Cutoff"), ("Instrument Rack", "Instrument")]),
                track("Sequencer 2", Some(GROUP), &[("Instrument Rack", "Cutoff")]),
                track("Drum", Some(GROUP), &[]),
                track("FX", Some(GROUP), &[("Audio Effect Rack", "EQ LP"), ("Audio Effect Rack", "Reverb Level")]),
                // Same name, outside the group
                track("Drum", None, &[]),
            ],
            ..SessionConfig::default()
        };
        LocalSession::from_config(&config, None)
    }

    fn surface() -> ControlSurface<MockTransport> {
        let mut surface = ControlSurface::new(MockTransport::default(), SurfaceLayout::default());
        surface.setup_control_inputs();
        surface
    }

    fn names() -> Vec<String> {
        SessionConfig::default().track_names
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {}, got {}", expected, actual);
    }

    fn param(session: &LocalSession, track: &str, device: &str, name: &str) -> f64 {
        let track = session.tracks().iter().find(|t| t.name == track).unwrap();
        track.find_parameter(device, name).unwrap().value()
    }

    #[test]
    fn test_find_tracks_requires_group() {
        let session = session();
        let tracks = find_tracks(&session, GROUP, &names());
        assert!(tracks.iter().all(Option::is_some));
        assert_eq!(tracks[2].unwrap().group.as_deref(), Some(GROUP));

        let tracks = find_tracks(&session, "Other Group", &names());
        assert!(tracks.iter().all(Option::is_none));
    }

    #[test]
    fn test_find_tracks_reports_missing_slot() {
        let session = session();
        let mut wanted = names();
        wanted.push("Bass".to_string());
        let tracks = find_tracks(&session, GROUP, &wanted);
        assert!(tracks[4].is_none());
        assert!(tracks[0].is_some());
    }

    #[test]
    fn test_parameter_control_writes_rescaled_value() {
        let session = session();
        let mut surface = surface();
        let seq1 = &session.tracks()[0];

        let id = surface.add_parameter_control(0, seq1, "Instrument Rack", "Instrument", Condition::Always);
        assert!(id.is_some());
        surface.receive_midi(&[0xBF, 0x01, 100]);

        assert_close(param(&session, "Sequencer 1", "Instrument Rack", "Instrument"), 100.0);
    }

    #[test]
    fn test_missing_parameter_is_noop() {
        let session = session();
        let mut surface = surface();
        let before = surface.listener_count();

        let id = surface.add_parameter_control(0, &session.tracks()[0], "Instrument Rack", "Drive", Condition::Always);
        assert!(id.is_none());
        assert_eq!(surface.listener_count(), before);
    }

    #[test]
    fn test_mixer_control() {
        let session = session();
        let mut surface = surface();
        let drum = &session.tracks()[2];

        surface.add_mixer_control(5, drum, Condition::Always).unwrap();
        surface.receive_midi(&[0xBF, 0x06, 127]);
        assert_eq!(drum.volume.value(), 1.0);
        surface.receive_midi(&[0xBF, 0x06, 0]);
        assert_eq!(drum.volume.value(), 0.0);
    }

    #[test]
    fn test_step_selects_sequencer() {
        let session = session();
        let mut surface = surface();
        let tracks = session.tracks();
        surface.add_parameter_control(8, &tracks[0], "Instrument Rack", "Cutoff", Condition::StepPressed(0));
        surface.add_parameter_control(8, &tracks[1], "Instrument Rack", "Cutoff", Condition::StepReleased(0));

        // Step 1 released: knob 9 drives Sequencer 2
        surface.receive_midi(&[0xBF, 9, 40]);
        assert_close(param(&session, "Sequencer 1", "Instrument Rack", "Cutoff"), 0.0);
        assert_close(param(&session, "Sequencer 2", "Instrument Rack", "Cutoff"), 40.0);

        // Step 1 held: knob 9 drives Sequencer 1
        surface.receive_midi(&[0xBF, 21, 127]);
        surface.receive_midi(&[0xBF, 9, 90]);
        assert_close(param(&session, "Sequencer 1", "Instrument Rack", "Cutoff"), 90.0);
        assert_close(param(&session, "Sequencer 2", "Instrument Rack", "Cutoff"), 40.0);
    }

    #[test]
    fn test_pad_selects_effect() {
        let session = session();
        let mut surface = surface();
        let fx = &session.tracks()[3];
        surface.add_parameter_control(14, fx, "Audio Effect Rack", "EQ LP", Condition::PadPressed(13));
        surface.add_parameter_control(14, fx, "Audio Effect Rack", "Reverb Level", Condition::PadPressed(14));

        surface.receive_midi(&[0xBF, 15, 70]);
        assert_close(param(&session, "FX", "Audio Effect Rack", "EQ LP"), 0.0);

        surface.receive_midi(&[0x9F, 36 + 14, 100]);
        surface.receive_midi(&[0xBF, 15, 70]);
        assert_close(param(&session, "FX", "Audio Effect Rack", "EQ LP"), 0.0);
        assert_close(param(&session, "FX", "Audio Effect Rack", "Reverb Level"), 70.0);
    }

    #[test]
    fn test_unbinding() {
        let session = session();
        let mut surface = surface();
        let drum = &session.tracks()[2];
        let id = surface.add_mixer_control(3, drum, Condition::Always).unwrap();
        assert!(surface.remove_value_listener(id));

        surface.receive_midi(&[0xBF, 4, 0]);
        assert_eq!(drum.volume.value(), 0.85);
    }

    #[test]
    fn test_invalid_knob_or_button_is_skipped() {
        let session = session();
        let mut surface = surface();
        let drum = &session.tracks()[2];
        assert!(surface.add_mixer_control(16, drum, Condition::Always).is_none());
        assert!(surface.add_mixer_control(0, drum, Condition::PadPressed(16)).is_none());
    }

    #[test]
    fn test_apply_bindings_skips_unresolved() {
        let session = session();
        let mut surface = surface();
        let names = names();
        let tracks = find_tracks(&session, GROUP, &names);
        let bindings: Vec<BindingConfig> = serde_json::from_str(
            r#"[
                { "knob": 3, "target": { "type": "mixer", "track": "Sequencer 1" } },
                { "knob": 0, "target": { "type": "parameter", "track": "Sequencer 1",
                                         "device": "Instrument Rack", "parameter": "Instrument" } },
                { "knob": 1, "target": { "type": "parameter", "track": "Sequencer 2",
                                         "device": "Instrument Rack", "parameter": "Instrument" } },
                { "knob": 2, "target": { "type": "mixer", "track": "Bass" } },
                { "knob": 99, "target": { "type": "mixer", "track": "Drum" } }
            ]"#,
        )
        .unwrap();

        assert_eq!(apply_bindings(&mut surface, &names, &tracks, &bindings), 2);
        assert_eq!(surface.listener_count(), 48 + 2);
    }
}
