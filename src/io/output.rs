use crate::error::{SurfaceError, SurfaceResult};

/// Select the controller's MIDI output port. Prefers a port whose name
/// contains `output_port_name_substr` and is not identical to `in_port_name`.
pub fn choose_output_port(midi_out: &midir::MidiOutput, output_port_name_substr: &str, in_port_name: &str) -> SurfaceResult<usize> {
    let names: Vec<String> = midi_out
        .ports()
        .iter()
        .enumerate()
        .map(|(i, p)| midi_out.port_name(p).unwrap_or_else(|_| format!("Unknown Port {}", i)))
        .collect();
    if names.is_empty() {
        return Err(SurfaceError::PortSelection("no output port found".into()));
    }

    if let Some(idx) = super::find_port(&names, output_port_name_substr, Some(in_port_name)) {
        log::info!("Choosing output port matching '{}': {}", output_port_name_substr, names[idx]);
        return Ok(idx);
    }

    if names.len() == 1 {
        log::info!("Choosing the only available output port: {}", names[0]);
        return Ok(0);
    }

    super::input::prompt_for_port("output", &names)
}
