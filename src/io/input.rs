use std::io::{stdin, stdout, Write};

use crate::error::{SurfaceError, SurfaceResult};

/// Select the controller's MIDI input port. First tries to find a port whose
/// name contains `input_port_name_substr`. If no match is found and there are
/// multiple ports, prompts the user to choose one interactively.
pub fn choose_input_port(midi_in: &midir::MidiInput, input_port_name_substr: &str) -> SurfaceResult<usize> {
    let names: Vec<String> = midi_in
        .ports()
        .iter()
        .enumerate()
        .map(|(i, p)| midi_in.port_name(p).unwrap_or_else(|_| format!("Unknown Port {}", i)))
        .collect();
    if names.is_empty() {
        return Err(SurfaceError::PortSelection("no input port found".into()));
    }

    if let Some(idx) = super::find_port(&names, input_port_name_substr, None) {
        log::info!("Choosing input port matching '{}': {}", input_port_name_substr, names[idx]);
        return Ok(idx);
    }

    if names.len() == 1 {
        log::info!("Choosing the only available input port: {}", names[0]);
        return Ok(0);
    }

    prompt_for_port("input", &names)
}

/// List `names` on stdout and read the chosen index from stdin.
pub(super) fn prompt_for_port(direction: &str, names: &[String]) -> SurfaceResult<usize> {
    println!("\nAvailable {} ports:", direction);
    for (i, name) in names.iter().enumerate() {
        println!("{}: {}", i, name);
    }

    print!("Please select {} port: ", direction);
    stdout().flush()?;
    let mut choice = String::new();
    stdin().read_line(&mut choice)?;
    match choice.trim().parse::<usize>() {
        Ok(idx) if idx < names.len() => Ok(idx),
        _ => Err(SurfaceError::PortSelection(format!("invalid {} port selected", direction))),
    }
}
