use std::sync::mpsc::{channel, Receiver};

use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};

use crate::error::SurfaceResult;

/// Raw MIDI access of the device's dedicated port pair.
pub trait MidiTransport {
    /// Fire-and-forget. Failures are logged by the implementation.
    fn send_midi(&mut self, bytes: &[u8]);

    /// Non-blocking poll for the next inbound message.
    fn receive_midi(&mut self) -> Option<Vec<u8>>;
}

/// Transport backed by a midir input/output connection pair.
///
/// Inbound messages are pushed from midir's callback thread into a channel
/// and picked up by `receive_midi` on the dispatch thread.
pub struct MidirTransport {
    conn_out: MidiOutputConnection,
    rx: Receiver<Vec<u8>>,
    // Kept alive for the callback; dropping it closes the input port.
    _conn_in: MidiInputConnection<()>,
    in_port_name: String,
    out_port_name: String,
}

impl MidirTransport {
    /// Open both ports, picked by name substring (see `io::input` / `io::output`).
    pub fn connect(input_port_name_substr: &str, output_port_name_substr: &str) -> SurfaceResult<Self> {
        let mut midi_in = MidiInput::new("beatstep-surface input")?;
        // SysEx replies must come through for the acknowledgement probe
        midi_in.ignore(Ignore::None);
        let midi_out = MidiOutput::new("beatstep-surface output")?;

        let in_idx = super::input::choose_input_port(&midi_in, input_port_name_substr)?;
        let in_ports = midi_in.ports();
        let in_port = &in_ports[in_idx];
        let in_port_name = midi_in
            .port_name(in_port)
            .map_err(|e| crate::error::SurfaceError::PortSelection(e.to_string()))?;

        let out_idx = super::output::choose_output_port(&midi_out, output_port_name_substr, &in_port_name)?;
        let out_ports = midi_out.ports();
        let out_port = &out_ports[out_idx];
        let out_port_name = midi_out
            .port_name(out_port)
            .map_err(|e| crate::error::SurfaceError::PortSelection(e.to_string()))?;

        let (tx, rx) = channel::<Vec<u8>>();
        let conn_in = midi_in.connect(
            in_port,
            "beatstep-surface-in",
            move |_stamp, message, _| {
                let _ = tx.send(message.to_vec());
            },
            (),
        )?;
        let conn_out = midi_out.connect(out_port, "beatstep-surface-out")?;

        log::info!("MIDI connected: '{}' -> surface -> '{}'", in_port_name, out_port_name);

        Ok(Self {
            conn_out,
            rx,
            _conn_in: conn_in,
            in_port_name,
            out_port_name,
        })
    }

    pub fn in_port_name(&self) -> &str {
        &self.in_port_name
    }

    pub fn out_port_name(&self) -> &str {
        &self.out_port_name
    }
}

impl MidiTransport for MidirTransport {
    fn send_midi(&mut self, bytes: &[u8]) {
        if let Err(err) = self.conn_out.send(bytes) {
            log::error!("Error sending MIDI message to '{}': {}", self.out_port_name, err);
        }
    }

    fn receive_midi(&mut self) -> Option<Vec<u8>> {
        self.rx.try_recv().ok()
    }
}

/// In-memory transport for tests: records sent messages, replays queued input.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockTransport {
    pub sent: Vec<Vec<u8>>,
    pub inbound: std::collections::VecDeque<Vec<u8>>,
}

#[cfg(test)]
impl MidiTransport for MockTransport {
    fn send_midi(&mut self, bytes: &[u8]) {
        self.sent.push(bytes.to_vec());
    }

    fn receive_midi(&mut self) -> Option<Vec<u8>> {
        self.inbound.pop_front()
    }
}
