//! The control surface: the controller's 48 inputs, the listeners bound to
//! them and the knob display SysEx.

pub mod bindings;
pub mod element;
pub mod guard;
pub mod listeners;

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use crate::config::{MidiConfig, PadMessage};
use crate::io::sysex::{self, build_knob_value_message, KNOB_COUNT};
use crate::io::transport::MidiTransport;

use element::{ChannelMessage, ControlElement, ControlId, ControlKind, MessageType};
use guard::ComponentGuard;
use listeners::{ListenerId, ListenerRegistry, ValueListener};

pub const CONTROLS_PER_KIND: usize = 16;

/// Where the controller's inputs sit in MIDI space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceLayout {
    /// 0-based.
    pub channel: u8,
    pub knobs_offset_cc: u8,
    pub steps_offset_cc: u8,
    pub pads_offset: u8,
    pub pads_message: MessageType,
}

impl From<&MidiConfig> for SurfaceLayout {
    fn from(config: &MidiConfig) -> Self {
        Self {
            channel: config.channel.saturating_sub(1).min(15),
            knobs_offset_cc: config.knobs_offset_cc,
            steps_offset_cc: config.steps_offset_cc,
            pads_offset: config.pads_offset,
            pads_message: match config.pads_message {
                PadMessage::Note => MessageType::Note,
                PadMessage::Cc => MessageType::Cc,
            },
        }
    }
}

impl Default for SurfaceLayout {
    fn default() -> Self {
        Self::from(&MidiConfig::default())
    }
}

pub struct ControlSurface<T: MidiTransport> {
    transport: T,
    layout: SurfaceLayout,
    knobs: Vec<ControlElement>,
    steps: Vec<ControlElement>,
    pads: Vec<ControlElement>,
    registry: ListenerRegistry,
    // Listeners registered under an active component guard
    setup_pending: Option<Vec<ListenerId>>,
}

impl<T: MidiTransport> ControlSurface<T> {
    pub fn new(transport: T, layout: SurfaceLayout) -> Self {
        Self {
            transport,
            layout,
            knobs: Vec::new(),
            steps: Vec::new(),
            pads: Vec::new(),
            registry: ListenerRegistry::new(),
            setup_pending: None,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn layout(&self) -> SurfaceLayout {
        self.layout
    }

    pub fn knobs(&self) -> &[ControlElement] {
        &self.knobs
    }

    pub fn steps(&self) -> &[ControlElement] {
        &self.steps
    }

    pub fn pads(&self) -> &[ControlElement] {
        &self.pads
    }

    pub fn element(&self, kind: ControlKind, index: usize) -> Option<&ControlElement> {
        match kind {
            ControlKind::Knob => self.knobs.get(index),
            ControlKind::Step => self.steps.get(index),
            ControlKind::Pad => self.pads.get(index),
        }
    }

    /// Scoped setup block, see [`ComponentGuard`].
    pub fn component_guard(&mut self) -> ComponentGuard<'_, T> {
        ComponentGuard::new(self)
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Control inputs

    /// Create the knob, step and pad elements and hook a debug logger to each.
    pub fn setup_control_inputs(&mut self) {
        if !self.knobs.is_empty() {
            log::warn!("Control inputs are already set up");
            return;
        }
        let layout = self.layout;
        self.knobs = make_elements(ControlKind::Knob, MessageType::Cc, layout.channel, layout.knobs_offset_cc);
        self.steps = make_elements(ControlKind::Step, MessageType::Cc, layout.channel, layout.steps_offset_cc);
        self.pads = make_elements(ControlKind::Pad, layout.pads_message, layout.channel, layout.pads_offset);

        let ids: Vec<ControlId> = self
            .knobs
            .iter()
            .chain(&self.steps)
            .chain(&self.pads)
            .map(ControlElement::id)
            .collect();
        for id in ids {
            self.add_value_listener(id, Box::new(log_control_value));
        }
    }

    pub fn add_value_listener(&mut self, control: ControlId, listener: ValueListener) -> ListenerId {
        let id = self.registry.add(control, listener);
        if let Some(pending) = self.setup_pending.as_mut() {
            pending.push(id);
        }
        id
    }

    pub fn remove_value_listener(&mut self, id: ListenerId) -> bool {
        self.registry.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.registry.len()
    }

    /// Route one inbound message to the element it addresses and its listeners.
    pub fn receive_midi(&mut self, bytes: &[u8]) {
        let Some(msg) = ChannelMessage::parse(bytes) else {
            log::trace!("Ignoring non-channel message {:02X?}", bytes);
            return;
        };

        let element = self
            .knobs
            .iter()
            .chain(&self.steps)
            .chain(&self.pads)
            .find(|e| e.matches(msg.message_type, msg.channel, msg.number));

        match element {
            Some(element) => {
                element.set_value(msg.value);
                self.registry.dispatch(element.id(), msg.value, element);
            }
            None => log::trace!("No control for {:?}", msg),
        }
    }

    /// Drain everything the transport has received. Returns the message count.
    pub fn process_incoming(&mut self) -> usize {
        let mut count = 0;
        while let Some(bytes) = self.transport.receive_midi() {
            self.receive_midi(&bytes);
            count += 1;
        }
        count
    }

    ////////////////////////////////////////////////////////////////////////////////
    // SysEx

    /// Show `value` on knob `position`. Panics on a position outside 0..=15.
    pub fn set_knob_value_sysex(&mut self, position: i32, value: i32) {
        let message = build_knob_value_message(position, value);
        self.transport.send_midi(message.as_bytes());
    }

    pub fn reset_knob_values_sysex(&mut self, value: i32) {
        for position in 0..KNOB_COUNT {
            self.set_knob_value_sysex(position, value);
        }
    }

    /// Send the first knob's value message and wait for any reply.
    pub fn probe_device(&mut self, value: i32, timeout: Duration, cancel: &AtomicBool) -> bool {
        let message = build_knob_value_message(0, value);
        sysex::send_and_await_ack_cancellable(&mut self.transport, &message, timeout, cancel)
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Release

    /// Release every registered listener. Safe to call more than once.
    pub fn disconnect(&mut self) {
        if !self.registry.is_empty() {
            log::debug!("Releasing {} listeners", self.registry.len());
        }
        self.registry.clear();
        self.setup_pending = None;
    }
}

impl<T: MidiTransport> Drop for ControlSurface<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn make_elements(kind: ControlKind, message_type: MessageType, channel: u8, offset: u8) -> Vec<ControlElement> {
    (0..CONTROLS_PER_KIND)
        .map(|index| ControlElement::new(kind, index, message_type, channel, offset.saturating_add(index as u8)))
        .collect()
}

fn log_control_value(value: u8, sender: &ControlElement) {
    log::debug!("Received control {:?} input {} from {}", sender.kind(), value, sender.message_identifier());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::transport::MockTransport;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn surface() -> ControlSurface<MockTransport> {
        let mut surface = ControlSurface::new(MockTransport::default(), SurfaceLayout::default());
        surface.setup_control_inputs();
        surface
    }

    #[test]
    fn test_setup_creates_elements() {
        let surface = surface();
        assert_eq!(surface.knobs().len(), 16);
        assert_eq!(surface.steps().len(), 16);
        assert_eq!(surface.pads().len(), 16);
        assert!(surface.knobs()[0].matches(MessageType::Cc, 15, 1));
        assert!(surface.knobs()[15].matches(MessageType::Cc, 15, 16));
        assert!(surface.steps()[0].matches(MessageType::Cc, 15, 21));
        assert!(surface.pads()[0].matches(MessageType::Note, 15, 36));
        // One debug logger per control
        assert_eq!(surface.listener_count(), 48);
    }

    #[test]
    fn test_setup_twice_is_ignored() {
        let mut surface = surface();
        surface.setup_control_inputs();
        assert_eq!(surface.listener_count(), 48);
    }

    #[test]
    fn test_receive_dispatches_to_listeners() {
        let mut surface = surface();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let knob = surface.knobs()[2].id();
        surface.add_value_listener(knob, Box::new(move |value, sender| {
            sink.borrow_mut().push((value, sender.index()));
        }));

        surface.receive_midi(&[0xBF, 0x03, 0x50]);
        // Wrong channel, other knob, SysEx: none of these reach the listener
        surface.receive_midi(&[0xB0, 0x03, 0x10]);
        surface.receive_midi(&[0xBF, 0x04, 0x10]);
        surface.receive_midi(&[0xF0, 0x00, 0x20, 0x6B, 0xF7]);

        assert_eq!(*seen.borrow(), vec![(0x50, 2)]);
        assert_eq!(surface.knobs()[2].value(), 0x50);
    }

    #[test]
    fn test_pad_press_and_release() {
        let mut surface = surface();
        surface.receive_midi(&[0x9F, 36 + 5, 100]);
        assert!(surface.pads()[5].is_pressed());
        surface.receive_midi(&[0x8F, 36 + 5, 64]);
        assert!(!surface.pads()[5].is_pressed());
    }

    #[test]
    fn test_cc_pads_layout() {
        let layout = SurfaceLayout { pads_message: MessageType::Cc, ..SurfaceLayout::default() };
        let mut surface = ControlSurface::new(MockTransport::default(), layout);
        surface.setup_control_inputs();
        surface.receive_midi(&[0xBF, 36, 127]);
        assert!(surface.pads()[0].is_pressed());
    }

    #[test]
    fn test_process_incoming_drains_transport() {
        let mut surface = surface();
        surface.transport_mut().inbound.extend([vec![0xBF, 0x01, 0x10], vec![0xBF, 0x15, 0x7F]]);
        assert_eq!(surface.process_incoming(), 2);
        assert_eq!(surface.knobs()[0].value(), 0x10);
        assert!(surface.steps()[0].is_pressed());
    }

    #[test]
    fn test_reset_knob_values_sends_sixteen_messages() {
        let mut surface = surface();
        surface.reset_knob_values_sysex(10);
        let sent = &surface.transport().sent;
        assert_eq!(sent.len(), 16);
        for (position, msg) in sent.iter().enumerate() {
            assert_eq!(msg.len(), 12);
            assert_eq!(msg[9], 0x20 + position as u8);
            assert_eq!(msg[10], 10);
        }
    }

    #[test]
    #[should_panic(expected = "knob position must be between 0 and 15")]
    fn test_set_knob_value_rejects_bad_position() {
        surface().set_knob_value_sysex(16, 0);
    }

    #[test]
    fn test_probe_device() {
        let mut surface = surface();
        let cancel = AtomicBool::new(false);
        assert!(!surface.probe_device(10, Duration::from_millis(20), &cancel));

        surface.transport_mut().inbound.push_back(vec![0xF0, 0xF7]);
        assert!(surface.probe_device(10, Duration::from_secs(2), &cancel));
        assert_eq!(surface.transport().sent.len(), 2);
    }

    #[test]
    fn test_disconnect_releases_listeners() {
        let mut surface = surface();
        surface.disconnect();
        assert_eq!(surface.listener_count(), 0);
        surface.disconnect();
        assert_eq!(surface.listener_count(), 0);
    }

    #[test]
    fn test_layout_from_config_channel_is_zero_based() {
        let config = MidiConfig { channel: 1, ..MidiConfig::default() };
        assert_eq!(SurfaceLayout::from(&config).channel, 0);
        assert_eq!(SurfaceLayout::default().channel, 15);
    }
}
