use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Knob,
    Step,
    Pad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Cc,
    Note,
}

/// Identity of one physical control: its kind and its index within that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlId {
    pub kind: ControlKind,
    pub index: usize,
}

/// Shared view on a button's last value. Conditions hold one of these so they
/// can ask "is this button down right now" while a knob is being dispatched.
#[derive(Debug, Clone, Default)]
pub struct ButtonState(Rc<Cell<u8>>);

impl ButtonState {
    pub fn is_pressed(&self) -> bool {
        self.0.get() != 0
    }
}

/// One knob, step button or pad, bound to a MIDI channel and CC/note number.
#[derive(Debug, Clone)]
pub struct ControlElement {
    id: ControlId,
    message_type: MessageType,
    /// 0-based.
    channel: u8,
    number: u8,
    value: Rc<Cell<u8>>,
}

impl ControlElement {
    pub fn new(kind: ControlKind, index: usize, message_type: MessageType, channel: u8, number: u8) -> Self {
        Self {
            id: ControlId { kind, index },
            message_type,
            channel,
            number,
            value: Rc::new(Cell::new(0)),
        }
    }

    pub fn id(&self) -> ControlId {
        self.id
    }

    pub fn kind(&self) -> ControlKind {
        self.id.kind
    }

    pub fn index(&self) -> usize {
        self.id.index
    }

    pub fn value(&self) -> u8 {
        self.value.get()
    }

    pub(crate) fn set_value(&self, value: u8) {
        self.value.set(value);
    }

    pub fn is_pressed(&self) -> bool {
        self.value.get() != 0
    }

    pub fn button_state(&self) -> ButtonState {
        ButtonState(Rc::clone(&self.value))
    }

    pub fn matches(&self, message_type: MessageType, channel: u8, number: u8) -> bool {
        self.message_type == message_type && self.channel == channel && self.number == number
    }

    /// Human readable MIDI address, e.g. `CC 1 (ch 16)`.
    pub fn message_identifier(&self) -> String {
        let kind = match self.message_type {
            MessageType::Cc => "CC",
            MessageType::Note => "Note",
        };
        format!("{} {} (ch {})", kind, self.number, self.channel + 1)
    }
}

impl fmt::Display for ControlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {} [{}]", self.id.kind, self.id.index, self.message_identifier())
    }
}

/// A decoded channel message: type, 0-based channel, number and value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMessage {
    pub message_type: MessageType,
    pub channel: u8,
    pub number: u8,
    pub value: u8,
}

impl ChannelMessage {
    /// Decode CC, note-on and note-off. A note-off, or a note-on with velocity
    /// 0, reads as value 0. Everything else yields `None`.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 3 {
            return None;
        }
        let status = bytes[0] & 0xF0;
        let channel = bytes[0] & 0x0F;
        let number = bytes[1] & 0x7F;
        let data = bytes[2] & 0x7F;

        let (message_type, value) = match status {
            0xB0 => (MessageType::Cc, data),
            0x90 => (MessageType::Note, data),
            0x80 => (MessageType::Note, 0),
            _ => return None,
        };
        Some(Self { message_type, channel, number, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_channel_messages() {
        assert_eq!(
            ChannelMessage::parse(&[0xBF, 0x01, 0x40]),
            Some(ChannelMessage { message_type: MessageType::Cc, channel: 15, number: 1, value: 64 })
        );
        assert_eq!(
            ChannelMessage::parse(&[0x9F, 0x24, 0x7F]),
            Some(ChannelMessage { message_type: MessageType::Note, channel: 15, number: 36, value: 127 })
        );
        assert_eq!(ChannelMessage::parse(&[0x8F, 0x24, 0x40]).map(|m| m.value), Some(0));
        assert_eq!(ChannelMessage::parse(&[0x9F, 0x24, 0x00]).map(|m| m.value), Some(0));
    }

    #[test]
    fn test_parse_ignores_other_messages() {
        assert_eq!(ChannelMessage::parse(&[0xF0, 0x7E, 0x00, 0x06, 0x02, 0xF7]), None);
        assert_eq!(ChannelMessage::parse(&[0xEF, 0x00, 0x40]), None);
        assert_eq!(ChannelMessage::parse(&[0xBF, 0x01]), None);
    }

    #[test]
    fn test_button_state_follows_element() {
        let pad = ControlElement::new(ControlKind::Pad, 0, MessageType::Note, 15, 36);
        let state = pad.button_state();
        assert!(!state.is_pressed());
        pad.set_value(100);
        assert!(state.is_pressed() && pad.is_pressed());
        pad.set_value(0);
        assert!(!state.is_pressed());
    }

    #[test]
    fn test_message_identifier() {
        let knob = ControlElement::new(ControlKind::Knob, 0, MessageType::Cc, 15, 1);
        assert_eq!(knob.message_identifier(), "CC 1 (ch 16)");
        assert!(knob.matches(MessageType::Cc, 15, 1));
        assert!(!knob.matches(MessageType::Note, 15, 1));
        assert!(!knob.matches(MessageType::Cc, 0, 1));
    }
}
