//! Vendor SysEx used to set the value shown on a knob's LED ring.
//!
//! Message layout (12 bytes):
//!
//! ```text
//! F0 00 20 6B 7F 42 02 00 00 <20 + position> <value> F7
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use super::transport::MidiTransport;

pub const KNOB_COUNT: i32 = 16;
pub const MESSAGE_LEN: usize = 12;
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(1);

const HEADER: [u8; 9] = [0xF0, 0x00, 0x20, 0x6B, 0x7F, 0x42, 0x02, 0x00, 0x00];
const KNOB_PARAM_BASE: u8 = 0x20;
const END_OF_EXCLUSIVE: u8 = 0xF7;
const ACK_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// An immutable, fully built SysEx message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SysExMessage([u8; MESSAGE_LEN]);

impl SysExMessage {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::ops::Index<usize> for SysExMessage {
    type Output = u8;

    fn index(&self, index: usize) -> &u8 {
        &self.0[index]
    }
}

/// Build the message that sets knob `position` (0..=15) to `value`.
///
/// `value` is saturated into the 7-bit range. An out-of-range `position` is a
/// bug in the caller and panics.
pub fn build_knob_value_message(position: i32, value: i32) -> SysExMessage {
    assert!(
        (0..KNOB_COUNT).contains(&position),
        "knob position must be between 0 and 15, got {}",
        position
    );
    let clamped_value = value.clamp(0, 127) as u8;

    let mut bytes = [0u8; MESSAGE_LEN];
    bytes[..HEADER.len()].copy_from_slice(&HEADER);
    bytes[9] = KNOB_PARAM_BASE + position as u8;
    bytes[10] = clamped_value;
    bytes[11] = END_OF_EXCLUSIVE;
    SysExMessage(bytes)
}

/// Send `message` once and wait until anything arrives on the input side.
///
/// Any inbound message counts as the acknowledgement, whatever its content.
/// Returns `false` once `timeout` has elapsed without input. Never retries.
pub fn send_and_await_ack<T: MidiTransport + ?Sized>(
    transport: &mut T,
    message: &SysExMessage,
    timeout: Duration,
) -> bool {
    let never = AtomicBool::new(false);
    send_and_await_ack_cancellable(transport, message, timeout, &never)
}

/// Like [`send_and_await_ack`], but gives up early (returning `false`) as
/// soon as `cancel` is raised. The wait sleeps between polls so the calling
/// thread is not spinning.
pub fn send_and_await_ack_cancellable<T: MidiTransport + ?Sized>(
    transport: &mut T,
    message: &SysExMessage,
    timeout: Duration,
    cancel: &AtomicBool,
) -> bool {
    transport.send_midi(message.as_bytes());

    let start = Instant::now();
    loop {
        if transport.receive_midi().is_some() {
            log::debug!("SysEx acknowledged after {:?}", start.elapsed());
            return true;
        }
        if cancel.load(Ordering::SeqCst) {
            log::debug!("SysEx acknowledgement wait cancelled");
            return false;
        }
        if start.elapsed() >= timeout {
            log::debug!("No SysEx acknowledgement within {:?}", timeout);
            return false;
        }
        thread::sleep(ACK_POLL_INTERVAL);
    }
}
