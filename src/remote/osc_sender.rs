use std::net::UdpSocket;
use std::sync::atomic::Ordering;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rosc::{encoder, OscMessage, OscPacket, OscType};

use crate::error::{SurfaceError, SurfaceResult};
use crate::session::{Parameter, ParameterObserver};

/// A parameter write on its way to the OSC target.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterChange {
    pub addr: String,
    pub value: f32,
}

/// Replace whitespace so names are usable as OSC path segments (e.g. "EQ LP" -> "EQ_LP").
pub fn osc_path_segment(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}

/// `<prefix>/<track>/<device>/<parameter>`
pub fn osc_address(prefix: &str, path: &[String]) -> String {
    let mut addr = prefix.trim_end_matches('/').to_string();
    for segment in path {
        addr.push('/');
        addr.push_str(&osc_path_segment(segment));
    }
    addr
}

/// Forwards parameter writes from the dispatch thread to the OSC sender thread.
pub struct OscParameterObserver {
    prefix: String,
    tx: Sender<ParameterChange>,
}

impl OscParameterObserver {
    pub fn new(prefix: &str, tx: Sender<ParameterChange>) -> Self {
        Self { prefix: prefix.to_string(), tx }
    }
}

impl ParameterObserver for OscParameterObserver {
    fn parameter_changed(&self, parameter: &Parameter) {
        let change = ParameterChange {
            addr: osc_address(&self.prefix, parameter.path()),
            value: parameter.value() as f32,
        };
        // Receiver gone means the sender thread is shutting down
        let _ = self.tx.send(change);
    }
}

/// UDP socket connected to the OSC target.
pub struct OscSender {
    socket: UdpSocket,
    target_addr: String,
}

impl OscSender {
    pub fn new(target_addr: &str) -> SurfaceResult<Self> {
        let socket = UdpSocket::bind("127.0.0.1:0").map_err(|e| SurfaceError::Osc(e.to_string()))?;
        let target = if target_addr.trim().is_empty() {
            "127.0.0.1:9000".to_string()
        } else {
            target_addr.to_string()
        };
        socket.connect(&target).map_err(|e| SurfaceError::Osc(format!("{}: {}", target, e)))?;

        Ok(OscSender { socket, target_addr: target })
    }

    pub fn send_change(&self, change: &ParameterChange) -> SurfaceResult<()> {
        let msg = OscMessage { addr: change.addr.clone(), args: vec![OscType::Float(change.value)] };
        let msg_buf = encoder::encode(&OscPacket::Message(msg)).map_err(|e| SurfaceError::Osc(e.to_string()))?;
        let bytes_sent = self
            .socket
            .send(&msg_buf)
            .map_err(|e| SurfaceError::Osc(format!("send to {} failed: {}", self.target_addr, e)))?;
        log::trace!("[OSC] Sent {} bytes to {}: {} {}", bytes_sent, self.target_addr, change.addr, change.value);
        Ok(())
    }
}

/// Spawn the thread that owns the OSC socket and sends every change from `rx`.
pub fn spawn_osc_sender(sender: OscSender, rx: Receiver<ParameterChange>) -> JoinHandle<()> {
    thread::spawn(move || {
        crate::general::check::mark_osc_sender_started();
        log::debug!("OSC sender thread started, sending to {}", sender.target_addr);

        loop {
            if crate::EXIT_FLAG.load(Ordering::SeqCst) {
                break;
            }
            match rx.recv_timeout(Duration::from_millis(100)) {
                Ok(change) => {
                    if let Err(e) = sender.send_change(&change) {
                        log::error!("{}", e);
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    log::debug!("OSC sender: parameter channel closed, shutting down");
                    break;
                }
            }
        }

        log::debug!("OSC sender thread terminated");
        crate::general::check::mark_osc_sender_stopped();
    })
}

pub fn create_osc_sender_channel() -> (Sender<ParameterChange>, Receiver<ParameterChange>) {
    channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osc_address() {
        let path = vec!["FX".to_string(), "Audio Effect Rack".to_string(), "Reverb  Level".to_string()];
        assert_eq!(osc_address("/beatstep/", &path), "/beatstep/FX/Audio_Effect_Rack/Reverb_Level");
        assert_eq!(osc_address("", &path[..1]), "/FX");
    }

    #[test]
    fn test_observer_forwards_changes() {
        let (tx, rx) = create_osc_sender_channel();
        let observer = OscParameterObserver::new("/beatstep", tx);
        let path = vec!["Drum".to_string(), "Mixer".to_string(), "Volume".to_string()];
        let volume = Parameter::new("Volume", path, 0.0, 1.0, 0.5);

        observer.parameter_changed(&volume);

        assert_eq!(
            rx.try_recv().unwrap(),
            ParameterChange { addr: "/beatstep/Drum/Mixer/Volume".to_string(), value: 0.5 }
        );
    }

    #[test]
    fn test_sender_encodes_osc_message() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let target = receiver.local_addr().unwrap().to_string();

        let sender = OscSender::new(&target).unwrap();
        sender
            .send_change(&ParameterChange { addr: "/beatstep/FX/Audio_Effect_Rack/EQ_LP".to_string(), value: 0.25 })
            .unwrap();

        let mut buf = [0u8; rosc::decoder::MTU];
        let size = receiver.recv(&mut buf).unwrap();
        let (_, packet) = rosc::decoder::decode_udp(&buf[..size]).unwrap();
        match packet {
            OscPacket::Message(msg) => {
                assert_eq!(msg.addr, "/beatstep/FX/Audio_Effect_Rack/EQ_LP");
                assert_eq!(msg.args, vec![OscType::Float(0.25)]);
            }
            other => panic!("unexpected packet {:?}", other),
        }
    }
}
