use std::io::stdin;
use std::sync::atomic::Ordering;
use std::sync::mpsc::Sender;
use std::thread;

use crate::io::sysex::KNOB_COUNT;

/// Console requests that touch the surface. They are executed on the
/// dispatch thread, which owns the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceCommand {
    /// Reset all knob displays; `None` uses the configured value.
    Reset(Option<i32>),
    SetKnob { position: i32, value: i32 },
    Probe,
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Exit,
    Debug(bool),
    Help,
    Surface(SurfaceCommand),
    Invalid(String),
    Unrecognized(String),
}

pub fn parse_command(line: &str) -> ConsoleCommand {
    let cmd = line.trim();
    let lower = cmd.to_ascii_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();

    match words.as_slice() {
        [] | ["exit"] | ["quit"] | ["q"] => ConsoleCommand::Exit,
        ["debug", "on"] | ["debug", "enable"] => ConsoleCommand::Debug(true),
        ["debug", "off"] | ["debug", "disable"] => ConsoleCommand::Debug(false),
        ["help"] | ["h"] => ConsoleCommand::Help,
        ["probe"] => ConsoleCommand::Surface(SurfaceCommand::Probe),
        ["status"] => ConsoleCommand::Surface(SurfaceCommand::Status),
        ["reset"] => ConsoleCommand::Surface(SurfaceCommand::Reset(None)),
        ["reset", value] => match value.parse::<i32>() {
            Ok(v) => ConsoleCommand::Surface(SurfaceCommand::Reset(Some(v))),
            Err(_) => ConsoleCommand::Invalid(format!("'{}' is not a number", value)),
        },
        ["knob", position, value] => match (position.parse::<i32>(), value.parse::<i32>()) {
            (Ok(p), Ok(v)) if (0..KNOB_COUNT).contains(&p) => {
                ConsoleCommand::Surface(SurfaceCommand::SetKnob { position: p, value: v })
            }
            (Ok(p), Ok(_)) => ConsoleCommand::Invalid(format!("knob position {} is outside 0..15", p)),
            _ => ConsoleCommand::Invalid("usage: knob <position 0-15> <value>".to_string()),
        },
        _ => ConsoleCommand::Unrecognized(cmd.to_string()),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  knob <pos> <val>  - Show <val> on knob <pos> (0-15)");
    println!("  reset [val]       - Reset all knob displays");
    println!("  probe             - Ping the controller via SysEx");
    println!("  status            - Show surface state");
    println!("  debug on/off      - Enable/Disable verbose debug logging");
    println!("  help/h            - Show this help");
    println!("  exit/quit/q       - Exit program");
}

/// Spawn a thread that reads lines from stdin. Empty line or 'exit' sets the
/// global `EXIT_FLAG`; surface commands are forwarded over `tx`.
pub fn spawn_stdin_handler(tx: Sender<SurfaceCommand>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stdin = stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                // EOF: stdin closed, keep running without a console
                Ok(0) => break,
                Ok(_) => {}
                Err(_) => break,
            }

            match parse_command(&line) {
                ConsoleCommand::Exit => {
                    crate::EXIT_FLAG.store(true, Ordering::SeqCst);
                    break;
                }
                ConsoleCommand::Debug(enabled) => {
                    crate::set_debug_enabled(enabled);
                    println!("Debug {}", if enabled { "enabled" } else { "disabled" });
                }
                ConsoleCommand::Help => print_help(),
                ConsoleCommand::Surface(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                ConsoleCommand::Invalid(msg) => println!("Invalid command: {}", msg),
                ConsoleCommand::Unrecognized(cmd) => {
                    println!("Unrecognized command: '{}'. Type 'help' for available commands.", cmd)
                }
            }
        }
    })
}
