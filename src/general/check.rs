use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

static OSC_SENDER_COUNT: AtomicI32 = AtomicI32::new(0);
static BANNER_PRINTED: AtomicBool = AtomicBool::new(false);

pub fn mark_osc_sender_started() {
    OSC_SENDER_COUNT.fetch_add(1, Ordering::SeqCst);
}

pub fn mark_osc_sender_stopped() {
    OSC_SENDER_COUNT.fetch_sub(1, Ordering::SeqCst);
}

pub fn is_osc_sender_running() -> bool {
    OSC_SENDER_COUNT.load(Ordering::SeqCst) > 0
}

fn print_colored(color: Color, line: &str) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_intense(true));
    let _ = writeln!(&mut stdout, "{}", line);
    let _ = stdout.reset();
}

// Quick help line in blue (works on Windows CMD via termcolor)
pub fn print_quick_help() {
    print_colored(Color::Blue, "Type 'help' for commands, 'exit' to quit");
}

/// Print the one-off startup banner. Later calls are ignored.
fn print_banner(color: Color, line: &str) {
    if BANNER_PRINTED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return;
    }
    print_colored(color, line);
    print_quick_help();
}

pub fn print_controller_answering() {
    print_banner(Color::Green, "Controller answering | Surface active");
}

pub fn print_controller_silent() {
    print_banner(Color::Yellow, "Controller did not answer | Surface active, knob displays may be stale");
}

pub fn print_surface_active() {
    print_banner(Color::Green, "Surface active");
}

/// Final status line after setup. `probe` is the result of the SysEx
/// liveness probe, `None` when probing is disabled.
pub fn print_final_status_after_startup(probe: Option<bool>, osc_enabled: bool) {
    if osc_enabled && !is_osc_sender_running() {
        // Sender thread may still be starting up
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
    if osc_enabled && !is_osc_sender_running() {
        print_colored(Color::Red, "OSC sender not running | parameter changes stay local");
    }

    match probe {
        Some(true) => print_controller_answering(),
        Some(false) => print_controller_silent(),
        None => print_surface_active(),
    }
}

/// Report the result of a probe requested from the console.
pub fn print_probe_result(answered: bool) {
    if answered {
        print_colored(Color::Green, "Controller answered");
    } else {
        print_colored(Color::Red, "No answer from controller");
    }
}
