use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::atomic::Ordering;
use std::sync::mpsc::channel;
use std::thread;
use std::time::Duration;

use beatstep_surface::config::{self, DEFAULT_CONFIG_PATH};
use beatstep_surface::general::{self, stdin_handler::SurfaceCommand};
use beatstep_surface::io::transport::MidirTransport;
use beatstep_surface::remote::osc_sender::{self, OscParameterObserver, OscSender};
use beatstep_surface::session::{LocalSession, ParameterObserver};
use beatstep_surface::surface::bindings::{apply_bindings, find_tracks};
use beatstep_surface::surface::{ControlSurface, SurfaceLayout};
use beatstep_surface::{get_config, init_config, is_debug_enabled, set_debug_enabled, EXIT_FLAG};

const DISPATCH_INTERVAL: Duration = Duration::from_millis(1);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("beatstep_surface=debug,info"))
        .format_timestamp_millis()
        .init();

    match run() {
        Ok(_) => (),
        Err(err) => {
            log::error!("Error: {}", err);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config_path = env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let loaded = config::load_config_or_default(&config_path)?;
    let config = init_config(loaded);
    // An explicit RUST_LOG wins over the config's debug switch
    if env::var_os("RUST_LOG").is_none() {
        set_debug_enabled(config.debug);
    }

    // Parameter writes go out over OSC
    let mut osc_handle = None;
    let observer: Option<Rc<dyn ParameterObserver>> = if config.osc.enabled {
        let sender = OscSender::new(&config.osc.target)?;
        let (tx, rx) = osc_sender::create_osc_sender_channel();
        osc_handle = Some(osc_sender::spawn_osc_sender(sender, rx));
        log::info!("Forwarding parameter changes to OSC {}", config.osc.target);
        Some(Rc::new(OscParameterObserver::new(&config.osc.path_prefix, tx)) as Rc<dyn ParameterObserver>)
    } else {
        None
    };
    let session = LocalSession::from_config(&config.session, observer);

    let transport = MidirTransport::connect(&config.midi.input_port, &config.midi.output_port)?;
    let mut surface = ControlSurface::new(transport, SurfaceLayout::from(&config.midi));

    {
        let mut guard = surface.component_guard();
        guard.setup_control_inputs();

        let tracks = find_tracks(&session, &config.session.group_name, &config.session.track_names);
        apply_bindings(&mut *guard, &config.session.track_names, &tracks, &config.bindings);

        if config.sysex.reset_on_start {
            guard.reset_knob_values_sysex(config.sysex.reset_value);
        }
        guard.complete();
    }

    let probe = if config.sysex.probe_on_start {
        Some(surface.probe_device(config.sysex.reset_value, ack_timeout(), &EXIT_FLAG))
    } else {
        None
    };
    general::check::print_final_status_after_startup(probe, config.osc.enabled);

    let (cmd_tx, cmd_rx) = channel::<SurfaceCommand>();
    let stdin_handle = general::stdin_handler::spawn_stdin_handler(cmd_tx);

    // All listener dispatch happens on this thread
    while !EXIT_FLAG.load(Ordering::SeqCst) {
        surface.process_incoming();
        while let Ok(command) = cmd_rx.try_recv() {
            handle_surface_command(&mut surface, command);
        }
        thread::sleep(DISPATCH_INTERVAL);
    }

    log::info!("Closing connections and exiting...");
    surface.disconnect();
    drop(surface);
    drop(session);

    if stdin_handle.is_finished() {
        let _ = stdin_handle.join();
    }
    if let Some(handle) = osc_handle {
        let _ = handle.join();
    }

    Ok(())
}

fn ack_timeout() -> Duration {
    Duration::from_secs_f64(get_config().sysex.ack_timeout_secs.max(0.0))
}

fn handle_surface_command(surface: &mut ControlSurface<MidirTransport>, command: SurfaceCommand) {
    let reset_value = get_config().sysex.reset_value;
    match command {
        SurfaceCommand::Reset(value) => {
            let value = value.unwrap_or(reset_value);
            surface.reset_knob_values_sysex(value);
            println!("Knob displays reset to {}", value.clamp(0, 127));
        }
        SurfaceCommand::SetKnob { position, value } => {
            surface.set_knob_value_sysex(position, value);
            println!("Knob {} set to {}", position, value.clamp(0, 127));
        }
        SurfaceCommand::Probe => {
            let answered = surface.probe_device(reset_value, ack_timeout(), &EXIT_FLAG);
            general::check::print_probe_result(answered);
        }
        SurfaceCommand::Status => print_status(surface),
    }
}

fn print_status(surface: &ControlSurface<MidirTransport>) {
    let transport = surface.transport();
    println!("Ports: '{}' -> '{}'", transport.in_port_name(), transport.out_port_name());
    println!("Listeners: {}", surface.listener_count());
    let knobs: Vec<String> = surface.knobs().iter().map(|k| k.value().to_string()).collect();
    println!("Knobs: [{}]", knobs.join(" "));
    let held: Vec<String> = surface
        .steps()
        .iter()
        .chain(surface.pads())
        .filter(|b| b.is_pressed())
        .map(|b| b.to_string())
        .collect();
    if held.is_empty() {
        println!("Buttons held: none");
    } else {
        println!("Buttons held: {}", held.join(", "));
    }
    println!("OSC sender running: {}", general::check::is_osc_sender_running());
    println!("Debug logging: {}", if is_debug_enabled() { "on" } else { "off" });
}
