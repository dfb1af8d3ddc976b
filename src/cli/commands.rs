//! Subcommand handlers and the interactive capture screen.

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver};

use super::args::{Args, ConfigAction};
use shutter::clock::{Clock, SystemClock};
use shutter::config::{default_path as get_config_path, Config, DEFAULT_CONFIG_TOML};
use shutter::permissions::PolicyPermissionAuthority;
use shutter::session::{
    capture_file_name, run_host, CaptureSessionController, Collaborators, HostEvent, MainContext,
    SessionState, UiNotice,
};

/// Handle config subcommand actions.
pub fn handle_config_action(action: ConfigAction, config_path: Option<&Path>) {
    match action {
        ConfigAction::Show => {
            let config = match Config::load(config_path) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            let controller = config.controller_config();

            println!("Current configuration:");
            println!("  Output directory: {}", controller.output_dir.display());
            println!("  Capture mode: {:?}", controller.capture_mode);
            println!("  Lens: {}", controller.selector.lens_facing.name());
            println!("  Provider: {:?}", config.camera.provider);
            if !config.camera.command.is_empty() {
                println!("  Command: {}", config.camera.command.join(" "));
            }
            println!(
                "  Still resolution: {}",
                controller.capture_resolution
            );
            println!(
                "  Required permissions: {}",
                controller
                    .required_permissions
                    .iter()
                    .map(|k| k.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            println!("  Permission policy: {:?}", config.permissions.policy);
            println!();

            let path = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(get_config_path);
            if path.exists() {
                println!("Config file: {} (exists)", path.display());
            } else {
                println!("Config file: {} (not found)", path.display());
            }
        }
        ConfigAction::Init => {
            let path = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(get_config_path);
            if path.exists() {
                eprintln!("Config file already exists: {}", path.display());
                eprintln!("Use 'shutter config show' to view current settings.");
                std::process::exit(1);
            }

            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    eprintln!("Error creating config directory: {}", e);
                    std::process::exit(1);
                }
            }

            if let Err(e) = std::fs::write(&path, DEFAULT_CONFIG_TOML) {
                eprintln!("Error writing config file: {}", e);
                std::process::exit(1);
            }

            println!("Created config file: {}", path.display());
        }
    }
}

/// Print the file name a capture taken right now would get.
pub fn print_capture_name() {
    println!("{}", capture_file_name(&SystemClock.now()));
}

/// Map one line of terminal input to a host event.
pub fn parse_input(line: &str) -> Option<HostEvent> {
    match line.trim() {
        "" | "c" => Some(HostEvent::CaptureRequested),
        "p" => Some(HostEvent::HostInactive),
        "r" => Some(HostEvent::HostActive),
        "q" => Some(HostEvent::Close),
        _ => None,
    }
}

/// Text shown for a notice.
pub fn render_notice(notice: &UiNotice) -> String {
    match notice {
        UiNotice::PermissionDenied => "Permissions not granted by the user.".to_string(),
        UiNotice::CaptureSaved(locator) => format!("Photo capture succeeded: {}", locator),
        UiNotice::CaptureFailed(reason) => format!("Photo capture failed: {}", reason),
    }
}

/// Run the capture screen until the user quits or permission is refused.
pub async fn run_screen(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load(args.config.as_deref())?;
    args.apply_overrides(&mut config);

    let authority = Arc::new(PolicyPermissionAuthority::new(config.permissions.policy));
    let collaborators = Collaborators::new(authority, config.camera_provider());
    let controller_config = config.controller_config();
    let output_dir = controller_config.output_dir.clone();

    let (main, events) = MainContext::channel();
    let (notice_tx, notice_rx) = mpsc::unbounded_channel();
    let controller =
        CaptureSessionController::new(controller_config, collaborators, main.clone(), notice_tx)?;

    println!("Saving photos to {}", output_dir.display());
    println!("Press Enter to take a photo, p to pause, r to resume, q to quit.");

    let printer = tokio::spawn(print_notices(notice_rx));
    spawn_input_reader(main.clone());

    let ctrlc_main = main.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrlc_main.post(HostEvent::Close);
        }
    });
    drop(main);

    let state = run_host(controller, events).await;
    // The controller is gone, so the notice channel drains and closes
    let _ = printer.await;

    match state {
        SessionState::Denied => Err("camera permission was refused".into()),
        SessionState::BindFailed => {
            Err("camera could not be started (see log for details)".into())
        }
        _ => Ok(()),
    }
}

async fn print_notices(mut notices: UnboundedReceiver<UiNotice>) {
    while let Some(notice) = notices.recv().await {
        println!("{}", render_notice(&notice));
    }
}

/// Read commands from stdin on a dedicated thread.
///
/// Reading stdin through tokio would keep the runtime alive at exit.
fn spawn_input_reader(main: MainContext) {
    let spawned = std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                match parse_input(&line) {
                    Some(event) => {
                        let closing = matches!(event, HostEvent::Close);
                        if !main.post(event) || closing {
                            return;
                        }
                    }
                    None => eprintln!("Unknown command '{}' (c, p, r, q)", line.trim()),
                }
            }
            // EOF closes the screen
            main.post(HostEvent::Close);
        });
    if let Err(e) = spawned {
        log::warn!("Failed to start input reader: {}", e);
    }
}
