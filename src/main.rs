mod cli;

use clap::Parser;
use cli::{Args, Command};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match args.command.clone() {
        Some(Command::Config { action }) => {
            cli::handle_config_action(action, args.config.as_deref());
        }
        Some(Command::Name) => cli::print_capture_name(),
        None => {
            if let Err(e) = cli::run_screen(&args).await {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
