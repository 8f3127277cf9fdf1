use cfc_nvim::cli::{self, Cli};
use cfc_nvim::config::Config;
use cfc_nvim::serve;
use clap::Parser;
use log::info;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    match cli.command {
        None => {
            info!("cfc-nvim {} starting", env!("CARGO_PKG_VERSION"));

            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(e) => {
                    log::error!("Failed to create tokio runtime: {}", e);
                    std::process::exit(1);
                }
            };

            if let Err(e) = runtime.block_on(serve(config)) {
                log::error!("Plugin error: {}", e);
                std::process::exit(1);
            }
        }
        Some(command) => {
            let stdout = std::io::stdout();
            if let Err(e) = cli::execute(command, &config, &mut stdout.lock()) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
