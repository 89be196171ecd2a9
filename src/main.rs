use std::{error::Error, fs::File, sync::mpsc};

use clap::Parser;
use env_logger::{Env, Target};
use log::info;

use mem_watch::app::{App, PlotConfig};
use mem_watch::config::{Cli, Config};
use mem_watch::diagnostics::LogSink;
use mem_watch::{stream, ui};

fn init_logging(config: &Config) -> Result<(), Box<dyn Error>> {
    // The chart owns the terminal, so diagnostics go to a file
    let file = File::create(&config.log_file)?;
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::try_from(Cli::parse())?;
    init_logging(&config)?;
    info!("watching {}", config.endpoint);

    let app = App::initialize(PlotConfig::new(format!("mem_watch [{}]", config.endpoint)));

    let (tx, rx) = mpsc::channel();
    // Detached: the reader thread ends on its own once the UI drops `rx`
    stream::connect(config.endpoint.clone(), tx, LogSink)?;

    ui::run(app, rx)?;
    info!("session ended");
    Ok(())
}
