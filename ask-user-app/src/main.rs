mod app;
mod sink;
mod widgets;

use std::fs;
use std::io::{self, Read};
use std::sync::mpsc;

use ask_user_app::Session;
use clap::Parser;
use eframe::egui;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::sink::{print_cancelled, OutputFormat, StdoutSink};

#[derive(Parser, Debug)]
#[command(name = "ask-user-app", about = "Ask multiple-choice questions in a native dialog")]
struct Args {
    /// Question batch as JSON (`{"questions": [...]}`), or `-` for stdin
    #[arg(short, long)]
    input: String,

    /// Shape of each response written to stdout
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn read_input(path: &str) -> io::Result<String> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        fs::read_to_string(path)
    }
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let content = read_input(&args.input).unwrap_or_else(|e| {
        error!(input = %args.input, "Error: {}", e);
        std::process::exit(1);
    });

    let session = Session::from_json(&content).unwrap_or_else(|e| {
        error!("Error: {}", e);
        std::process::exit(1);
    });

    let (tx, rx) = mpsc::channel();
    let sink = StdoutSink::new(args.format, tx);

    let opts = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([460.0, 560.0])
            .with_min_inner_size([380.0, 440.0])
            .with_title("")
            .with_decorations(true)
            .with_transparent(false)
            .with_always_on_top(),
        centered: true,
        ..Default::default()
    };

    eframe::run_native("ask-user", opts, Box::new(move |_| {
        Ok(Box::new(App::new(session, sink)))
    }))?;

    let delivered = rx.try_iter().count();
    info!(delivered, "dialog closed");
    if delivered == 0 {
        if let Err(e) = print_cancelled(args.format) {
            error!("Error: {}", e);
        }
    }
    Ok(())
}
