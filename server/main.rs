/// ferrite-digits server
///
/// Serves a drawing page and a JSON prediction endpoint over a synchronous
/// tiny_http server, one thread per request.
///
/// Run with:
///   cargo run --bin digit-server --release -- --model trained_models/digits.json
/// Then open http://127.0.0.1:7878
///
/// Routes:
///   GET  /         drawing canvas
///   POST /predict  {"image": "<data uri>"} -> {"prediction", "confidence"}
///   GET  /health   active engine variant

mod state;
mod routes;
mod handlers;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tiny_http::Server;
use tracing::{error, info};

use ferrite_digits::{logging, Config, Pipeline};

#[derive(Parser, Debug)]
#[command(name = "digit-server", version, about = "Handwritten digit recognition over HTTP")]
struct Args {
    /// JSON config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model artifact, overriding the config.
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Bind address, overriding the config.
    #[arg(short, long)]
    addr: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("digit-server: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(model) = args.model {
        config.model_path = model;
    }
    if let Some(addr) = args.addr {
        config.addr = addr;
    }

    logging::init_tracing(&config.log_filter);

    // Engine is loaded once, before the first request arrives.
    let pipeline = Arc::new(Pipeline::global(&config));
    if !pipeline.engine().is_enabled() {
        info!("serving without a model; /predict will answer \"Error\"");
    }

    let server = match Server::http(config.addr.as_str()) {
        Ok(server) => server,
        Err(e) => {
            error!(addr = %config.addr, error = %e, "failed to bind HTTP server");
            return ExitCode::FAILURE;
        }
    };
    info!(addr = %config.addr, engine = pipeline.engine().name(), "listening on http://{}", config.addr);

    for request in server.incoming_requests() {
        let pipeline = Arc::clone(&pipeline);
        std::thread::spawn(move || {
            routes::dispatch(request, pipeline);
        });
    }

    ExitCode::SUCCESS
}
