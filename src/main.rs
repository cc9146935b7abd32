use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::info;

use ferrite_digits::engine::{Engine, LiteModel, LITE_MAGIC};
use ferrite_digits::error::{ConfigError, ModelError};
use ferrite_digits::preprocess::Preprocessor;
use ferrite_digits::{logging, ClassificationResult, Config, EncodedImage, InferenceEngine, Network, Pipeline};

#[derive(Parser, Debug)]
#[command(name = "ferrite-digits", version, about = "Handwritten digit recognition from the command line")]
struct Cli {
    /// JSON config file; defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a PNG/JPEG/BMP/GIF image file and print the result as JSON.
    Classify {
        image: PathBuf,
        /// Model artifact, overriding the config.
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
    /// Compile a JSON model into a lite artifact.
    Compile {
        model: PathBuf,
        output: PathBuf,
    },
    /// Describe a JSON model or a lite artifact.
    Inspect {
        artifact: PathBuf,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot format output: {0}")]
    Output(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ferrite-digits: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    logging::init_tracing(&config.log_filter);

    match cli.command {
        Command::Classify { image, model } => {
            if let Some(model) = model {
                config.model_path = model;
            }
            classify(&config, &image)
        }
        Command::Compile { model, output } => {
            compile(&model, &output)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Inspect { artifact } => {
            inspect(&artifact)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ---------------------------------------------------------------------------
// classify
// ---------------------------------------------------------------------------

fn classify(config: &Config, image: &Path) -> Result<ExitCode, CliError> {
    let bytes = std::fs::read(image)
        .map_err(|source| CliError::Read { path: image.to_path_buf(), source })?;
    let encoded = EncodedImage::from_image_bytes(media_type(image), &bytes);

    let engine: Arc<dyn InferenceEngine> = Arc::new(Engine::load(&config.model_path));
    let pipeline = Pipeline::new(engine)
        .with_preprocessor(Preprocessor::new(config.resize_filter));

    let result = pipeline.classify(&encoded);
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(match result {
        ClassificationResult::Prediction(_) => ExitCode::SUCCESS,
        ClassificationResult::Error(_) => ExitCode::FAILURE,
    })
}

/// Only used for the data-URI prefix; the decoder sniffs the real format.
fn media_type(path: &Path) -> &'static str {
    let ext = path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        _ => "image/png",
    }
}

// ---------------------------------------------------------------------------
// compile / inspect
// ---------------------------------------------------------------------------

fn compile(model: &Path, output: &Path) -> Result<(), CliError> {
    let network = Network::load_json(model)?;
    let lite = LiteModel::compile(&network)?;
    lite.save(output)?;
    info!(
        from = %model.display(),
        to = %output.display(),
        layers = lite.layers.len(),
        parameters = lite.parameter_count(),
        "compiled lite artifact"
    );
    Ok(())
}

fn inspect(artifact: &Path) -> Result<(), CliError> {
    let bytes = std::fs::read(artifact)
        .map_err(|source| CliError::Read { path: artifact.to_path_buf(), source })?;

    if bytes.starts_with(LITE_MAGIC) {
        let model = LiteModel::from_bytes(&bytes)?;
        println!("format:     lite");
        println!("input:      {:?} {:?}", model.input.shape, model.input.dtype);
        println!("outputs:    {}", model.outputs);
        println!("parameters: {}", model.parameter_count());
        for (i, layer) in model.layers.iter().enumerate() {
            println!("  layer {}: {} -> {} {:?}", i, layer.inputs, layer.size, layer.activation);
        }
    } else {
        let network: Network = serde_json::from_slice(&bytes).map_err(ModelError::from)?;
        network.validate()?;
        let parameters: usize = network.layers.iter()
            .map(|l| l.weights.rows * l.weights.cols + l.biases.cols)
            .sum();
        println!("format:     json");
        println!("inputs:     {}", network.input_size());
        println!("outputs:    {}", network.output_size());
        println!("parameters: {}", parameters);
        for (i, layer) in network.layers.iter().enumerate() {
            println!("  layer {}: {} -> {} {:?}", i, layer.input_size(), layer.size, layer.activator);
        }
        if let Some(meta) = &network.metadata {
            if let Some(description) = &meta.description {
                println!("description: {}", description);
            }
            if let Some(input_type) = &meta.input_type {
                println!("input type:  {:?}", input_type);
            }
            if let Some(labels) = &meta.output_labels {
                println!("labels:      {}", labels.join(", "));
            }
        }
    }
    Ok(())
}
