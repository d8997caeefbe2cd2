//! Command-line parsing for the `fisherface` binary.
//!
//! Argument parsing and command dispatch stay separate from the numeric code;
//! `app` turns these structs into pipeline calls.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fisherface", version, about = "Fisherface face recognition (PCA + Fisher LDA)")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Train a model from a directory of face images and save it as JSON.
    Train(TrainArgs),
    /// Recognise one or more face images with a saved model.
    Recognize(RecognizeArgs),
    /// Score a saved model on a directory holding one test image per class.
    Evaluate(EvaluateArgs),
    /// Train and evaluate on synthetic data, without touching the filesystem.
    Demo(DemoArgs),
}

#[derive(Debug, Args, Clone)]
pub struct TrainArgs {
    /// Directory of training images; K consecutive files (natural order) per person.
    #[arg(long, value_name = "DIR")]
    pub train_dir: PathBuf,

    /// Images per person (K). Overrides FISHERFACE_CLASS_POPULATION.
    #[arg(short = 'k', long)]
    pub class_population: Option<usize>,

    /// Required image width in pixels.
    #[arg(long, requires = "height")]
    pub width: Option<u32>,

    /// Required image height in pixels.
    #[arg(long, requires = "width")]
    pub height: Option<u32>,

    /// Where to write the model JSON.
    #[arg(short, long, value_name = "JSON", default_value = "model.json")]
    pub out: PathBuf,

    /// Also export the legacy `.mat` matrices into this directory.
    #[arg(long, value_name = "DIR")]
    pub export_mat: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct RecognizeArgs {
    /// Model JSON produced by `fisherface train`.
    #[arg(short, long, value_name = "JSON")]
    pub model: PathBuf,

    /// Images to recognise.
    #[arg(required = true, value_name = "IMAGE")]
    pub images: Vec<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct EvaluateArgs {
    /// Model JSON produced by `fisherface train`.
    #[arg(short, long, value_name = "JSON")]
    pub model: PathBuf,

    /// Directory of test images; image i (natural order) belongs to class i.
    #[arg(long, value_name = "DIR")]
    pub test_dir: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Number of synthetic people (C).
    #[arg(long, default_value_t = 3)]
    pub classes: usize,

    /// Images per person (K).
    #[arg(long, default_value_t = 4)]
    pub per_class: usize,

    /// Pixels per image (N).
    #[arg(long, default_value_t = 16)]
    pub pixels: usize,

    /// Standard deviation of the per-image noise.
    #[arg(long, default_value_t = 2.0)]
    pub jitter: f64,

    /// Standard deviation of the noise on each held-out query.
    #[arg(long, default_value_t = 0.1)]
    pub query_noise: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
