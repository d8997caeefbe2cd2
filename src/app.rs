//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real entry point that:
//! - parses CLI arguments and installs logging
//! - layers CLI flags over environment settings (training commands only)
//! - runs the requested workflow and prints its report

use clap::Parser;

use crate::cli::{Cli, Command, DemoArgs, EvaluateArgs, RecognizeArgs, TrainArgs};
use crate::config::Settings;
use crate::data::SyntheticSpec;
use crate::error::FaceError;
use crate::io::read_model_json;
use crate::report::{format_evaluation, format_match, format_model_summary, format_training_summary};

pub mod pipeline;

/// Entry point for the `fisherface` binary.
pub fn run() -> Result<(), FaceError> {
    let cli = Cli::parse();
    crate::logging::init(cli.verbose);

    dispatch(cli.command, Settings::from_env)
}

/// Run one command. `load_settings` is only called by commands that train.
pub fn dispatch<F>(command: Command, load_settings: F) -> Result<(), FaceError>
where
    F: FnOnce() -> Result<Settings, FaceError>,
{
    match command {
        Command::Train(args) => handle_train(args, load_settings()?),
        Command::Recognize(args) => handle_recognize(args),
        Command::Evaluate(args) => handle_evaluate(args),
        Command::Demo(args) => handle_demo(args, load_settings()?),
    }
}

fn handle_train(args: TrainArgs, settings: Settings) -> Result<(), FaceError> {
    let settings = settings_from_args(&args, settings);
    let run = pipeline::train_from_dir(&args.train_dir, &settings, &args.out, args.export_mat.as_deref())?;

    println!("{}", format_training_summary(&run.training));
    println!("Model written to {}", args.out.display());
    if let Some(dir) = &args.export_mat {
        println!("Legacy matrices written to {}", dir.display());
    }
    Ok(())
}

fn handle_recognize(args: RecognizeArgs) -> Result<(), FaceError> {
    let model = read_model_json(&args.model)?;
    for (path, found) in pipeline::recognize_files(&model, &args.images)? {
        println!("{}", format_match(&path.display().to_string(), &model, &found));
    }
    Ok(())
}

fn handle_evaluate(args: EvaluateArgs) -> Result<(), FaceError> {
    let model = read_model_json(&args.model)?;
    let report = pipeline::evaluate_dir(&model, &args.test_dir)?;

    println!("{}", format_model_summary(&model));
    println!("{}", format_evaluation(&model, &report));
    Ok(())
}

fn handle_demo(args: DemoArgs, settings: Settings) -> Result<(), FaceError> {
    let spec = SyntheticSpec {
        classes: args.classes,
        per_class: args.per_class,
        pixels: args.pixels,
        jitter: args.jitter,
        seed: args.seed,
        ..SyntheticSpec::default()
    };
    let run = pipeline::run_demo(&spec, &settings, args.query_noise)?;

    println!("{}", format_training_summary(&run.training));
    println!("{}", format_evaluation(&run.training.model, &run.report));
    Ok(())
}

/// CLI flags override whatever the environment configured.
pub fn settings_from_args(args: &TrainArgs, mut settings: Settings) -> Settings {
    if let Some(k) = args.class_population {
        settings.train.class_population = k;
    }
    if args.width.is_some() {
        settings.image_width = args.width;
    }
    if args.height.is_some() {
        settings.image_height = args.height;
    }
    settings
}
