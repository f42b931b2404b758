// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with clap and routes each subcommand
// to its use case in Layer 2. Printing happens only here.
//
//   boda train   --data_module M --model_module M --graph_module G [module flags]
//   boda unpack  --artifact_path PATH [--download_path DIR]
//   boda predict --model_dir DIR --sequence ACGT... [--sequence ...]

pub mod commands;

/// Schema-driven parser for `train`
pub mod dynamic;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs, UnpackArgs};

use crate::application::registry::Registries;
use crate::domain::error::BodaError;

#[derive(Parser, Debug)]
#[command(
    name = "boda",
    version = "0.1.0",
    about = "Train, package and restore MPRA sequence-to-activity regression models."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Unpack(args)  => run_unpack(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::{TrainRequest, TrainUseCase};

    let registries = Registries::standard();
    let parsed = match dynamic::parse_train_args(&args.raw, &registries) {
        Ok(parsed) => parsed,
        // help, version and usage errors print themselves and exit
        Err(BodaError::Args(e)) => e.exit(),
        Err(e) => return Err(e.into()),
    };

    let request = TrainRequest::from_parsed(parsed)?;
    let summary = TrainUseCase::new(registries, request).execute()?;

    println!("Trained {} for {} epochs", summary.composed_name, summary.report.epochs_run());
    if let Some(test_loss) = summary.report.test_loss {
        println!("Test loss: {test_loss:.6}");
    }
    println!("Checkpoint: {}", summary.checkpoint.display());
    println!("Archive:    {}", summary.archive.display());
    println!("Artifact:   {}", summary.deposited);
    Ok(())
}

fn run_unpack(args: UnpackArgs) -> Result<()> {
    use crate::application::unpack_use_case;

    let summary = unpack_use_case::execute(&args.artifact_path, &args.download_path)?;
    println!(
        "Extracted {} ({}__{}) to {}",
        summary.model_module,
        summary.timestamp,
        summary.random_tag,
        summary.model_dir.display()
    );
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::load_model;

    let model = load_model(&Registries::standard(), &args.model_dir)?;
    let rows = model.predict(&args.sequences)?;

    for (sequence, row) in args.sequences.iter().zip(rows) {
        let values: Vec<String> = row.iter().map(|v| format!("{v:.6}")).collect();
        println!("{}\t{}", sequence, values.join("\t"));
    }
    Ok(())
}
