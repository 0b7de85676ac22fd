// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes to Layer 2. The only
// layer that prints to stdout.
//
//   rationale-trainer train   --train-data … --validation-data …
//   rationale-trainer predict --data … [--attention]

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "rationale-trainer",
    version,
    about = "Train a sequence classifier with rationale-supervised attention, then score data with it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let use_case = TrainUseCase::new(args.into());
    let report   = use_case.execute()?;

    println!(
        "Training complete after {} epochs. Best epoch {} (validation loss {:.4}) saved to '{}'.",
        report.trained_epochs,
        report.best_epoch,
        report.best_validation_loss,
        report.checkpoint_path.display(),
    );
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case    = PredictUseCase::new(args.checkpoint_dir)?;
    let predictions = use_case.predict(&args.data, args.attention)?;
    println!("{}", serde_json::to_string_pretty(&predictions)?);
    Ok(())
}
