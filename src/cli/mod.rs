// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and delegates to Layer 2 (application).
//
//   1. `train`: trains the model and keeps the best checkpoint
//   2. `test`:  loads a checkpoint and reports error metrics

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, TestArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "field-recon",
    version,
    about = "Reconstruct cylinder-wake flow fields from sparse noisy sensors with a CNN."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the matching use case. Never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Test(args)  => run_test(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting experiment '{}'", args.exp);
    let summary = TrainUseCase::new(args.into()).execute()?;

    println!(
        "Trained {} epochs. Final train_loss {:.8}.",
        summary.epochs, summary.train_loss
    );
    match summary.best.epoch {
        Some(epoch) => println!("Best val_loss {:.8} at epoch {}.", summary.best.loss, epoch),
        None        => println!("No validation pass ran."),
    }
    Ok(())
}

fn run_test(args: TestArgs) -> Result<()> {
    use crate::application::test_use_case::TestUseCase;

    let metrics = TestUseCase::new(args.into()).execute()?;
    println!("test mae: {}", metrics.mae);
    println!("test rel_l2: {}", metrics.rel_l2);
    println!("test max_ae: {}", metrics.max_ae);
    Ok(())
}
