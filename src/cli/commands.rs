// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands:
//
//   train   — flags depend on the chosen modules, so the raw
//             tokens are collected here and parsed by dynamic.rs
//   unpack  — fetch + extract a packaged artifact
//   predict — score sequences with an extracted model

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a model (see `boda train --data_module .. --model_module .. --graph_module .. --help`)
    #[command(disable_help_flag = true)]
    Train(TrainArgs),

    /// Download (gs:// or s3://) if needed, validate and extract an artifact
    Unpack(UnpackArgs),

    /// Predict activity for DNA sequences with an extracted model
    Predict(PredictArgs),
}

/// Raw `train` tokens, parsed once the modules are known
#[derive(Args, Debug)]
pub struct TrainArgs {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
    pub raw: Vec<String>,
}

#[derive(Args, Debug)]
pub struct UnpackArgs {
    /// Local path or cloud URI of a model_artifacts__*.tar.gz archive
    #[arg(long = "artifact_path")]
    pub artifact_path: String,

    /// Where the archive is downloaded and extracted
    #[arg(long = "download_path", default_value = "./")]
    pub download_path: PathBuf,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Extracted artifact directory holding boda_checkpoint.json
    #[arg(long = "model_dir")]
    pub model_dir: PathBuf,

    /// DNA sequence to score; repeat for several
    #[arg(long = "sequence", required = true)]
    pub sequences: Vec<String>,
}
