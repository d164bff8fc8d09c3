//! cmdmend command-line interface.
//!
//! # Commands
//!
//! - `cmdmend train`: train the correction model against a corpus
//!
//! # Examples
//!
//! ```bash
//! # Train with defaults
//! cmdmend train --vocabulary vocab.txt --corpus history.txt --models-dir ./models
//!
//! # Train from a TOML config, resuming an earlier checkpoint
//! cmdmend train --config train.toml \
//!     --vocabulary vocab.txt --corpus history.txt --models-dir ./models \
//!     --from-model ./models/correction_e100.safetensors
//! ```

use std::path::PathBuf;

use anyhow::Context;
use candle_core::Device;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cmdmend_core::{
    BatchGenerator, CharInventory, FixedWidthCodec, SeededNoise, TrainConfig, VocabTrie,
};
use cmdmend_model::{CorrectionNet, Trainer};

#[derive(Parser)]
#[command(name = "cmdmend", about = "Shell-command spelling correction trainer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the correction model
    Train(TrainArgs),
}

/// Arguments for the train command.
#[derive(Args)]
struct TrainArgs {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Vocabulary file (alphabet + prefix trie source)
    #[arg(short, long)]
    vocabulary: PathBuf,

    /// Corpus of clean commands, one per line
    #[arg(long)]
    corpus: PathBuf,

    /// Directory for checkpoint files
    #[arg(short, long)]
    models_dir: PathBuf,

    /// Resume from an existing checkpoint
    #[arg(long)]
    from_model: Option<PathBuf>,

    /// Seed for the corruption noise source (entropy-seeded when omitted)
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Train(args) => train(args),
    }
}

fn train(args: TrainArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => TrainConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => TrainConfig::default(),
    }
    .with_env_overrides();
    config.validate().context("validating configuration")?;

    let inventory = CharInventory::from_vocab_file(&args.vocabulary)
        .with_context(|| format!("reading vocabulary {}", args.vocabulary.display()))?;
    let trie = VocabTrie::from_file(&args.vocabulary)
        .with_context(|| format!("building prefix trie from {}", args.vocabulary.display()))?;
    info!(
        alphabet = inventory.len(),
        vocab_entries = trie.len(),
        corpus = %args.corpus.display(),
        "pipeline ready"
    );

    let noise = match args.seed {
        Some(seed) => SeededNoise::from_seed(seed),
        None => SeededNoise::from_entropy(),
    };
    let mut generator =
        BatchGenerator::new(&inventory, &trie, &args.corpus, &config.pipeline, noise);
    let codec = FixedWidthCodec::new(&inventory);

    let device = Device::Cpu;
    let net = CorrectionNet::new(
        &config.model,
        inventory.len(),
        config.pipeline.max_cmd_len,
        &device,
    )
    .context("building correction net")?;

    let mut trainer = Trainer::new(net, &config, device, &args.models_dir);
    if let Some(checkpoint) = &args.from_model {
        trainer
            .resume_from(checkpoint)
            .with_context(|| format!("resuming from {}", checkpoint.display()))?;
    }

    trainer
        .train(&mut generator, &codec)
        .context("training run failed")?;
    Ok(())
}
