use clap::Parser;
use digit_net::config::{load_config, validate_config, TrainingConfig};
use digit_net::data::{build_batches, load_idx_pairs, load_raw_pairs, Image};
use digit_net::network::Network;
use digit_net::persistence::{load_model, save_model};
use log::{error, info, warn};
use std::error::Error;
use std::path::PathBuf;
use std::process;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Train and evaluate the leaky-ReLU digit classification network.
///
/// Several datasets are combined by repeating `--images` and `--labels`;
/// the n-th image file is paired with the n-th label file.
#[derive(Debug, Parser)]
#[command(name = "digit_mlp")]
struct Args {
    /// Image file (IDX, or raw bytes with --raw); repeatable
    #[arg(long, required = true)]
    images: Vec<PathBuf>,

    /// Label file matching each --images entry; repeatable
    #[arg(long, required = true)]
    labels: Vec<PathBuf>,

    /// JSON training configuration; built-in defaults when omitted
    #[arg(long)]
    config: Option<String>,

    /// Treat the data files as header-less byte streams
    #[arg(long)]
    raw: bool,

    /// Passes over the data; batches are reshuffled for every pass
    #[arg(long, default_value_t = 1)]
    epochs: usize,

    /// Start from a previously saved model instead of random weights
    #[arg(long)]
    load: Option<PathBuf>,

    /// Where to write the trained model
    #[arg(long)]
    save: Option<PathBuf>,
}

/// Resolves the training configuration from `--config` or the defaults.
fn config_from_args(args: &Args) -> Result<TrainingConfig, Box<dyn Error>> {
    match &args.config {
        Some(path) => load_config(path),
        None => {
            let config = TrainingConfig::default();
            validate_config(&config)?;
            Ok(config)
        }
    }
}

/// Image/label path pairs in command-line order.
fn file_pairs(args: &Args) -> Result<Vec<(&PathBuf, &PathBuf)>, Box<dyn Error>> {
    if args.images.len() != args.labels.len() {
        return Err(format!(
            "{} image files but {} label files; pass one --labels per --images",
            args.images.len(),
            args.labels.len()
        )
        .into());
    }
    Ok(args.images.iter().zip(&args.labels).collect())
}

fn load_samples(args: &Args, config: &TrainingConfig) -> Result<Vec<Image>, Box<dyn Error>> {
    let pairs = file_pairs(args)?;
    let mut samples = if args.raw {
        load_raw_pairs(&pairs, config.image_size)?
    } else {
        load_idx_pairs(&pairs)?
    };

    if let Some(limit) = config.sample_limit {
        if limit < samples.len() {
            info!("using the first {} of {} samples", limit, samples.len());
            samples.truncate(limit);
        }
    }
    Ok(samples)
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let program_start = Instant::now();
    let config = config_from_args(&args)?;
    let mut rng = config.rng();

    info!("loading data...");
    let load_start = Instant::now();
    let mut samples = load_samples(&args, &config)?;
    info!(
        "loaded {} samples in {:.2} seconds",
        samples.len(),
        load_start.elapsed().as_secs_f64()
    );

    let mut network = match &args.load {
        Some(path) => load_model(path, config.optimizer())?,
        None => Network::new(&config.layer_sizes, config.optimizer(), &mut rng)?,
    }
    .with_cost_threshold(config.cost_threshold);

    let train_start = Instant::now();
    for epoch in 0..args.epochs {
        let epoch_start = Instant::now();
        network.reset_score();

        let batches = build_batches(&mut samples, config.batch_size, &mut rng);
        if batches.is_empty() {
            warn!(
                "no full batch of {} fits in {} samples; nothing to train",
                config.batch_size,
                samples.len()
            );
            break;
        }
        network.train(&batches)?;

        let score = network.score();
        info!(
            "epoch {}: running score {}/{} ({:.2}%) time {:.2}s",
            epoch + 1,
            score.correct,
            score.total,
            score.accuracy() * 100.0,
            epoch_start.elapsed().as_secs_f64()
        );
    }
    info!(
        "total training time: {:.2} seconds",
        train_start.elapsed().as_secs_f64()
    );

    let accuracy = network.evaluate(&samples);
    info!("classification accuracy: {:.2}%", accuracy * 100.0);

    if let Some(path) = &args.save {
        save_model(&network, path)?;
    }

    info!(
        "total program time: {:.2} seconds",
        program_start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();
    if let Err(err) = run(args) {
        error!("{}", err);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_defaults() {
        let args = Args::try_parse_from([
            "digit_mlp",
            "--images",
            "train-images.idx3-ubyte",
            "--labels",
            "train-labels.idx1-ubyte",
        ])
        .unwrap();

        assert_eq!(args.epochs, 1);
        assert!(!args.raw);
        assert!(args.config.is_none());
        assert!(args.save.is_none());
    }

    #[test]
    fn test_repeated_file_pairs() {
        let args = Args::try_parse_from([
            "digit_mlp",
            "--images",
            "train-images",
            "--labels",
            "train-labels",
            "--images",
            "test-images",
            "--labels",
            "test-labels",
        ])
        .unwrap();

        let pairs = file_pairs(&args).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].0, &PathBuf::from("test-images"));
        assert_eq!(pairs[1].1, &PathBuf::from("test-labels"));
    }

    #[test]
    fn test_unpaired_files_rejected() {
        let args = Args::try_parse_from([
            "digit_mlp",
            "--images",
            "a",
            "--images",
            "b",
            "--labels",
            "c",
        ])
        .unwrap();
        assert!(file_pairs(&args).is_err());
    }

    #[test]
    fn test_help_text_from_doc_comment() {
        use clap::CommandFactory;

        let command = Args::command();
        let about = command.get_about().map(|text| text.to_string()).unwrap_or_default();
        assert!(about.starts_with("Train and evaluate the leaky-ReLU digit"));
        let long_about = command
            .get_long_about()
            .map(|text| text.to_string())
            .unwrap_or_default();
        assert!(long_about.contains("repeating `--images`"));
    }

    #[test]
    fn test_images_required() {
        assert!(Args::try_parse_from(["digit_mlp", "--labels", "b"]).is_err());
    }

    #[test]
    fn test_config_from_args_without_config() {
        let args = Args::try_parse_from(["digit_mlp", "--images", "a", "--labels", "b"]).unwrap();
        let config = config_from_args(&args).unwrap();
        assert_eq!(config, TrainingConfig::default());
    }
}
