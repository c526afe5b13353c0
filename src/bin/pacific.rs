use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use pacific_rs::config::{PacificConfig, DEFAULT_CHUNK_SIZE, DEFAULT_THRESHOLD};
use pacific_rs::error::PacificError;
use pacific_rs::fastx::FileFormat;
use pacific_rs::kmer::DEFAULT_KMER_SIZE;
use pacific_rs::labels::{read_truth_table, AccuracyOutcome, LabelEncoder};
use pacific_rs::logging::init_logger;
use pacific_rs::model::SequenceClassifier;
use pacific_rs::tokenizer::KmerTokenizer;
use pacific_rs::{classify_reads, evaluate_predictions, write_summary};

/// Predicts the presence of SARS-CoV-2, Influenza, Metapneumovirus,
/// Rhinovirus and other Coronaviridae in a FASTA/FASTQ file and their
/// relative sample proportions.
///
/// Default parameters are recommended to keep accuracy high.
#[derive(Debug, Parser)]
#[command(name = "pacific", version = env!("CARGO_PKG_VERSION"))]
struct Args {
    #[arg(short = 'i', long = "input_file", help = "FASTA/FASTQ input file path (.gz accepted)")]
    input_file: PathBuf,

    #[arg(short = 'm', long = "model", help = "PACIFIC model file path")]
    model: PathBuf,

    #[arg(short = 't', long = "tokenizer", help = "Tokenizer file path")]
    tokenizer: PathBuf,

    #[arg(short = 'l', long = "label_maker", help = "Label maker object file path")]
    label_maker: PathBuf,

    #[arg(
        short = 'f',
        long = "file_type",
        help = "FASTA or FASTQ input file format",
        value_name = "fasta/fastq",
        default_value_t = FileFormat::Fasta
    )]
    file_type: FileFormat,

    #[arg(
        short = 'o',
        long = "outputdir",
        help = "Path to output directory",
        value_name = "DIR",
        default_value = "."
    )]
    outputdir: PathBuf,

    #[arg(
        short = 'k',
        long = "k_mers",
        help = "K-mer size used to train the model",
        default_value_t = DEFAULT_KMER_SIZE
    )]
    k_mers: usize,

    #[arg(
        short = 'T',
        long = "prediction_threshold",
        help = "Threshold/cutoff for predictions",
        value_name = "FLOAT",
        default_value_t = DEFAULT_THRESHOLD
    )]
    prediction_threshold: f32,

    #[arg(
        short = 'c',
        long = "chunk_size",
        help = "Number of reads per chunk",
        value_name = "INT",
        default_value_t = DEFAULT_CHUNK_SIZE
    )]
    chunk_size: usize,

    #[arg(
        short = 'O',
        long = "output_fasta",
        help = "Write a FASTA file with the prediction for each read"
    )]
    output_fasta: bool,

    #[arg(
        long = "truth",
        help = "Tab-separated read_id/class file to score the predictions against",
        value_name = "TSV"
    )]
    truth: Option<PathBuf>,

    #[arg(
        long = "threads",
        help = "Number of threads for the model (default: all cores)",
        value_name = "THREADS"
    )]
    threads: Option<usize>,

    #[arg(
        short = 'L',
        long = "level",
        help = "Logging level",
        value_name = "LEVEL",
        default_value_t = log::Level::Info
    )]
    level: log::Level,
}

fn spinner(color: &str, msg: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let template = format!("{{spinner:.{color}}} {{msg}}");
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template(&template)
    {
        spinner.set_style(style);
    }
    spinner.set_message(msg);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn run(args: Args) -> Result<ExitCode> {
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("could not configure the thread pool")?;
    }

    let config = PacificConfig {
        input: args.input_file,
        file_format: args.file_type,
        outdir: args.outputdir,
        kmer_size: args.k_mers,
        threshold: args.prediction_threshold,
        chunk_size: args.chunk_size,
        output_fasta: args.output_fasta,
    };
    config.validate()?;

    // 1. Load the pretrained artifacts
    let loading = spinner("blue", "Loading model, tokenizer and label maker...");
    let classifier = SequenceClassifier::from_json_file(&args.model)
        .with_context(|| format!("could not load model {}", args.model.display()))?;
    let tokenizer = KmerTokenizer::from_json_file(&args.tokenizer)
        .with_context(|| format!("could not load tokenizer {}", args.tokenizer.display()))?;
    let labels = LabelEncoder::from_json_file(&args.label_maker)
        .with_context(|| format!("could not load label maker {}", args.label_maker.display()))?;
    let truth = args
        .truth
        .as_ref()
        .map(|path| {
            read_truth_table(path)
                .with_context(|| format!("could not read truth table {}", path.display()))
        })
        .transpose()?;
    loading.finish_with_message("Artifacts loaded.");

    // 2. Classify reads
    let classifying = spinner("green", "Classifying reads...");
    let results = classify_reads(&config, &tokenizer, &classifier, &labels, truth.is_some())
        .context("classification failed")?;
    classifying.finish_with_message("Classification finished.");

    if let Some(path) = &results.annotated_fasta {
        println!("Per-read predictions written to {}", path.display());
    }

    // 3. Summarize
    let summary = match results.summary(config.threshold) {
        Ok(summary) => summary,
        Err(PacificError::NoProcessedReads) => {
            println!("None processed reads");
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => return Err(e.into()),
    };

    println!();
    println!("{}", results.get_discarded_message());
    println!();
    let table = summary.to_table();
    print!("{}", table);
    let table_path = write_summary(&summary, &config.outdir)?;
    log::info!("Summary written to {}", table_path.display());

    if let Some(truth) = &truth {
        match evaluate_predictions(truth, &results.predictions) {
            AccuracyOutcome::Accuracy(acc) => println!("Accuracy against truth table: {:.4}", acc),
            AccuracyOutcome::Empty => println!("No classified read is present in the truth table"),
            AccuracyOutcome::ShapeMismatch { labels, predictions } => log::warn!(
                "labels and predictions do not have the same length ({} vs {})",
                labels,
                predictions
            ),
        }
    }

    println!();
    println!("Thank you for using PACIFIC =^)");
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(args.level);

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
