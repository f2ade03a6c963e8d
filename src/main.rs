//! langprobe CLI: statistical language identification.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use langprobe::config::EngineConfig;
use langprobe::identify::{IdentifyOptions, Identifier};
use langprobe::profile::{NgramLookup, ProfileSource, ProfileStore, TableBackend};

#[derive(Parser)]
#[command(name = "langprobe", version, about = "Statistical language identification")]
struct Cli {
    /// Profile artifact: a JSON bundle, a directory of per-language JSON files,
    /// or a compiled binary bundle.
    #[arg(long, global = true, default_value = "profiles")]
    profiles: PathBuf,

    /// How to read `--profiles`.
    #[arg(long, global = true, value_enum, default_value_t = ArtifactFormat::Auto)]
    format: ArtifactFormat,

    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the n-gram table backend.
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ArtifactFormat {
    /// Directory → per-language files, `.bin` → binary, otherwise JSON bundle.
    Auto,
    Bundle,
    Dir,
    Binary,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Hash,
    Sorted,
}

#[derive(Subcommand)]
enum Commands {
    /// Identify the language of a text (from --text, --file, or stdin).
    Identify {
        /// Text to classify.
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,

        /// Read the text from a file.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Number of randomized trials.
        #[arg(long)]
        trials: Option<usize>,

        /// RNG seed for reproducible output.
        #[arg(long)]
        seed: Option<u64>,

        /// Show at most this many languages.
        #[arg(long)]
        top_n: Option<usize>,

        /// Hide languages below this probability.
        #[arg(long)]
        min_probability: Option<f64>,

        /// Print the estimate as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Inspect loaded profiles.
    Profiles {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Compile the profile artifact into a binary bundle for faster startup.
    Compile {
        /// Output file.
        #[arg(long)]
        out: PathBuf,
    },

    /// Print the effective configuration as TOML.
    Config,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// List supported languages.
    List,
    /// Show details of one language profile.
    Show {
        /// Language code.
        code: String,

        /// Number of most probable n-grams to print.
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(backend) = cli.backend {
        config.profiles.backend = match backend {
            BackendArg::Hash => TableBackend::Hash,
            BackendArg::Sorted => TableBackend::Sorted,
        };
    }

    match cli.command {
        Commands::Identify {
            text,
            file,
            trials,
            seed,
            top_n,
            min_probability,
            json,
        } => {
            let input = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path).into_diagnostic()?,
                (None, None) => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf).into_diagnostic()?;
                    buf
                }
            };

            let store = load_store(&cli.profiles, cli.format, &config)?;
            let mut options = config.defaults.clone();
            apply_overrides(&mut options, trials, seed, top_n, min_probability);
            let identifier = Identifier::new(Arc::new(store), config)?;
            let estimate = identifier.identify(&input, &options)?;

            if json {
                let out = serde_json::to_string_pretty(&estimate).into_diagnostic()?;
                println!("{out}");
            } else {
                println!(
                    "Languages ({}, {} trials over {} n-grams):",
                    estimate.confidence, estimate.trials, estimate.sample_size
                );
                for (i, lang) in estimate.languages.iter().enumerate() {
                    println!(
                        "  {}. {} {:.2}%",
                        i + 1,
                        lang.language,
                        lang.probability * 100.0
                    );
                }
            }
        }

        Commands::Profiles { action } => {
            let store = load_store(&cli.profiles, cli.format, &config)?;

            match action {
                ProfileAction::List => {
                    println!("Languages ({}):", store.len());
                    for profile in store.profiles() {
                        println!(
                            "  {} [{} n-grams, prior {:.4}, unseen {:.4}]",
                            profile.language_code(),
                            profile.ngram_count(),
                            profile.prior_log(),
                            profile.unseen_log_prob()
                        );
                    }
                }
                ProfileAction::Show { code, limit } => {
                    let Some(profile) = store.try_get(&code) else {
                        miette::bail!("no profile for language \"{code}\"");
                    };
                    println!("Profile: {}", profile.language_code());
                    println!("  n-grams: {}", profile.ngram_count());
                    println!("  prior:   {:.6}", profile.prior_log());
                    println!("  unseen:  {:.6}", profile.unseen_log_prob());

                    for order in 1..=3u8 {
                        let top = top_ngrams(profile.table(), order, limit);
                        if top.is_empty() {
                            continue;
                        }
                        println!("  top order-{order} n-grams:");
                        for (ngram, log_prob) in top {
                            println!("    {ngram:?} {log_prob:.4}");
                        }
                    }
                }
            }
        }

        Commands::Compile { out } => {
            let store = load_store(&cli.profiles, cli.format, &config)?;
            store.save_binary(&out)?;
            println!(
                "Compiled {} language profile(s) to {}",
                store.len(),
                out.display()
            );
        }

        Commands::Config => {
            println!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}

fn load_store(path: &Path, format: ArtifactFormat, config: &EngineConfig) -> Result<ProfileStore> {
    let source = match format {
        ArtifactFormat::Bundle => ProfileSource::Bundle(path.to_path_buf()),
        ArtifactFormat::Dir => ProfileSource::Directory(path.to_path_buf()),
        ArtifactFormat::Binary => ProfileSource::Binary(path.to_path_buf()),
        ArtifactFormat::Auto if path.is_dir() => ProfileSource::Directory(path.to_path_buf()),
        ArtifactFormat::Auto if path.extension().is_some_and(|ext| ext == "bin") => {
            ProfileSource::Binary(path.to_path_buf())
        }
        ArtifactFormat::Auto => ProfileSource::Bundle(path.to_path_buf()),
    };
    Ok(ProfileStore::load(&source, &config.profiles)?)
}

fn apply_overrides(
    options: &mut IdentifyOptions,
    trials: Option<usize>,
    seed: Option<u64>,
    top_n: Option<usize>,
    min_probability: Option<f64>,
) {
    if let Some(trials) = trials {
        options.trial_count = trials;
    }
    if seed.is_some() {
        options.seed = seed;
    }
    if top_n.is_some() {
        options.top_n = top_n;
    }
    if let Some(min) = min_probability {
        options.min_probability = min;
    }
}

/// The `limit` most probable n-grams of one order.
fn top_ngrams(table: &dyn NgramLookup, order: u8, limit: usize) -> Vec<(String, f64)> {
    let mut entries: Vec<(String, f64)> = table
        .entries()
        .filter(|(k, _)| k.chars().count() == order as usize)
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(limit);
    entries
}
