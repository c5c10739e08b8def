mod analysis;
mod config;

use analysis::Analysis;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use config::Config;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "repolens",
    version,
    about = "Rank the files that explain a repository",
    long_about = "Scans a repository, derives language and entrypoint signals, builds a lexical import graph, and assembles a budgeted evidence bundle of the most informative files."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file to use instead of the user config
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show language, entrypoint, manifest and route signals
    Signals {
        /// Repository root (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the sorted file tree
    Tree {
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Maximum entries before truncation
        #[arg(long)]
        max_entries: Option<usize>,
    },

    /// List the selected files with tier and score
    Select {
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Maximum files to select
        #[arg(long)]
        max_files: Option<usize>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the most referenced files in the import graph
    Graph {
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Number of files to show
        #[arg(long, default_value = "20")]
        top: usize,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the evidence bundle of selected files
    Evidence {
        #[arg(default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        budget: BudgetArgs,
    },

    /// Print the full grounding document (signals, tree, evidence)
    Context {
        #[arg(default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        budget: BudgetArgs,
    },

    /// Show the effective configuration
    Config {
        /// Write the default config file
        #[arg(long)]
        init: bool,
    },
}

#[derive(clap::Args)]
struct BudgetArgs {
    /// Maximum files to select
    #[arg(long)]
    max_files: Option<usize>,

    /// Total character budget for the evidence bundle
    #[arg(long)]
    total_chars: Option<usize>,

    /// Per-file character budget
    #[arg(long)]
    per_file_chars: Option<usize>,
}

impl BudgetArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(n) = self.max_files {
            config.select.max_files = n;
        }
        if let Some(n) = self.total_chars {
            config.evidence.total_char_cap = n;
        }
        if let Some(n) = self.per_file_chars {
            config.evidence.per_file_char_cap = n;
        }
    }
}

fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Info);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Debug);
        }
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn analyze(path: &Path, config: &Config) -> Result<Analysis> {
    Analysis::run(path, config).with_context(|| format!("Failed to analyze {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Commands::Config { init } = cli.command {
        if init {
            let path = Config::create_default(cli.config.as_deref())?;
            println!("Created config: {}", path.display());
        } else {
            config::show_config(cli.config.as_deref())?;
        }
        return Ok(());
    }

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Signals { path, format } => {
            let analysis = analyze(&path, &config)?;
            match format {
                OutputFormat::Json => println!("{}", analysis.signals.to_json_pretty()),
                OutputFormat::Text => print!("{}", analysis.signals.render_text()),
            }
        }

        Commands::Tree { path, max_entries } => {
            if let Some(n) = max_entries {
                config.scan.tree_max_entries = n;
            }
            let analysis = analyze(&path, &config)?;
            println!("{}", analysis.tree(&config));
        }

        Commands::Select {
            path,
            max_files,
            format,
        } => {
            if let Some(n) = max_files {
                config.select.max_files = n;
            }
            let analysis = analyze(&path, &config)?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&analysis.selection)?)
                }
                OutputFormat::Text if analysis.selection.is_empty() => {
                    println!("(no files selected)")
                }
                OutputFormat::Text => print!("{}", analysis.selection.render_text()),
            }
        }

        Commands::Graph { path, top, format } => {
            let analysis = analyze(&path, &config)?;
            let ranked = analysis.graph.most_referenced(top);
            match format {
                OutputFormat::Json => {
                    let rows: Vec<serde_json::Value> = ranked
                        .iter()
                        .map(|(rel, inbound)| {
                            serde_json::json!({
                                "path": rel,
                                "inbound": inbound,
                                "outbound": analysis.graph.outbound_of(rel),
                            })
                        })
                        .collect();
                    let doc = serde_json::json!({
                        "scanned_files": analysis.graph.scanned_files,
                        "most_referenced": rows,
                    });
                    println!("{}", serde_json::to_string_pretty(&doc)?);
                }
                OutputFormat::Text => {
                    println!("scanned {} source files", analysis.graph.scanned_files);
                    for (rel, inbound) in ranked {
                        println!(
                            "{:>4} in {:>4} out  {}",
                            inbound,
                            analysis.graph.outbound_of(rel),
                            rel
                        );
                    }
                }
            }
        }

        Commands::Evidence { path, budget } => {
            budget.apply(&mut config);
            let analysis = analyze(&path, &config)?;
            let bundle = analysis.evidence(&config);
            log::info!(
                "evidence root={} files={} chars={} truncated={}",
                analysis.root.display(),
                bundle.included.len(),
                bundle.char_len(),
                bundle.truncated
            );
            println!("{}", bundle.text);
        }

        Commands::Context { path, budget } => {
            budget.apply(&mut config);
            let analysis = analyze(&path, &config)?;
            print!("{}", analysis.grounding(&config));
        }

        Commands::Config { .. } => unreachable!("handled above"),
    }

    Ok(())
}
