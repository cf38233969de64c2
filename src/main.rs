use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing::info;

use claimscape::cluster::params::{HdbscanParams, SelectionMethod};
use claimscape::config::Config;
use claimscape::pipeline::analyze::{AnalyzeOptions, ClusterSource};
use claimscape::table::TextKind;
use claimscape::topics::KeywordStrategy;

/// Claimscape: map the claims people make in interviews.
///
/// Clusters claim or predicate embeddings, describes each cluster with
/// keywords and samples, and writes browsable reports.
#[derive(Parser)]
#[command(name = "claimscape", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every command that reads an embedding table.
#[derive(Args, Clone)]
struct TableArgs {
    /// Embedding table (.jsonl or JSON array); overrides CLAIMSCAPE_INPUT
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Which text the embeddings were computed from (claim or predicate)
    #[arg(long)]
    text_kind: Option<TextKind>,

    /// Output directory; overrides CLAIMSCAPE_OUTPUT_DIR
    #[arg(long, short)]
    output_dir: Option<PathBuf>,

    /// Dimensions of the projection the clusterer sees (default: 2)
    #[arg(long, default_value = "2")]
    components: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum KeywordMode {
    /// Most frequent words
    Frequency,
    /// Repeated multi-word phrases
    Phrases,
    /// TF-IDF over the cluster's rows
    Tfidf,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster the embeddings and write every report
    Analyze {
        #[command(flatten)]
        table: TableArgs,

        /// Smallest group that counts as a cluster (default: 10)
        #[arg(long, default_value = "10")]
        min_cluster_size: usize,

        /// Neighbourhood size for core distances (default: 5)
        #[arg(long, default_value = "5")]
        min_samples: usize,

        /// Cluster selection method: eom or leaf
        #[arg(long, default_value = "eom")]
        selection: SelectionMethod,

        /// Allow a single all-encompassing cluster
        #[arg(long)]
        allow_single_cluster: bool,

        /// Use a clustering computed elsewhere (JSON) instead of running HDBSCAN
        #[arg(long)]
        import: Option<PathBuf>,

        /// Keyword strategy for cluster descriptions
        #[arg(long, value_enum, default_value = "frequency")]
        keywords: KeywordMode,

        /// Number of keywords per cluster (default: 5; 9 for phrases)
        #[arg(long)]
        n_terms: Option<usize>,

        /// Representative samples per cluster (default: 5)
        #[arg(long, default_value = "5")]
        samples: usize,

        /// Deduplicate samples by (subject, predicate, object)
        #[arg(long)]
        unique_triples: bool,

        /// Verb hypernym lexicon (TSV); overrides CLAIMSCAPE_LEXICON
        #[arg(long)]
        lexicon: Option<PathBuf>,
    },

    /// Find a min_cluster_size whose cluster count lands in a target range
    Optimize {
        #[command(flatten)]
        table: TableArgs,

        /// Lowest acceptable cluster count (default: 50)
        #[arg(long, default_value = "50")]
        min_clusters: usize,

        /// Highest acceptable cluster count (default: 100)
        #[arg(long, default_value = "100")]
        max_clusters: usize,

        /// min_cluster_size values to try, in order
        #[arg(long, value_delimiter = ',')]
        candidates: Option<Vec<usize>>,
    },

    /// Sweep a grid of HDBSCAN parameters and chart the results
    Assess {
        #[command(flatten)]
        table: TableArgs,

        /// min_cluster_size values (comma separated)
        #[arg(long, value_delimiter = ',', default_value = "10,20,30,50,75,100")]
        mcs: Vec<usize>,

        /// min_samples values (comma separated)
        #[arg(long, value_delimiter = ',', default_value = "1,5,10,20")]
        ms: Vec<usize>,

        /// Number of clusterings to run in parallel (default: 4)
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },

    /// Compute the Pareto front of saved assessment results
    Pareto {
        /// Assessment results JSON written by `assess`
        results: PathBuf,

        /// Output directory; overrides CLAIMSCAPE_OUTPUT_DIR
        #[arg(long, short)]
        output_dir: Option<PathBuf>,
    },

    /// Split interview utterances into numbered sentences
    SplitSentences {
        /// Transcript JSON (array of utterances)
        input: PathBuf,

        /// Output file (default: <input>_sentences.json)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Write interviewer/interviewee pairs, one file per pair
    Pairs {
        /// Transcript JSON (array of utterances)
        input: PathBuf,

        /// Output directory (default: next to the input)
        #[arg(long, short)]
        output_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("claimscape=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            table,
            min_cluster_size,
            min_samples,
            selection,
            allow_single_cluster,
            import,
            keywords,
            n_terms,
            samples,
            unique_triples,
            lexicon,
        } => {
            let mut config = load_config(&table)?;
            if lexicon.is_some() {
                config.lexicon = lexicon;
            }

            let source = match import {
                Some(path) => ClusterSource::Import(path),
                None => {
                    let params = HdbscanParams::new(min_cluster_size, min_samples)
                        .with_selection(selection)
                        .with_single_cluster(allow_single_cluster);
                    params.validate()?;
                    ClusterSource::Hdbscan(params)
                }
            };
            let options = AnalyzeOptions {
                source,
                keywords: keyword_strategy(keywords, n_terms),
                n_components: table.components,
                sample_count: samples,
                unique_triples,
            };

            println!("Analyzing {}...", config.require_input()?.display());
            let outcome = claimscape::pipeline::analyze::run(&config, &options).await?;

            claimscape::output::terminal::display_cluster_summary(
                &outcome.clustering,
                &outcome.descriptors,
            );
            if let Some(dbcv) = outcome.summary.dbcv {
                println!("  Relative validity (DBCV): {dbcv:.4}");
            }
            println!("\n{}", "Reports written:".bold());
            for path in &outcome.files {
                println!("  {}", path.display());
            }
        }

        Commands::Optimize {
            table,
            min_clusters,
            max_clusters,
            candidates,
        } => {
            let config = load_config(&table)?;
            let candidates =
                candidates.unwrap_or_else(|| claimscape::assess::DEFAULT_CANDIDATES.to_vec());
            let target = (min_clusters, max_clusters);

            println!(
                "Searching {} candidates for {}..={} clusters...",
                candidates.len(),
                min_clusters,
                max_clusters
            );
            let outcome = claimscape::pipeline::sweep::run_optimize(
                &config,
                &candidates,
                target,
                table.components,
            )
            .await?;
            claimscape::output::terminal::display_optimize(&outcome, target);
        }

        Commands::Assess {
            table,
            mcs,
            ms,
            concurrency,
        } => {
            let config = load_config(&table)?;
            println!("Assessing HDBSCAN parameters...");
            let outcome = claimscape::pipeline::sweep::run_assessment(
                &config,
                &mcs,
                &ms,
                concurrency,
                table.components,
            )
            .await?;

            claimscape::output::terminal::display_assessment(&outcome.results);
            let best = claimscape::assess::best_by_dbcv(&outcome.results, 5);
            if !best.is_empty() {
                println!("{}", "Top parameter pairs by DBCV:".bold());
                for r in &best {
                    println!(
                        "  min_cluster_size={}, min_samples={} -> {:.4} ({} clusters)",
                        r.min_cluster_size,
                        r.min_samples,
                        r.dbcv.unwrap_or_default(),
                        r.n_clusters
                    );
                }
            }
            print_files(&outcome.files);
        }

        Commands::Pareto {
            results,
            output_dir,
        } => {
            let mut config = Config::load()?;
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            let outcome = claimscape::pipeline::sweep::run_pareto(&results, &config.output_dir)?;
            println!(
                "\n{}",
                format!("=== Pareto Front ({} solutions) ===", outcome.results.len()).bold()
            );
            claimscape::output::terminal::display_assessment(&outcome.results);
            print_files(&outcome.files);
        }

        Commands::SplitSentences { input, output } => {
            let path = claimscape::preprocess::transform_file(&input, output.as_deref())?;
            info!(path = %path.display(), "Sentence split complete");
            println!("Sentences written to {}", path.display());
        }

        Commands::Pairs { input, output_dir } => {
            let (count, dir) = claimscape::preprocess::pairs_file(&input, output_dir.as_deref())?;
            println!("Wrote {count} pair files to {}", dir.display());
        }
    }

    Ok(())
}

/// Environment config with the table flags applied on top.
fn load_config(table: &TableArgs) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(input) = &table.input {
        config.input = Some(input.clone());
    }
    if let Some(kind) = table.text_kind {
        config.text_kind = kind;
    }
    if let Some(dir) = &table.output_dir {
        config.output_dir = dir.clone();
    }
    config.require_input()?;
    Ok(config)
}

fn keyword_strategy(mode: KeywordMode, n_terms: Option<usize>) -> KeywordStrategy {
    match mode {
        KeywordMode::Frequency => KeywordStrategy::Frequency {
            n_terms: n_terms.unwrap_or(5),
            min_word_length: 2,
        },
        KeywordMode::Phrases => match (KeywordStrategy::phrases(), n_terms) {
            (KeywordStrategy::Phrases { min_n, max_n, .. }, Some(n)) => {
                KeywordStrategy::Phrases {
                    n_keywords: n,
                    min_n,
                    max_n,
                }
            }
            (default, _) => default,
        },
        KeywordMode::Tfidf => KeywordStrategy::TfIdf {
            n_terms: n_terms.unwrap_or(5),
        },
    }
}

fn print_files(files: &[PathBuf]) {
    println!("\n{}", "Files written:".bold());
    for path in files {
        println!("  {}", path.display());
    }
}
