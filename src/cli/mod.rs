//! CLI command definitions and handlers

mod init;
mod metrics;
mod modules;
mod network;
mod regulon;
mod sources;

use crate::config::Settings;
use crate::graph::fusion::{BuildRequest, DEFAULT_NODE_BUDGET};
use crate::scoring::CoverageMode;
use crate::sources::{parse_sources, PpiParams, RbpTargetParams, RnaRnaParams, SourceParams};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;

/// Parser for a count that must fall in `min..=max`
fn bounded(min: usize, max: usize) -> impl Fn(&str) -> Result<usize, String> + Clone + Send + Sync + 'static {
    move |s: &str| {
        let n: usize = s
            .parse()
            .map_err(|_| format!("'{}' is not a valid number", s))?;
        if n < min || n > max {
            Err(format!("must be between {} and {}", min, max))
        } else {
            Ok(n)
        }
    }
}

/// Interactome - fuse interaction evidence and rank regulon candidates
#[derive(Parser, Debug)]
#[command(name = "interactome")]
#[command(
    version,
    about = "Fuse STRING and ENCORI interaction evidence into one network and rank regulon candidates",
    after_help = "\
Examples:
  interactome network --seed TP53 --seed BRCA1              Fused PPI + RBP network
  interactome regulon --seed TP53,BRCA1,MDM2 --mode strict  Shared interactors of all seeds
  interactome communities --seed TP53 --min-size 5          Community partition
  interactome module --seed TP53 --cid 0 --label            Auto-label the largest module
  interactome sources                                       List evidence sources"
)]
pub struct Cli {
    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Config file (default: ~/.config/interactome/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format: text or json
    #[arg(long, short = 'f', global = true, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    fn json(&self) -> bool {
        self.format == "json"
    }
}

/// Seeds, sources and per-source parameters shared by every network command
#[derive(Args, Debug, Clone)]
pub struct NetworkArgs {
    /// Seed identifier (repeatable, or comma separated)
    #[arg(long = "seed", short = 's', required = true, value_delimiter = ',')]
    pub seeds: Vec<String>,

    /// Comma-separated evidence sources (see `interactome sources`)
    #[arg(long, default_value = "string_ppi,encori_rbp_by_target")]
    pub sources: String,

    /// NCBI taxonomy id (default: string.default_species from config)
    #[arg(long)]
    pub species_taxon: Option<u32>,

    /// STRING minimum combined score (0-1000)
    #[arg(long, default_value = "700")]
    pub string_required_score: u32,

    /// STRING partners per identifier (1-500)
    #[arg(long, default_value = "50")]
    pub string_limit: u32,

    /// STRING expansion depth (1 or 2)
    #[arg(long, default_value = "1")]
    pub string_depth: u8,

    /// STRING partners per identifier in the depth-2 pass (1-100)
    #[arg(long, default_value = "10")]
    pub string_depth2_limit: u32,

    /// ENCORI genome assembly
    #[arg(long, default_value = "hg38")]
    pub assembly: String,

    /// ENCORI gene type
    #[arg(long, default_value = "mRNA")]
    pub gene_type: String,

    /// ENCORI cell type filter
    #[arg(long, default_value = "all")]
    pub cell_type: String,

    /// ENCORI minimum CLIP experiments supporting an RBP site
    #[arg(long, default_value = "5")]
    pub clip_exp_num: u32,

    /// ENCORI minimum pan-cancer count (0-32)
    #[arg(long, default_value = "0")]
    pub pancancer_num: u32,

    /// ENCORI minimum RNA-RNA interaction count
    #[arg(long, default_value = "1")]
    pub inter_num: u32,

    /// ENCORI minimum RNA-RNA experiment count
    #[arg(long, default_value = "1")]
    pub exp_num: u32,

    /// Node budget before pruning (0 = never prune, max 20000)
    #[arg(long, default_value_t = DEFAULT_NODE_BUDGET)]
    pub max_nodes: usize,
}

impl NetworkArgs {
    pub fn params(&self, settings: &Settings) -> SourceParams {
        SourceParams {
            species_taxon: self.species_taxon.unwrap_or(settings.string_default_species),
            ppi: PpiParams {
                required_score: self.string_required_score,
                limit: self.string_limit,
                depth: self.string_depth,
                depth2_limit: self.string_depth2_limit,
            },
            rbp_target: RbpTargetParams {
                assembly: self.assembly.clone(),
                gene_type: self.gene_type.clone(),
                cell_type: self.cell_type.clone(),
                clip_exp_num: self.clip_exp_num,
                pancancer_num: self.pancancer_num,
            },
            rna_rna: RnaRnaParams {
                assembly: self.assembly.clone(),
                gene_type: self.gene_type.clone(),
                cell_type: self.cell_type.clone(),
                inter_num: self.inter_num,
                exp_num: self.exp_num,
            },
        }
    }

    pub fn request(&self, settings: &Settings) -> Result<BuildRequest> {
        let sources = parse_sources(&self.sources).context("Invalid --sources")?;
        let request = BuildRequest::new(self.seeds.iter().cloned(), sources)
            .with_params(self.params(settings))
            .with_node_budget(self.max_nodes);
        request.validate().context("Invalid network request")?;
        Ok(request)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the evidence sources and their accepted aliases
    Sources,

    /// Write an example config file
    Init {
        /// Where to write it (default: ~/.config/interactome/config.toml)
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Build the fused network
    Network {
        #[command(flatten)]
        net: NetworkArgs,

        /// Also write the network JSON to this file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Partition the network into communities
    Communities {
        #[command(flatten)]
        net: NetworkArgs,

        /// Smallest community to keep (1-50)
        #[arg(long, default_value = "3", value_parser = bounded(1, 50))]
        min_size: usize,
    },

    /// Extract one community as its own network
    Module {
        #[command(flatten)]
        net: NetworkArgs,

        /// Community index (C0 -> 0)
        #[arg(long, default_value = "0")]
        cid: usize,

        /// Smallest community to keep (1-50)
        #[arg(long, default_value = "3", value_parser = bounded(1, 50))]
        min_size: usize,

        /// Print the rule-based label instead of the sub-network
        #[arg(long)]
        label: bool,

        /// Hubs considered when labelling (5-100)
        #[arg(long, default_value = "20", value_parser = bounded(5, 100))]
        top_hubs: usize,
    },

    /// Label the largest communities
    ModulesLabels {
        #[command(flatten)]
        net: NetworkArgs,

        /// Number of communities to label (1-50)
        #[arg(long, default_value = "5", value_parser = bounded(1, 50))]
        top_k: usize,

        /// Smallest community to keep (1-50)
        #[arg(long, default_value = "3", value_parser = bounded(1, 50))]
        min_size: usize,

        /// Hubs considered per community (5-100)
        #[arg(long, default_value = "20", value_parser = bounded(5, 100))]
        top_hubs: usize,
    },

    /// Rank interactors shared by the seeds
    #[command(after_help = "\
Coverage modes (used when --min-coverage is not given):
  strict     every seed
  majority   at least half the seeds, rounded up (default)
  any        a single seed")]
    Regulon {
        #[command(flatten)]
        net: NetworkArgs,

        /// How min coverage is derived: strict, majority or any
        #[arg(long, default_value_t = CoverageMode::Majority)]
        mode: CoverageMode,

        /// Explicit minimum number of seeds a candidate must touch
        #[arg(long, value_parser = bounded(1, usize::MAX))]
        min_coverage: Option<usize>,

        /// Candidates to report (5-500)
        #[arg(long, default_value = "50", value_parser = bounded(5, 500))]
        top: usize,

        /// Let seeds appear as candidates of other seeds
        #[arg(long)]
        include_seed_nodes: bool,
    },

    /// Degree and betweenness hubs
    Metrics {
        #[command(flatten)]
        net: NetworkArgs,

        /// Leave seed nodes out of the hub lists
        #[arg(long)]
        ignore_seeds: bool,
    },
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    let json = cli.json();
    let settings = || Settings::load(cli.config.as_deref()).context("Failed to load configuration");

    match cli.command {
        Commands::Sources => sources::run(json),
        Commands::Init { path } => init::run(path.as_deref().or(cli.config.as_deref())),
        Commands::Network { net, output } => network::run(&settings()?, &net, output.as_deref(), json),
        Commands::Communities { net, min_size } => {
            modules::communities(&settings()?, &net, min_size, json)
        }
        Commands::Module {
            net,
            cid,
            min_size,
            label,
            top_hubs,
        } => {
            if label {
                modules::label(&settings()?, &net, cid, min_size, top_hubs, json)
            } else {
                modules::module(&settings()?, &net, cid, min_size, json)
            }
        }
        Commands::ModulesLabels {
            net,
            top_k,
            min_size,
            top_hubs,
        } => modules::labels(&settings()?, &net, top_k, min_size, top_hubs, json),
        Commands::Regulon {
            net,
            mode,
            min_coverage,
            top,
            include_seed_nodes,
        } => regulon::run(
            &settings()?,
            &net,
            regulon::Options {
                mode,
                min_coverage,
                top,
                exclude_seed_nodes: !include_seed_nodes,
            },
            json,
        ),
        Commands::Metrics { net, ignore_seeds } => {
            metrics::run(&settings()?, &net, ignore_seeds, json)
        }
    }
}

fn create_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .expect("valid template")
}

fn spinner(message: impl Into<String>) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(create_spinner_style());
    bar.set_message(message.into());
    bar.enable_steady_tick(std::time::Duration::from_millis(100));
    bar
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_args_parse() {
        let cli = Cli::try_parse_from([
            "interactome",
            "regulon",
            "--seed",
            "TP53,BRCA1",
            "--seed",
            "MDM2",
            "--sources",
            "string",
            "--mode",
            "strict",
            "--string-depth",
            "2",
        ])
        .unwrap();
        let Commands::Regulon { net, mode, top, .. } = cli.command else {
            panic!("expected regulon");
        };
        assert_eq!(net.seeds, vec!["TP53", "BRCA1", "MDM2"]);
        assert_eq!(mode, CoverageMode::Strict);
        assert_eq!(top, 50);

        let settings = Settings::default();
        let request = net.request(&settings).unwrap();
        assert_eq!(request.params.ppi.depth, 2);
        assert_eq!(request.params.species_taxon, 9606);
        assert_eq!(request.node_budget, DEFAULT_NODE_BUDGET);
    }

    #[test]
    fn test_seed_required() {
        assert!(Cli::try_parse_from(["interactome", "network"]).is_err());
    }

    #[test]
    fn test_bounded_values() {
        assert!(Cli::try_parse_from([
            "interactome", "communities", "--seed", "A", "--min-size", "0"
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "interactome", "regulon", "--seed", "A", "--top", "1000"
        ])
        .is_err());
    }

    #[test]
    fn test_out_of_range_params_rejected() {
        let cli = Cli::try_parse_from([
            "interactome",
            "network",
            "--seed",
            "TP53",
            "--string-required-score",
            "5000",
        ])
        .unwrap();
        let Commands::Network { net, .. } = cli.command else {
            panic!("expected network");
        };
        assert!(net.request(&Settings::default()).is_err());
    }

    #[test]
    fn test_unknown_sources_rejected() {
        let cli = Cli::try_parse_from([
            "interactome", "network", "--seed", "TP53", "--sources", "biogrid",
        ])
        .unwrap();
        let Commands::Network { net, .. } = cli.command else {
            panic!("expected network");
        };
        assert!(net.request(&Settings::default()).is_err());
    }
}
