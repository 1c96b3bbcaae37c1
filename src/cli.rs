use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::catalog::{Catalog, Category, Domain};
use crate::config::{Config, EngineKind};

#[derive(Parser, Debug)]
#[command(name = "directory-scout", version)]
#[command(about = "Discover and classify public company directories for an industry domain")]
pub struct Cli {
    /// Debug-level logging; ignored when RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the built-in domains
    Domains,

    /// Show how many template queries each domain can produce
    Estimate {
        /// Domain id or name; all domains when omitted
        #[arg(short, long)]
        domain: Option<String>,

        /// Requested query count, clamped to the configured range
        #[arg(short, long)]
        count: Option<usize>,
    },

    /// Search, classify and write a report per domain
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Domain id or name (repeatable)
    #[arg(short, long = "domain", conflicts_with = "all")]
    pub domains: Vec<String>,

    /// Run every built-in domain
    #[arg(long)]
    pub all: bool,

    /// Name for an ad-hoc domain not in the catalog
    #[arg(long, requires = "category")]
    pub custom_name: Option<String>,

    /// Category of the ad-hoc domain
    #[arg(long, requires = "custom_name")]
    pub category: Option<Category>,

    /// Topic keyword for the ad-hoc domain (repeatable)
    #[arg(long = "fragment", requires = "custom_name")]
    pub fragments: Vec<String>,

    /// Number of queries per domain
    #[arg(short = 'n', long, default_value_t = 10)]
    pub count: usize,

    /// Search backend, overrides SEARCH_ENGINE
    #[arg(long, value_enum)]
    pub engine: Option<EngineKind>,

    /// Skip the language model; templates and heuristics only
    #[arg(long)]
    pub no_llm: bool,

    /// Minimum relevance to keep a record, overrides RELEVANCE_THRESHOLD
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Output directory, overrides OUTPUT_DIR
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl RunArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(engine) = self.engine {
            config.engine = engine;
        }
        if let Some(threshold) = self.threshold {
            config.relevance_threshold = threshold;
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
    }

    /// Resolves the requested domains in command-line order, custom domain last.
    pub fn domains(&self, catalog: &Catalog) -> Result<Vec<Domain>, String> {
        let mut selected: Vec<Domain> = if self.all {
            catalog.all().to_vec()
        } else {
            self.domains
                .iter()
                .map(|key| {
                    catalog.get(key).cloned().ok_or_else(|| {
                        format!("unknown domain '{key}' (see `directory-scout domains`)")
                    })
                })
                .collect::<Result<_, _>>()?
        };

        if let (Some(name), Some(category)) = (&self.custom_name, self.category) {
            selected.push(Domain::custom(name, category, &self.fragments)?);
        }

        if selected.is_empty() {
            return Err("no domain selected: pass --domain, --all or --custom-name".into());
        }
        let mut seen = std::collections::HashSet::new();
        selected.retain(|d| seen.insert(d.id.clone()));
        Ok(selected)
    }
}
