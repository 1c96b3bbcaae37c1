mod catalog;
mod classify;
mod cli;
mod config;
mod fallback;
mod gemini;
mod llm;
mod pipeline;
mod query;
mod report;
mod search;

pub const USER_AGENT: &str = concat!("directory-scout/", env!("CARGO_PKG_VERSION"));
const MAX_REDIRECTS: usize = 5;

use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use catalog::Catalog;
use cli::{Cli, Command, RunArgs};
use config::{Config, ConfigError, EngineKind};
use gemini::GeminiClient;
use search::Engine;
use search::serpapi::SerpApiClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let dotenv = dotenvy::dotenv();
    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::new(log_directives(
            rust_log.as_deref(),
            cli.verbose,
        )))
        .init();

    if let Err(e) = dotenv
        && !e.not_found()
    {
        warn!(error = %e, "ignoring unreadable .env file");
    }

    let catalog = Catalog::builtin();
    match cli.command {
        Command::Domains => {
            for domain in catalog.all() {
                println!(
                    "{:<24} {:<14} {}",
                    domain.id,
                    domain.category,
                    domain.fragments.join(", ")
                );
            }
            Ok(())
        }
        Command::Estimate { domain, count } => {
            let config = Config::from_env()?;
            config.validate_ranges()?;
            let selected = match &domain {
                Some(key) => vec![
                    catalog
                        .get(key)
                        .ok_or_else(|| format!("unknown domain '{key}'"))?,
                ],
                None => catalog.all().iter().collect(),
            };
            for domain in selected {
                let space = query::combination_space(domain);
                let requested = config.clamp_query_count(count.unwrap_or(config.max_queries));
                println!(
                    "{:<24} {:>4} template combinations, {:>3} queries per run",
                    domain.id,
                    space,
                    requested.min(space)
                );
            }
            Ok(())
        }
        Command::Run(args) => run(&catalog, &args)
            .await
            .inspect_err(|e| tracing::error!("run failed: {e}")),
    }
}

async fn run(catalog: &Catalog, args: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::from_env()?;
    args.apply(&mut config);
    config.validate()?;
    config.prepare_output_dir()?;
    let domains = args.domains(catalog)?;

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(config.request_timeout)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()?;

    let engine = match config.engine {
        EngineKind::Serpapi => SerpApiClient::from_config(http.clone(), &config)
            .map(Engine::SerpApi)
            .ok_or(ConfigError::Missing("SERPAPI_KEY"))?,
        EngineKind::Gemini => GeminiClient::from_config(http.clone(), &config)
            .map(Engine::Grounded)
            .ok_or(ConfigError::Missing("GEMINI_API_KEY"))?,
    };
    let llm = if args.no_llm {
        None
    } else {
        GeminiClient::from_config(http, &config)
    };

    match &llm {
        Some(client) => info!(
            model = client.model(),
            engine = engine.name(),
            "language model enabled"
        ),
        None => info!(
            engine = engine.name(),
            "language model disabled, using templates and heuristics"
        ),
    }

    let mut reports = Vec::with_capacity(domains.len());
    let mut unwritten = 0;
    for domain in &domains {
        let report = pipeline::run_domain(&config, llm.as_ref(), &engine, domain, args.count).await;
        print!("{}", report::summary(&report));
        match report::publish(&config.output_dir, &report) {
            Some(path) => println!("report: {}\n", path.display()),
            None => {
                unwritten += 1;
                println!("report: not written (see log)\n");
            }
        }
        reports.push(report);
    }

    if reports.len() > 1 {
        match report::write_master(&config.output_dir, &reports) {
            Ok(path) => println!("master directory: {}", path.display()),
            Err(e) => {
                unwritten += 1;
                tracing::error!(error = %e, "master directory not written");
            }
        }
        print!("{}", report::totals(&reports));
    }

    if unwritten > 0 {
        return Err(format!("{unwritten} report file(s) could not be written").into());
    }
    Ok(())
}

/// `RUST_LOG` wins when set; otherwise this crate logs at info, or debug with `--verbose`.
fn log_directives(rust_log: Option<&str>, verbose: bool) -> String {
    match rust_log.map(str::trim).filter(|v| !v.is_empty()) {
        Some(directives) => directives.to_string(),
        None if verbose => "directory_scout=debug".to_string(),
        None => "directory_scout=info".to_string(),
    }
}
