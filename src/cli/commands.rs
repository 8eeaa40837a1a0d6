use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use http::Method;
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::AppConfig;
use crate::dispatcher::HandlerRequest;
use crate::manifest::RouteManifest;

/// Command-line interface for switchyard
///
/// Loads a route manifest and lets you list, check and try out its routes.
#[derive(Parser, Debug)]
#[command(name = "switchyard")]
#[command(about = "Inspect and exercise switchyard route manifests", long_about = None)]
pub struct Cli {
    /// Route manifest (YAML or TOML)
    #[arg(short, long, env = "SWITCHYARD_MANIFEST", global = true, default_value = "routes.yaml")]
    pub manifest: PathBuf,

    /// Optional app config (YAML or TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Print the resolved routing table
    Routes {
        /// Emit JSON instead of aligned text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Resolve one request and print the handler and bound parameters
    ///
    /// Exits with status 1 when nothing matches.
    Match {
        /// HTTP method, e.g. GET
        method: String,
        /// Request path, optionally with a query string
        path: String,
    },
    /// Compile every pattern and report all problems
    ///
    /// Exits with status 1 when any route is invalid.
    Check,
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };
    config.apply_env()?;
    Ok(config)
}

/// Run a parsed command, writing human output to `out`.
///
/// Returns the process exit status.
pub fn run_cli_with_writer<W: Write>(cli: &Cli, out: &mut W) -> Result<i32> {
    let manifest = RouteManifest::load(&cli.manifest)
        .with_context(|| format!("loading manifest {}", cli.manifest.display()))?;

    match &cli.command {
        Commands::Routes { json } => {
            let routes = manifest.resolve();
            if *json {
                let rows: Vec<_> = routes
                    .iter()
                    .map(|r| {
                        json!({
                            "method": r.method.to_ascii_uppercase(),
                            "pattern": r.pattern,
                            "handler": r.handler,
                            "middleware": r.middleware,
                        })
                    })
                    .collect();
                writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?;
            } else {
                let width = routes.iter().map(|r| r.pattern.len()).max().unwrap_or(0);
                for r in &routes {
                    writeln!(
                        out,
                        "{:<7} {:<width$}  {}",
                        r.method.to_ascii_uppercase(),
                        r.pattern,
                        r.handler
                    )?;
                }
            }
            Ok(0)
        }
        Commands::Match { method, path } => {
            let method = Method::from_str(&method.to_ascii_uppercase())
                .with_context(|| format!("invalid method '{method}'"))?;
            let app = manifest.build_table()?.freeze(load_config(cli)?);

            if app.route(&method, path).is_none() {
                writeln!(out, "no route matches {method} {path}")?;
                return Ok(1);
            }
            let res = app.handle(HandlerRequest::new(method, path.as_str()));
            writeln!(out, "{}", serde_json::to_string_pretty(&res.body)?)?;
            Ok(0)
        }
        Commands::Check => {
            let issues = manifest.check();
            if issues.is_empty() {
                writeln!(out, "ok: {} routes", manifest.resolve().len())?;
                return Ok(0);
            }
            for issue in &issues {
                writeln!(
                    out,
                    "error: {} {} ({}): {}",
                    issue.route.method, issue.route.pattern, issue.route.handler, issue.error
                )?;
            }
            Ok(1)
        }
    }
}

/// Run a parsed command against stdout.
pub fn run_cli(cli: &Cli) -> Result<i32> {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    run_cli_with_writer(cli, &mut lock)
}
