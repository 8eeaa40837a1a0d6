//! # CLI Module
//!
//! Command-line tooling over [route manifests](crate::manifest).
//!
//! ## Commands
//!
//! ### `routes`
//!
//! Print the resolved routing table (group prefixes applied):
//!
//! ```bash
//! switchyard --manifest routes.yaml routes
//! switchyard --manifest routes.yaml routes --json
//! ```
//!
//! ### `match`
//!
//! Resolve a request and print what the echo handler saw, including bound
//! parameters. Exits with status 1 when nothing matches:
//!
//! ```bash
//! switchyard --manifest routes.yaml match GET /api/pets/42?verbose=1
//! ```
//!
//! ### `check`
//!
//! Compile every pattern and report all problems at once. Exits with status 1
//! on any error, which makes it usable in CI:
//!
//! ```bash
//! switchyard --manifest routes.yaml check
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use switchyard::cli::{run_cli, Cli};
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! let status = run_cli(&cli)?;
//! ```

mod commands;


pub use commands::{run_cli, run_cli_with_writer, Cli, Commands};
