use clap::Parser;
use switchyard::cli::{run_cli, Cli};
use switchyard::logging::{init_logging, LogConfig, LogFormat};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Human-facing tool: default to pretty output unless the env says otherwise.
    let mut log = LogConfig {
        format: LogFormat::Pretty,
        level: "warn".to_string(),
        ..LogConfig::default()
    };
    log.apply_env();
    init_logging(&log)?;

    let code = run_cli(&cli)?;
    std::process::exit(code);
}
