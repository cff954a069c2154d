use anyhow::{Context, Result};
use clap::Parser;
use class_catalog::cli::{Cli, Commands};
use class_catalog::config::{ScanConfig, resolve_keyword_table};
use class_catalog::engine::Extraction;
use class_catalog::category::Category;
use class_catalog::pipeline::{extract_single, run_scan};
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_LEVEL_ENV: &str = "CLASS_CATALOG_LOG_LEVEL";

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    match cli.command {
        Commands::Scan(args) => {
            let config = ScanConfig::from_args(&args)?;
            let report = run_scan(&config)
                .with_context(|| format!("Scan of {} failed", config.root.display()))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Extract {
            file,
            category,
            keywords,
        } => {
            let table = resolve_keyword_table(keywords.as_deref())?;
            let (routed, extraction) = extract_single(&file, category, &table)?;
            let output = ExtractOutput {
                file,
                category: routed,
                extraction,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct ExtractOutput {
    file: PathBuf,
    category: Category,
    #[serde(flatten)]
    extraction: Extraction,
}

fn init_logging(cli: &Cli) {
    let level = if let Some(level) = cli.log_level.as_deref() {
        parse_level(level)
    } else if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        parse_level(&env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_string()))
    };

    let filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(format!("class_catalog={level}"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!("[class-catalog] invalid log level '{level}', using info");
            Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use class_catalog::engine::CategoryHook;

    #[test]
    fn parse_level_falls_back_to_info() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("loud"), Level::INFO);
    }

    #[test]
    fn cli_parses_scan_defaults() {
        let cli = Cli::parse_from(["class-catalog", "scan", "src"]);
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.buffer_kb, 50);
        assert_eq!(args.file_mb, 5);
        assert_eq!(args.extension, "java");
        assert!(args.output.is_none());
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::parse_from(["class-catalog", "extract", "A.java", "-q", "-c", "service"]);
        assert!(cli.quiet);
        assert!(matches!(
            cli.command,
            Commands::Extract {
                category: Some(CategoryHook::Service),
                ..
            }
        ));
    }
}
