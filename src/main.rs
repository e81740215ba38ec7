use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pubfetch::config::{find_config_file, get_config, load_config, Config, CONFIG_FILE_NAME};
use pubfetch::sources::DoiOrgSource;
use pubfetch::utils::validate_doi;
use pubfetch::{BibliographyFetcher, CitationRecord, DoiList};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// pubfetch - Fetch citation records for a list of DOIs
#[derive(Parser, Debug)]
#[command(name = "pubfetch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch CSL-JSON citation records for a publication list", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show all environment variables
    #[arg(long)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch a citation record for every DOI in the list
    #[command(alias = "f")]
    Fetch {
        /// DOI list (JSON array of strings)
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Write the records here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// DOIs per batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Retries for a rate-limited DOI
        #[arg(long)]
        max_retries: Option<u32>,

        /// Resolver base URL
        #[arg(long)]
        resolver: Option<String>,
    },

    /// Validate the DOI list without fetching anything
    #[command(alias = "c")]
    Check {
        /// DOI list (JSON array of strings)
        #[arg(long, short)]
        input: Option<PathBuf>,
    },

    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Write a default configuration file
    Init {
        /// Destination path
        #[arg(long, default_value = CONFIG_FILE_NAME)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Print all available environment variables
fn print_env_vars() {
    println!("pubfetch - Environment Variables");
    println!();
    println!("Fetcher:");
    println!("  PUBFETCH_FETCHER__BATCH_SIZE        DOIs per batch (default: 3)");
    println!("  PUBFETCH_FETCHER__REQUEST_DELAY_MS  Pause after each fetch (default: 1000)");
    println!("  PUBFETCH_FETCHER__BATCH_DELAY_MS    Pause between batches (default: 2000)");
    println!("  PUBFETCH_FETCHER__MAX_RETRIES       Retries on HTTP 429 (default: 5)");
    println!("  PUBFETCH_FETCHER__BACKOFF_STEP_MS   Linear backoff unit (default: 5000)");
    println!();
    println!("HTTP:");
    println!("  PUBFETCH_HTTP__RESOLVER_BASE        Resolver base URL (default: https://doi.org)");
    println!("  PUBFETCH_HTTP__USER_AGENT           User-Agent sent to the resolver");
    println!("  PUBFETCH_HTTP__ACCEPT               Accept header (default: CSL-JSON)");
    println!();
    println!("Input:");
    println!("  PUBFETCH_INPUT__DOI_LIST            Path to the DOI list");
    println!();
    println!("Other Settings:");
    println!("  PUBFETCH_LOGGING__FORMAT            'json' for structured logs");
    println!("  RUST_LOG                            Rust logging level (e.g., debug, info, warn, error)");
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("pubfetch={}", level)),
    );

    let json = config.json_logs();
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    if let Some(path) = &cli.config {
        return load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }
    match find_config_file() {
        Some(path) => load_config(&path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(get_config()?),
    }
}

fn write_records(records: &[CitationRecord], output: Option<&PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, json + "\n")
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}

fn check_dois(list: &DoiList, quiet: bool) -> Result<()> {
    use comfy_table::{Cell, Color, Table};

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["#", "DOI", "Status"]);

    let mut invalid = 0usize;
    for (i, doi) in list.iter().enumerate() {
        let status = match validate_doi(doi.as_str()) {
            Ok(_) => Cell::new("ok").fg(Color::Green),
            Err(e) => {
                invalid += 1;
                Cell::new(e.to_string()).fg(Color::Red)
            }
        };
        table.add_row(vec![Cell::new(i + 1), Cell::new(doi.as_str()), status]);
    }

    if !quiet {
        println!("{table}");
    }

    if invalid > 0 {
        anyhow::bail!("{} of {} DOIs are invalid", invalid, list.len());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.env {
        print_env_vars();
        return Ok(());
    }

    let mut config = resolve_config(&cli)?;
    init_tracing(&cli, &config);

    match cli.command {
        Some(Commands::Fetch {
            input,
            output,
            batch_size,
            max_retries,
            resolver,
        }) => {
            if let Some(size) = batch_size {
                config.fetcher.batch_size = size;
            }
            if let Some(retries) = max_retries {
                config.fetcher.max_retries = retries;
            }
            if let Some(base) = resolver {
                config.http.resolver_base = base;
            }
            config.validate()?;

            let path = input.unwrap_or_else(|| config.input.doi_list.clone());
            let list = DoiList::load(&path)?;

            let source = DoiOrgSource::with_options(
                &config.http.resolver_base,
                &config.http.user_agent,
                &config.http.accept,
            )?;
            let fetcher = BibliographyFetcher::new(Arc::new(source), config.fetch_options());

            let records = fetcher.fetch_list(&list).await?;
            write_records(&records, output.as_ref())?;

            if !cli.quiet {
                eprintln!("Fetched {} citation records", records.len());
            }
        }

        Some(Commands::Check { input }) => {
            let path = input.unwrap_or_else(|| config.input.doi_list.clone());
            let list = DoiList::load(&path)?;
            check_dois(&list, cli.quiet)?;
        }

        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => {
                print!("{}", config.to_toml()?);
            }
            ConfigAction::Init { path, force } => {
                if path.exists() && !force {
                    anyhow::bail!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    );
                }
                Config::default().save(&path)?;
                if !cli.quiet {
                    eprintln!("Wrote {}", path.display());
                }
            }
        },

        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["pubfetch"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert!(cli.config.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["pubfetch", "-v"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["pubfetch", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_fetch_command() {
        let cli = Cli::parse_from([
            "pubfetch",
            "fetch",
            "--input",
            "dois.json",
            "-o",
            "_data/publications.json",
            "--batch-size",
            "2",
            "--max-retries",
            "1",
        ]);

        match cli.command {
            Some(Commands::Fetch {
                input,
                output,
                batch_size,
                max_retries,
                resolver,
            }) => {
                assert_eq!(input, Some(PathBuf::from("dois.json")));
                assert_eq!(output, Some(PathBuf::from("_data/publications.json")));
                assert_eq!(batch_size, Some(2));
                assert_eq!(max_retries, Some(1));
                assert!(resolver.is_none());
            }
            _ => panic!("Expected Fetch command"),
        }
    }

    #[test]
    fn test_cli_check_command() {
        let cli = Cli::parse_from(["pubfetch", "-q", "check"]);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Some(Commands::Check { input: None })));
    }

    #[test]
    fn test_cli_config_init() {
        let cli = Cli::parse_from(["pubfetch", "config", "init", "--force"]);
        match cli.command {
            Some(Commands::Config {
                action: ConfigAction::Init { path, force },
            }) => {
                assert_eq!(path, PathBuf::from(CONFIG_FILE_NAME));
                assert!(force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }

    #[test]
    fn test_check_dois_reports_invalid() {
        let list = DoiList::from_strs(["10.1038/nature14539", "not-a-doi"]).unwrap();
        assert!(check_dois(&list, true).is_err());

        let list = DoiList::from_strs(["10.1038/nature14539"]).unwrap();
        assert!(check_dois(&list, true).is_ok());
    }
}
