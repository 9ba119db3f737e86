//! rusty-cucopy CLI - adjust values for inflation and exchange them
//!
//! ## Example Usage
//!
//! ```bash
//! # What were 1.75M EUR from December 2006 worth in November 2021?
//! rusty-cucopy inflate 2006-12-01 1.75 --notation M --target 2021-11-01
//!
//! # 10 USD from 1997, adjusted to one year ago and exchanged into CAD
//! rusty-cucopy adjust USA 1997-09-23 10 --equivalent --to-region CAN
//!
//! # Evaluate a JSON list of adjustment requests
//! rusty-cucopy batch requests.json -o results.csv
//!
//! # Fetch the Bundesbank CPI series
//! rusty-cucopy update --language de
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rusty_cucopy::adjust::{adjust_batch, adjust_currency, Adjustment, AdjustmentRequest};
use rusty_cucopy::config::{Classification, Language, ParserConfig, Settings};
use rusty_cucopy::currency::{CurrencyValue, NotationRegistry};
use rusty_cucopy::data::{IndexResolver, IndexTable};
use rusty_cucopy::exchange::ExchangeRates;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

/// rusty-cucopy: inflation adjustment and currency exchange from CPI tables
#[derive(Parser)]
#[command(name = "rusty-cucopy")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Adjust monetary values for inflation using published CPI tables", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Adjust a euro value with a Bundesbank CPI series
    Inflate {
        /// Recording date (YYYY-MM-DD)
        #[arg(value_name = "RECORDING_DATE")]
        recording_date: String,

        /// Value in the given notation
        #[arg(value_name = "VALUE", default_value = "1")]
        value: f64,

        /// Target date (YYYY-MM-DD)
        #[arg(short = 't', long)]
        target: String,

        /// Notation symbol (K, M, B, T or a custom one)
        #[arg(short = 'n', long, default_value = "")]
        notation: String,

        /// Register a custom notation as SYMBOL=POWER, e.g. L=5
        #[arg(long, value_name = "SYMBOL=POWER")]
        custom_notation: Option<String>,

        /// Table language (de, en)
        #[arg(short = 'l', long)]
        language: Option<String>,

        /// CPI series (all, food, energy, ... or a series id)
        #[arg(short = 'k', long)]
        classification: Option<String>,

        /// Read the series from this file instead of the data directory
        #[arg(short = 'p', long)]
        path: Option<PathBuf>,

        /// Field delimiter of the series file
        #[arg(short = 'd', long)]
        delimiter: Option<char>,

        /// Report remaining purchasing power instead of equivalent worth
        #[arg(long)]
        purchasing_power: bool,
    },

    /// Adjust a value with the World Bank tables, optionally exchanging it
    Adjust {
        /// Region (country code) the value was recorded in
        #[arg(value_name = "FROM_REGION")]
        from_region: String,

        /// Recording date (YYYY-MM-DD)
        #[arg(value_name = "FROM_DATE")]
        from_date: String,

        /// Value to adjust
        #[arg(value_name = "VALUE", default_value = "1")]
        value: f64,

        /// Target date (YYYY-MM-DD, default: one year ago)
        #[arg(long)]
        to_date: Option<String>,

        /// Region whose currency to exchange into
        #[arg(long)]
        to_region: Option<String>,

        /// Amount needed for the same purchasing power instead of the
        /// purchasing power remaining
        #[arg(short = 'e', long)]
        equivalent: bool,
    },

    /// Evaluate a JSON file of adjustment requests
    Batch {
        /// JSON array of requests
        #[arg(value_name = "REQUESTS")]
        requests: PathBuf,

        /// Output file for results (CSV/JSON)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Show configuration and table coverage
    Info,

    /// Download Bundesbank CPI series into the data directory
    #[cfg(feature = "async")]
    Update {
        /// Table language (de, en)
        #[arg(short = 'l', long, default_value = "de")]
        language: String,

        /// Series to fetch (default: all)
        #[arg(short = 'k', long)]
        classification: Option<String>,
    },
}

/// One row of batch output
#[derive(Debug, Serialize)]
struct BatchRow {
    from_region: String,
    from_date: String,
    to_date: Option<String>,
    value: f64,
    adjusted: Option<f64>,
    exchanged_region: Option<String>,
    exchanged: Option<f64>,
    error: Option<String>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };

    if cli.verbose {
        println!(
            "{} v{}",
            "rusty-cucopy".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        );
        println!(
            "Data dir: {}",
            settings.data_dir.display().to_string().dimmed()
        );
    }

    let result = match cli.command {
        Commands::Inflate {
            recording_date,
            value,
            target,
            notation,
            custom_notation,
            language,
            classification,
            path,
            delimiter,
            purchasing_power,
        } => inflate(InflateConfig {
            recording_date,
            value,
            target,
            notation,
            custom_notation,
            language,
            classification,
            path,
            delimiter,
            purchasing_power,
            json: cli.json,
            settings,
        }),

        Commands::Adjust {
            from_region,
            from_date,
            value,
            to_date,
            to_region,
            equivalent,
        } => {
            let mut request = AdjustmentRequest::new(from_region, from_date, value);
            request.adjust_for_inflation = equivalent;
            request.to_region = to_region;
            request.to_date = to_date;
            adjust(&request, cli.json, &settings)
        }

        Commands::Batch { requests, output } => batch(&requests, output.as_deref(), &settings),

        Commands::Info => show_info(cli.verbose, &settings),

        #[cfg(feature = "async")]
        Commands::Update {
            language,
            classification,
        } => update(&language, classification.as_deref(), &settings),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

struct InflateConfig {
    recording_date: String,
    value: f64,
    target: String,
    notation: String,
    custom_notation: Option<String>,
    language: Option<String>,
    classification: Option<String>,
    path: Option<PathBuf>,
    delimiter: Option<char>,
    purchasing_power: bool,
    json: bool,
    settings: Settings,
}

fn parser_config(
    settings: &Settings,
    language: Option<&str>,
    classification: Option<&str>,
    delimiter: Option<char>,
) -> anyhow::Result<ParserConfig> {
    let language = language.map(str::parse::<Language>).transpose()?;
    let classification = classification
        .map(str::parse::<Classification>)
        .transpose()?;
    Ok(ParserConfig::resolve(
        &settings.parser,
        language,
        delimiter,
        classification,
    )?)
}

fn inflate(cfg: InflateConfig) -> anyhow::Result<()> {
    let parser = parser_config(
        &cfg.settings,
        cfg.language.as_deref(),
        cfg.classification.as_deref(),
        cfg.delimiter,
    )?;

    let mut registry = NotationRegistry::new();
    if let Some(custom) = &cfg.custom_notation {
        let (symbol, power) = custom
            .split_once('=')
            .context("custom notation must look like SYMBOL=POWER")?;
        let power: u32 = power
            .trim()
            .parse()
            .with_context(|| format!("invalid notation power '{}'", power))?;
        registry.register(symbol.trim(), power)?;
    }

    let resolver = match &cfg.path {
        Some(path) => IndexResolver::bundesbank_from_path(path, &parser)?,
        None => IndexResolver::bundesbank(&cfg.settings, &parser)?,
    };

    let mut value = CurrencyValue::new(&cfg.recording_date, cfg.value)?
        .with_notation(&cfg.notation, &registry)?;
    value.set_target_date(&cfg.target)?;
    value.attach_resolver(Arc::new(resolver));

    let (recording_index, target_index) = value.index_values()?;
    let result = if cfg.purchasing_power {
        value.purchasing_power()?
    } else {
        value.equivalent_worth()?
    };

    if cfg.json {
        let json = serde_json::json!({
            "recording_date": value.recording_date(),
            "target_date": value.target_date(),
            "value": value.value(),
            "notation": value.notation().symbol(),
            "currency": value.currency(),
            "classification": parser.classification(),
            "recording_index": recording_index,
            "target_index": target_index,
            "result": result,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    let symbol = format!("{}{}", value.notation().symbol(), value.currency().symbol());
    println!(
        "  {} {} ({})",
        "CPI series:".bold(),
        parser.classification(),
        parser.classification().series_id()
    );
    println!(
        "  {} {} -> {}",
        "CPI:".bold(),
        recording_index,
        target_index
    );
    if cfg.purchasing_power {
        println!(
            "{}{} from {} retain the purchasing power of {} at {}.",
            value.value(),
            symbol,
            value.recording_date(),
            format!("{:.2}{}", result, symbol).bright_green().bold(),
            cfg.target
        );
    } else {
        println!(
            "Adjusted for inflation, {}{} from {} are worth {} at {}.",
            value.value(),
            symbol,
            value.recording_date(),
            format!("{:.2}{}", result, symbol).bright_green().bold(),
            cfg.target
        );
    }
    Ok(())
}

fn load_exchange(settings: &Settings, needed: bool) -> anyhow::Result<Option<ExchangeRates>> {
    if !needed {
        return Ok(None);
    }
    Ok(Some(ExchangeRates::world(settings)?))
}

fn adjust(request: &AdjustmentRequest, json: bool, settings: &Settings) -> anyhow::Result<()> {
    let cpi = IndexResolver::world_cpi(settings)?;
    let exchange = load_exchange(settings, request.to_region.is_some())?;
    let adjustment = adjust_currency(request, &cpi, exchange.as_ref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&adjustment)?);
    } else {
        print_adjustment(request, &adjustment);
    }
    Ok(())
}

fn print_adjustment(request: &AdjustmentRequest, adjustment: &Adjustment) {
    let verb = if request.adjust_for_inflation {
        "are worth"
    } else {
        "have the purchasing power of"
    };
    println!(
        "Adjusted for inflation, {} {} in {} {} {} {} in {}.",
        adjustment.value,
        adjustment.from_region,
        adjustment.from_date,
        verb,
        format!("{:.4}", adjustment.adjusted).bright_green().bold(),
        adjustment.from_region,
        adjustment.to_date
    );
    if let Some(exchanged) = &adjustment.exchanged {
        println!(
            "This means: {} {} in {} are worth {} {} in {}.",
            adjustment.value,
            adjustment.from_region,
            adjustment.from_date,
            format!("{:.4}", exchanged.value).bright_green().bold(),
            exchanged.region,
            adjustment.to_date
        );
    }
}

fn batch(requests_path: &Path, output: Option<&Path>, settings: &Settings) -> anyhow::Result<()> {
    let contents = fs::read_to_string(requests_path)
        .with_context(|| format!("failed to read {}", requests_path.display()))?;
    let requests: Vec<AdjustmentRequest> = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse {}", requests_path.display()))?;

    let cpi = IndexResolver::world_cpi(settings)?;
    let needs_exchange = requests.iter().any(|r| r.to_region.is_some());
    let exchange = load_exchange(settings, needs_exchange)?;

    let results = adjust_batch(&requests, &cpi, exchange.as_ref());
    let rows: Vec<BatchRow> = requests
        .iter()
        .zip(&results)
        .map(|(request, result)| match result {
            Ok(adjustment) => BatchRow {
                from_region: request.from_region.clone(),
                from_date: request.from_date.clone(),
                to_date: Some(adjustment.to_date.to_string()),
                value: request.value,
                adjusted: Some(adjustment.adjusted),
                exchanged_region: adjustment.exchanged.as_ref().map(|e| e.region.clone()),
                exchanged: adjustment.exchanged.as_ref().map(|e| e.value),
                error: None,
            },
            Err(e) => BatchRow {
                from_region: request.from_region.clone(),
                from_date: request.from_date.clone(),
                to_date: request.to_date.clone(),
                value: request.value,
                adjusted: None,
                exchanged_region: None,
                exchanged: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    let failed = rows.iter().filter(|r| r.error.is_some()).count();
    println!(
        "{} {} request(s), {} failed",
        "Processed".cyan().bold(),
        rows.len(),
        failed
    );

    match output {
        Some(output_path) => {
            let extension = output_path
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or("json");
            match extension {
                "csv" => {
                    let mut wtr = csv::Writer::from_path(output_path)?;
                    for row in &rows {
                        wtr.serialize(row)?;
                    }
                    wtr.flush()?;
                }
                "json" => fs::write(output_path, serde_json::to_string_pretty(&rows)?)?,
                _ => {
                    println!(
                        "{} Unknown output format. Using JSON.",
                        "Warning:".yellow()
                    );
                    fs::write(output_path, serde_json::to_string_pretty(&rows)?)?;
                }
            }
            println!(
                "{} Results saved to: {}",
                "✓".green().bold(),
                output_path.display()
            );
        }
        None => println!("{}", serde_json::to_string_pretty(&rows)?),
    }
    Ok(())
}

fn describe_table(label: &str, table: anyhow::Result<&IndexTable>) {
    match table {
        Ok(table) => match table.span() {
            Some((first, last)) => println!(
                "  {} {} region(s), {} to {}",
                format!("{}:", label).bold(),
                table.len(),
                first,
                last
            ),
            None => println!(
                "  {} {} region(s), no values",
                format!("{}:", label).bold(),
                table.len()
            ),
        },
        Err(e) => println!(
            "  {} {}",
            format!("{}:", label).bold(),
            format!("unavailable ({})", e).dimmed()
        ),
    }
}

fn show_info(verbose: bool, settings: &Settings) -> anyhow::Result<()> {
    println!(
        "{} {}",
        "rusty-cucopy".cyan().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("{}", env!("CARGO_PKG_DESCRIPTION"));
    println!();

    println!("{}", "Configuration".bold());
    println!("{}", "=============".dimmed());
    println!("  {} {}", "Data directory:".bold(), settings.data_dir.display());
    println!("  {} {}", "Language:".bold(), settings.parser.language());
    println!("  {} {:?}", "Delimiter:".bold(), settings.parser.delimiter());
    println!(
        "  {} {}",
        "Classification:".bold(),
        settings.parser.classification()
    );
    if verbose {
        if let Some(path) = Settings::default_path() {
            println!("  {} {}", "Default config:".bold(), path.display());
        }
    }
    println!();

    println!("{}", "Tables".bold());
    println!("{}", "======".dimmed());
    let series = IndexResolver::bundesbank(settings, &settings.parser);
    describe_table(
        "Bundesbank CPI",
        series.as_ref().map(|r| r.table()).map_err(|e| anyhow::anyhow!("{}", e)),
    );
    let cpi = IndexResolver::world_cpi(settings);
    describe_table(
        "World CPI",
        cpi.as_ref().map(|r| r.table()).map_err(|e| anyhow::anyhow!("{}", e)),
    );
    let exchange = ExchangeRates::world(settings);
    describe_table(
        "World exchange rates",
        exchange
            .as_ref()
            .map(|r| r.resolver().table())
            .map_err(|e| anyhow::anyhow!("{}", e)),
    );
    println!();

    Ok(())
}

#[cfg(feature = "async")]
fn update(language: &str, classification: Option<&str>, settings: &Settings) -> anyhow::Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rusty_cucopy::data::BundesbankClient;

    let language: Language = language.parse()?;
    let classifications = match classification {
        Some(c) => vec![c.parse::<Classification>()?],
        None => Classification::all(),
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let client = BundesbankClient::new()?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner.set_message(format!(
        "Downloading {} series ({})",
        classifications.len(),
        language
    ));
    let outcomes = runtime.block_on(client.download_all(settings, language, &classifications));
    spinner.finish_and_clear();

    let pb = ProgressBar::new(outcomes.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut failures = 0;
    for (classification, outcome) in &outcomes {
        pb.set_message(classification.to_string());
        match outcome {
            Ok(path) => pb.println(format!(
                "{} {} -> {}",
                "✓".green(),
                classification,
                path.display()
            )),
            Err(e) => {
                failures += 1;
                pb.println(format!("{} {}: {}", "Warning:".yellow(), classification, e));
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("Complete!");

    if failures > 0 {
        anyhow::bail!("{} series could not be downloaded", failures);
    }
    println!("{} Data update complete!", "✓".green().bold());
    Ok(())
}
