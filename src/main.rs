use chrono::Local;
use clap::{Parser, Subcommand};
use configuration::OutputFormat;
use indicatif::{ProgressBar, ProgressStyle};
use market_data::CsvPriceProvider;
use rust_decimal::Decimal;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use valuation::{ValuationError, write_value_table};

mod render;
mod session;

use session::Session;

/// The main entry point for the portfolio tracker.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load TRACKER__* overrides from a .env file when one is present.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let settings = configuration::load_config(cli.config.as_deref())?;
    let log_guard = configuration::init_tracing(&settings.logging)?;

    let provider = CsvPriceProvider::new(&settings.market_data.prices_dir);
    let session = Session::new(settings, provider);

    // Execute the appropriate command
    let outcome = match cli.command {
        Commands::Value(args) => handle_value(&session, args).await,
        Commands::Export(args) => handle_export(&session, args).await,
        Commands::Add(args) => handle_add(&session, args).await,
        Commands::Remove(args) => handle_remove(&session, args),
        Commands::List => handle_list(&session),
        Commands::Save(args) => handle_save(&session, args),
        Commands::Load(args) => handle_load(&session, args),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e:#}");
        if let Some(ValuationError::InsufficientData(_)) = e.downcast_ref::<ValuationError>() {
            eprintln!(
                "This may happen if a newly added stock doesn't have data for the selected time range. \
                 Try a longer --days window or different tickers."
            );
        }
        // Flush the file appender before exiting.
        drop(log_guard);
        std::process::exit(1);
    }
    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Tracks how the value of a set of stock holdings evolved over a trailing window.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (defaults to ./config.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Value the portfolio over the lookback window.
    Value(ValueArgs),
    /// Write the per-asset value table as CSV.
    Export(ExportArgs),
    /// Add a holding to the portfolio.
    Add(AddArgs),
    /// Remove a holding from the portfolio.
    Remove(RemoveArgs),
    /// Show the current holdings.
    List,
    /// Download the portfolio to a CSV file.
    Save(SaveArgs),
    /// Replace the portfolio with the contents of a CSV file (`ticker,shares`).
    Load(LoadArgs),
}

#[derive(Parser)]
struct ValueArgs {
    /// History duration in calendar days (30 to 1825). Defaults to the configured lookback.
    #[arg(long)]
    days: Option<u32>,

    /// Output format. Defaults to the configured format.
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Number of most recent trading days to show in the table view.
    #[arg(long, default_value_t = 10)]
    rows: usize,
}

#[derive(Parser)]
struct ExportArgs {
    /// Destination CSV file.
    #[arg(long)]
    out: PathBuf,

    /// History duration in calendar days (30 to 1825).
    #[arg(long)]
    days: Option<u32>,
}

#[derive(Parser)]
struct AddArgs {
    /// Stock ticker (e.g., "AAPL", "MSFT").
    #[arg(long)]
    ticker: String,

    /// Number of shares; fractional amounts are allowed.
    #[arg(long)]
    shares: Decimal,

    /// Add the ticker even if no price history can be found for it.
    #[arg(long)]
    force: bool,
}

#[derive(Parser)]
struct RemoveArgs {
    #[arg(long)]
    ticker: String,
}

#[derive(Parser)]
struct SaveArgs {
    /// Destination CSV file.
    #[arg(long, default_value = "my_portfolio.csv")]
    out: PathBuf,
}

#[derive(Parser)]
struct LoadArgs {
    /// CSV file with `ticker` and `shares` columns.
    #[arg(long)]
    file: PathBuf,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_value(
    session: &Session<CsvPriceProvider>,
    args: ValueArgs,
) -> anyhow::Result<()> {
    let format = args.format.unwrap_or(session.settings().output.format);
    let days = args
        .days
        .unwrap_or(session.settings().valuation.lookback_days);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message("Fetching market data...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = session.value(Some(days), Local::now().date_naive()).await;
    spinner.finish_and_clear();

    let Some(result) = result? else {
        println!("Please add stocks with `add` or load a CSV with `load` to value a portfolio.");
        return Ok(());
    };

    match format {
        OutputFormat::Table => render::print_valuation(&result, days, args.rows),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Csv => write_value_table(&result.values, io::stdout().lock())?,
    }
    Ok(())
}

async fn handle_export(
    session: &Session<CsvPriceProvider>,
    args: ExportArgs,
) -> anyhow::Result<()> {
    let Some(result) = session.value(args.days, Local::now().date_naive()).await? else {
        println!("The portfolio is empty; nothing to export.");
        return Ok(());
    };

    let file = std::fs::File::create(&args.out)?;
    write_value_table(&result.values, io::BufWriter::new(file))?;
    println!(
        "Wrote {} trading days to {}",
        result.values.len(),
        args.out.display()
    );
    for warning in &result.warnings {
        println!("warning: {warning}");
    }
    Ok(())
}

async fn handle_add(session: &Session<CsvPriceProvider>, args: AddArgs) -> anyhow::Result<()> {
    let holding = session
        .add_holding(&args.ticker, args.shares, args.force)
        .await?;
    println!("Added {} ({} sh)", holding.ticker, holding.shares.normalize());
    Ok(())
}

fn handle_remove(session: &Session<CsvPriceProvider>, args: RemoveArgs) -> anyhow::Result<()> {
    let removed = session.remove_holding(&args.ticker)?;
    println!("Removed {}", removed.ticker);
    Ok(())
}

fn handle_list(session: &Session<CsvPriceProvider>) -> anyhow::Result<()> {
    render::print_holdings(&session.portfolio()?);
    Ok(())
}

fn handle_save(session: &Session<CsvPriceProvider>, args: SaveArgs) -> anyhow::Result<()> {
    let count = session.save_to(&args.out)?;
    println!("Saved {count} holdings to {}", args.out.display());
    Ok(())
}

fn handle_load(session: &Session<CsvPriceProvider>, args: LoadArgs) -> anyhow::Result<()> {
    let portfolio = session.load_from(&args.file)?;
    println!("Portfolio loaded successfully! ({} holdings)", portfolio.len());
    render::print_holdings(&portfolio);
    Ok(())
}
