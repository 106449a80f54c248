use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use osdash::export::{DEFAULT_EXPORT_FILE, EXPORT_HEADERS};
use osdash::view::{StackedBarChart, LOAD_FAILURE_WARNING};
use osdash::{
    DashboardView, DateRange, DbConfig, FilterOptions, FixtureSource, MonthKey, MonthlyView,
    OrderDashboard, OrderSource, PostgresSource, Selection, ServiceOrderRecord,
};

#[derive(Parser)]
#[command(name = "osdash", about = "Service order analytics dashboard")]
struct Cli {
    /// Read records from a JSON fixture instead of the database
    #[arg(long, value_name = "FILE")]
    fixture: Option<PathBuf>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show KPIs, the overall breakdown and the monthly breakdown
    Summary {
        #[command(flatten)]
        filters: FilterArgs,
        /// Include the detail table
        #[arg(long)]
        details: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List available localities, months and the generation date span
    Filters {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the filtered detail table as CSV
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        /// Output file
        #[arg(long, short, default_value = DEFAULT_EXPORT_FILE)]
        output: PathBuf,
    },
    /// Save the current snapshot as a JSON fixture
    Snapshot {
        /// Output file
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Show the resolved database connection settings
    Config,
}

#[derive(Args)]
struct FilterArgs {
    /// Locality id (repeatable; default: all)
    #[arg(long = "locality", value_name = "ID")]
    localities: Vec<i64>,
    /// First generation date, YYYY-MM-DD (default: earliest in data)
    #[arg(long)]
    from: Option<String>,
    /// Last generation date, YYYY-MM-DD (default: latest in data)
    #[arg(long)]
    to: Option<String>,
    /// Month for the monthly breakdown, MM/YYYY (repeatable; default: all)
    #[arg(long = "month", value_name = "MM/YYYY")]
    months: Vec<String>,
    /// Select no months (suppresses the monthly breakdown)
    #[arg(long, conflicts_with = "months")]
    no_months: bool,
}

impl FilterArgs {
    fn to_selection(&self, records: &[ServiceOrderRecord]) -> anyhow::Result<Selection> {
        let options = FilterOptions::from_records(records);
        let mut selection = Selection::all(&options);

        if !self.localities.is_empty() {
            selection = selection.with_localities(self.localities.iter().copied());
        }

        let from = match &self.from {
            Some(s) => Some(osdash::date_util::parse_date(s)?),
            None => options.date_span.map(|span| span.from),
        };
        let to = match &self.to {
            Some(s) => Some(osdash::date_util::parse_date(s)?),
            None => options.date_span.map(|span| span.to),
        };
        if let (Some(from), Some(to)) = (from, to) {
            selection = selection.with_date_range(DateRange::new(from, to));
        }

        if self.no_months {
            selection = selection.with_months(Vec::new());
        } else if !self.months.is_empty() {
            let months = self
                .months
                .iter()
                .map(|m| MonthKey::parse(m))
                .collect::<osdash::Result<Vec<_>>>()?;
            selection = selection.with_months(months);
        } else {
            selection = selection.with_available_months(records);
        }

        Ok(selection)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Summary {
            filters,
            details,
            json,
        } => {
            let dash = open_dashboard(cli.fixture.as_deref())?;
            handle_summary(&dash, &filters, details, json).await?;
        }
        Commands::Filters { json } => {
            let dash = open_dashboard(cli.fixture.as_deref())?;
            handle_filters(&dash, json).await?;
        }
        Commands::Export { filters, output } => {
            let dash = open_dashboard(cli.fixture.as_deref())?;
            handle_export(&dash, &filters, &output).await?;
        }
        Commands::Snapshot { output } => {
            let dash = open_dashboard(cli.fixture.as_deref())?;
            handle_snapshot(&dash, &output).await?;
        }
        Commands::Config => {
            handle_config()?;
        }
    }

    Ok(())
}

fn open_dashboard(fixture: Option<&Path>) -> anyhow::Result<OrderDashboard> {
    let source: Arc<dyn OrderSource> = match fixture {
        Some(path) => {
            log::info!("Using fixture {}", path.display());
            Arc::new(FixtureSource::from_path(path))
        }
        None => Arc::new(PostgresSource::new(DbConfig::from_env()?)),
    };
    Ok(OrderDashboard::new(source))
}

fn handle_config() -> anyhow::Result<()> {
    let config = DbConfig::from_env()?;
    println!("Database: {config}");
    println!("  Host:     {}", config.host);
    println!("  Port:     {}", config.port);
    println!("  Database: {}", config.dbname);
    println!("  User:     {}", config.user);
    println!(
        "  Password: {}",
        if config.password.is_some() { "(set)" } else { "(not set)" }
    );
    Ok(())
}

async fn handle_summary(
    dash: &OrderDashboard,
    filters: &FilterArgs,
    details: bool,
    json: bool,
) -> anyhow::Result<()> {
    let loaded = dash.load().await;
    let selection = filters.to_selection(&loaded.records)?;
    let view = dash.view(Some(&selection), details).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    if let Some(warning) = view.warning {
        eprintln!("Warning: {warning}");
        if let Some(e) = &view.load_error {
            eprintln!("  {e}");
        }
        return Ok(());
    }

    print_kpis(&view);
    println!();
    print_chart(&view.overall_chart, "");
    println!();
    print_monthly(&view.monthly);
    if let Some(rows) = &view.details {
        println!();
        println!("Detalhes ({} OS)", rows.len());
        println!("  {}", EXPORT_HEADERS.join(" | "));
        for row in rows {
            println!("  {}", row.fields().join(" | "));
        }
    }
    Ok(())
}

async fn handle_filters(dash: &OrderDashboard, json: bool) -> anyhow::Result<()> {
    let loaded = dash.load().await;
    if let Some(e) = &loaded.error {
        anyhow::bail!("{LOAD_FAILURE_WARNING} ({e})");
    }
    let options = FilterOptions::from_records(&loaded.records);

    if json {
        println!("{}", serde_json::to_string_pretty(&options)?);
        return Ok(());
    }

    let localities: Vec<String> = options.localities.iter().map(|l| l.to_string()).collect();
    let months: Vec<String> = options.months.iter().map(|m| m.label()).collect();
    println!("Localidades: {}", localities.join(", "));
    println!("Meses:       {}", months.join(", "));
    match options.date_span {
        Some(span) => println!("Período:     {} a {}", span.from, span.to),
        None => println!("Período:     (sem dados)"),
    }
    Ok(())
}

async fn handle_export(
    dash: &OrderDashboard,
    filters: &FilterArgs,
    output: &Path,
) -> anyhow::Result<()> {
    let loaded = dash.load().await;
    if let Some(e) = &loaded.error {
        anyhow::bail!("{LOAD_FAILURE_WARNING} ({e})");
    }
    let selection = filters.to_selection(&loaded.records)?;
    let filtered = osdash::filter::filter_records(&loaded.records, &selection);
    osdash::export::write_csv(output, &filtered)?;
    println!("Exported {} rows to {}", filtered.len(), output.display());
    Ok(())
}

async fn handle_snapshot(dash: &OrderDashboard, output: &Path) -> anyhow::Result<()> {
    let loaded = dash.load().await;
    if let Some(e) = &loaded.error {
        anyhow::bail!("{LOAD_FAILURE_WARNING} ({e})");
    }
    osdash::source::fixture::write_fixture(output, &loaded.records)?;
    println!("Saved {} records to {}", loaded.records.len(), output.display());
    Ok(())
}

fn print_kpis(view: &DashboardView) {
    println!("Visão Geral do Período Selecionado");
    println!("  Total de OS Geradas:    {}", view.kpi_cards.total_generated);
    println!("  Total de OS Concluídas: {}", view.kpi_cards.total_completed);
    println!("  Taxa de Conclusão:      {}", view.kpi_cards.completion_rate);
}

fn print_chart(chart: &StackedBarChart, indent: &str) {
    println!("{indent}{}", chart.title);
    if chart.is_empty() {
        println!("{indent}  (sem dados)");
        return;
    }
    for (i, category) in chart.categories.iter().enumerate() {
        println!("{indent}  {category}: {}", chart.totals[i]);
        for series in &chart.series {
            if series.values[i] > 0 {
                println!("{indent}    {:<24} {}", series.name, series.values[i]);
            }
        }
    }
}

fn print_monthly(monthly: &MonthlyView) {
    println!("Análise Mensal Detalhada");
    match monthly {
        MonthlyView::Suppressed { prompt } => println!("  {prompt}"),
        MonthlyView::Ready { chart, .. } => {
            if chart.facets.is_empty() {
                println!("  (sem dados)");
            }
            for facet in &chart.facets {
                print_chart(facet, "  ");
            }
        }
    }
}
