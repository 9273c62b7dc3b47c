// Entry point and high-level CLI flow.
//
// Without a subcommand the binary runs an interactive menu:
// - Option [1] refreshes the data (live source, cache, or demo rows).
// - Option [2] sets the filters and the workload period.
// - Option [3] writes the timeline, workload and heatmap reports and prints
//   previews. Afterwards the user can go back to the menu or exit.
//
// `report` does the same non-interactively; `watch` keeps refreshing on the
// configured interval.
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use timeline_report::config::{Config, SourceConfig};
use timeline_report::ingest::{DataOrigin, IngestOutcome, Session};
use timeline_report::output;
use timeline_report::reports::{self, timeline_rows};
use timeline_report::types::{Dataset, Filter, PeriodMode};
use timeline_report::util::{describe_filter, format_int};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "timeline-report")]
#[command(version, about = "Project timeline workload and heatmap reports", long_about = None)]
struct Cli {
    /// Config file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Spreadsheet id; overrides the configured source
    #[arg(long, env = "TIMELINE_SHEET_ID", global = true)]
    sheet_id: Option<String>,

    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Default)]
struct FilterArgs {
    #[arg(long)]
    client: Option<String>,
    #[arg(long)]
    team: Option<String>,
    #[arg(long = "type")]
    kind: Option<String>,
    #[arg(long)]
    phase: Option<String>,
    /// Month number, 1-12
    #[arg(long)]
    month: Option<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> Filter {
        Filter::from_inputs(
            self.client.as_deref(),
            self.team.as_deref(),
            self.kind.as_deref(),
            self.phase.as_deref(),
            self.month.as_deref(),
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Load data once and write all reports
    Report {
        #[command(flatten)]
        filters: FilterArgs,

        /// Workload period (month or quarter)
        #[arg(short, long, default_value = "month")]
        period: PeriodMode,

        /// Directory for the exported files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Refresh periodically and print a line per refresh
    Watch {
        /// Stop after this many refreshes
        #[arg(long)]
        cycles: Option<usize>,

        /// Seconds between refreshes (defaults to the config value)
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

/// Filter and period chosen in the interactive menu.
#[derive(Default)]
struct MenuState {
    filter: Filter,
    period: PeriodMode,
}

/// Print `prompt` and read one trimmed line. `None` on end of input.
fn read_input(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn prompt_back_to_menu() -> bool {
    loop {
        let Some(resp) = read_input("Back to Report Selection (Y/N): ") else {
            return false;
        };
        match resp.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn print_outcome(outcome: &IngestOutcome) {
    match outcome {
        IngestOutcome::Loaded {
            origin,
            report,
            notice,
        } => {
            if *origin == DataOrigin::Cache && notice.is_none() {
                println!("Showing cached data while fetching the latest rows...");
            }
            println!(
                "Processing dataset... ({} rows loaded, {} projects)",
                format_int(report.total_rows),
                format_int(report.project_rows)
            );
            if report.dropped_rows > 0 {
                println!(
                    "Note: {} empty rows skipped.",
                    format_int(report.dropped_rows)
                );
            }
            if let Some(notice) = notice {
                println!("Warning: {}", notice);
            }
        }
        IngestOutcome::Skipped => {
            println!("A refresh is already running; keeping the current data.");
        }
    }
    println!();
}

fn print_choices(label: &str, values: &[String]) {
    if values.is_empty() {
        println!("{}: (none)", label);
    } else {
        println!("{}: {}", label, values.join(", "));
    }
}

/// Handle option [2]: ask for each filter field. Blank input clears it.
fn handle_set_filters(state: &mut MenuState, dataset: &Dataset) {
    print_choices("Clients", &dataset.clients);
    print_choices("Teams", &dataset.teams);
    print_choices("Types", &dataset.types);
    println!("(Leave blank for no filter)\n");

    let client = read_input("Client: ");
    let team = read_input("Team: ");
    let kind = read_input("Type: ");
    let phase = read_input("Phase: ");
    let month = read_input("Month (1-12): ");
    state.filter = Filter::from_inputs(
        client.as_deref(),
        team.as_deref(),
        kind.as_deref(),
        phase.as_deref(),
        month.as_deref(),
    );
    if let Some(period) = read_input("Workload period (month/quarter): ") {
        if !period.is_empty() {
            match period.parse::<PeriodMode>() {
                Ok(p) => state.period = p,
                Err(e) => println!("{}; keeping {}.", e, state.period),
            }
        }
    }
    println!("Filters set: {}\n", describe_filter(&state.filter));
}

/// Handle option [3]: write every report and print previews.
fn handle_generate_reports(dataset: &Dataset, filter: &Filter, period: PeriodMode, out_dir: &Path) {
    if dataset.projects.is_empty() {
        println!("Error: No data loaded. Refresh the data first (option 1).\n");
        return;
    }
    if let Err(e) = fs::create_dir_all(out_dir) {
        eprintln!("Cannot create {}: {}", out_dir.display(), e);
        return;
    }

    println!("Generating reports ({})...", describe_filter(filter));
    println!("Outputs saved to individual files...\n");
    let report = reports::generate_report(dataset, filter, period);

    let rows = timeline_rows(&report.timeline);
    let file1 = out_dir.join("timeline.csv");
    if let Err(e) = output::write_csv(&file1, &rows) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 1: Project Timeline");
    println!("({} of {} projects)\n", rows.len(), dataset.projects.len());
    output::preview_table_rows(&rows, 5);
    println!("(Full table exported to {})\n", file1.display());

    let workload = output::workload_records(&report.workload);
    let file2 = out_dir.join("workload.csv");
    if let Err(e) = output::write_records(&file2, &workload) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 2: Workload by Team ({})\n", period);
    println!("{}\n", output::records_table(&workload));
    output::preview_table_rows(&report.team_loads, report.team_loads.len());
    println!("(Full table exported to {})\n", file2.display());

    let heatmap = output::heatmap_records(&report.heatmap);
    let file3 = out_dir.join("heatmap.csv");
    if let Err(e) = output::write_records(&file3, &heatmap) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 3: Team / Month Heatmap");
    println!("(max cell value {})\n", report.heatmap.max_value);
    println!("{}\n", output::records_table(&heatmap));
    println!("(Full table exported to {})\n", file3.display());

    let file4 = out_dir.join("summary.json");
    if let Err(e) = output::write_json(&file4, &report.summary) {
        eprintln!("Write error: {}", e);
    }
    println!("Summary Stats ({}):", file4.display());
    println!(
        "{{\"filtered_projects\": {}, \"busiest_team\": {}}}\n",
        report.summary.filtered_projects,
        report.summary.busiest_team.as_deref().unwrap_or("-")
    );
}

fn run_menu(session: &mut Session, out_dir: &Path) {
    let mut state = MenuState::default();
    println!("Loading data from {}...", session.source_description());
    session.start(|outcome, _| print_outcome(outcome));

    loop {
        println!("Select an option:");
        println!("[1] Refresh data");
        println!("[2] Set filters");
        println!("[3] Generate Reports\n");
        let Some(choice) = read_input("Enter choice: ") else {
            println!("Exiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => print_outcome(&session.ingest()),
            "2" => {
                let dataset = session.dataset();
                handle_set_filters(&mut state, &dataset);
            }
            "3" => {
                println!();
                let dataset = session.dataset();
                handle_generate_reports(&dataset, &state.filter, state.period, out_dir);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1, 2 or 3.\n"),
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(sheet_id) = cli.sheet_id {
        config.source = SourceConfig::Sheet { sheet_id };
    }
    let mut session = Session::from_config(&config);

    match cli.command {
        Some(Commands::Report {
            filters,
            period,
            output_dir,
        }) => {
            let out_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
            fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create {}", out_dir.display()))?;
            session.start(|outcome, _| print_outcome(outcome));
            let dataset = session.dataset();
            handle_generate_reports(&dataset, &filters.to_filter(), period, &out_dir);
        }
        Some(Commands::Watch {
            cycles,
            interval_secs,
        }) => {
            let interval = interval_secs
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.refresh_interval());
            session.warm_from_cache();
            session.watch(interval, cycles, |outcome, dataset| {
                print_outcome(outcome);
                println!(
                    "[{}] {} projects, {} clients, {} teams",
                    dataset.built_at.format("%H:%M"),
                    format_int(dataset.projects.len()),
                    format_int(dataset.clients.len()),
                    format_int(dataset.teams.len())
                );
            });
        }
        None => run_menu(&mut session, &config.output_dir),
    }

    Ok(())
}
