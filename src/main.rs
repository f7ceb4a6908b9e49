use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

mod error;
mod export;
mod html;
mod loader;
mod models;
mod report;
mod session;
mod view;

use models::SortField;
use view::ViewState;

#[derive(Parser)]
#[command(name = "student-dashboard")]
#[command(about = "Student performance dashboard over a static dataset", long_about = None)]
struct Cli {
    /// JSON array of student records
    #[arg(long, global = true, env = "STUDENTS_DATA", default_value = "data/students.json")]
    data: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ViewArgs {
    /// Case-insensitive name filter
    #[arg(long, default_value = "")]
    search: String,
    /// Sort field: id, name, score or persona
    #[arg(long, default_value = "id")]
    sort: SortField,
    /// Sort descending
    #[arg(long)]
    desc: bool,
}

impl ViewArgs {
    fn apply(&self, state: &mut ViewState) {
        state.search = self.search.clone();
        state.sort_field = self.sort;
        if self.desc {
            state.toggle_direction();
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Markdown,
    Html,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the dashboard once
    Render {
        #[command(flatten)]
        controls: ViewArgs,
        /// Student ID to show in the profile panel
        #[arg(long)]
        select: Option<String>,
        #[arg(long, value_enum, default_value_t = Format::Markdown)]
        format: Format,
        /// Output file; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export the filtered and sorted table as CSV
    Export {
        #[command(flatten)]
        controls: ViewArgs,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print the overview averages
    Stats,
    /// Search, sort and select from the terminal
    Interactive,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("student_dashboard=debug,warn")
        } else {
            EnvFilter::new("student_dashboard=info,warn")
        }
    });
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let students = loader::load_students(&cli.data)?;

    match cli.command {
        Commands::Render {
            controls,
            select,
            format,
            out,
        } => {
            let mut state = ViewState::new(&students);
            controls.apply(&mut state);
            if let Some(id) = select {
                state
                    .select_id(&students, &id)
                    .with_context(|| format!("no student with ID {id}"))?;
            }

            let rendered = match format {
                Format::Markdown => report::render_dashboard(&students, &state, Utc::now()),
                Format::Html => html::render_page(&students, &state, Utc::now()),
            };
            info!(
                visible = state.visible(&students).len(),
                html = matches!(format, Format::Html),
                "rendered dashboard"
            );

            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Dashboard written to {}.", path.display());
                }
                None => print!("{rendered}"),
            }
        }
        Commands::Export { controls, out } => {
            let mut state = ViewState::new(&students);
            controls.apply(&mut state);
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            let count = export::write_table(&state.visible(&students), file)?;
            info!(path = %out.display(), rows = count, "exported table");
            println!("Exported {count} students to {}.", out.display());
        }
        Commands::Stats => {
            let overview = view::overview(&students);
            println!("Students: {}", students.len());
            println!("Avg assessment score: {}", overview.avg_assessment);
            println!("Avg comprehension: {}", overview.avg_comprehension);
            println!("Avg attention: {}", overview.avg_attention);
            println!("Avg focus: {}", overview.avg_focus);
            println!("Avg retention: {}", overview.avg_retention);
            println!("Avg engagement (min): {}", overview.avg_engagement);
        }
        Commands::Interactive => {
            let stdin = std::io::stdin();
            session::run(&students, stdin.lock(), std::io::stdout())?;
        }
    }

    Ok(())
}
