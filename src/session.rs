use std::io::{BufRead, Write};

use chrono::Utc;
use tracing::{debug, warn};

use crate::models::{SortField, StudentRecord};
use crate::report;
use crate::view::ViewState;

const PROMPT: &str = "dashboard> ";

const HELP: &str = "Commands:
  search <text>   filter by name (search alone clears)
  sort <field>    sort by id, name, score or persona
  toggle          flip sort direction
  select <row>    select a table row by number
  pick <id>       select a student by ID
  show            print the full dashboard
  table           print the table
  profile         print the selected student's profile
  help            show this help
  quit            leave the session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Sort(SortField),
    Toggle,
    Select(usize),
    Pick(String),
    Show,
    Table,
    Profile,
    Help,
    Quit,
}

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim_end_matches(['\r', '\n']).trim_start();
    if line.trim().is_empty() {
        return Ok(None);
    }

    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    let command = match verb.to_ascii_lowercase().as_str() {
        "search" => Command::Search(rest.to_string()),
        "sort" => Command::Sort(rest.parse()?),
        "toggle" => Command::Toggle,
        "select" => {
            let row: usize = rest
                .trim()
                .parse()
                .map_err(|_| format!("'{}' is not a row number", rest.trim()))?;
            if row == 0 {
                return Err("rows are numbered from 1".to_string());
            }
            Command::Select(row)
        }
        "pick" if !rest.trim().is_empty() => Command::Pick(rest.trim().to_string()),
        "pick" => return Err("pick needs a student ID".to_string()),
        "show" => Command::Show,
        "table" => Command::Table,
        "profile" => Command::Profile,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{other}' (try help)")),
    };

    Ok(Some(command))
}

/// Runs the interactive session until `quit` or end of input and returns the final view state.
pub fn run<R: BufRead, W: Write>(
    students: &[StudentRecord],
    input: R,
    mut output: W,
) -> anyhow::Result<ViewState> {
    let mut state = ViewState::new(students);

    writeln!(output, "{} students loaded. Type help for commands.", students.len())?;
    print_view(students, &state, &mut output)?;
    write!(output, "{PROMPT}")?;
    output.flush()?;

    for line in input.lines() {
        let line = line?;
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => {
                write!(output, "{PROMPT}")?;
                output.flush()?;
                continue;
            }
            Err(message) => {
                warn!(input = %line, "rejected session command");
                writeln!(output, "error: {message}")?;
                write!(output, "{PROMPT}")?;
                output.flush()?;
                continue;
            }
        };

        debug!(?command, "session command");

        match command {
            Command::Quit => break,
            Command::Help => writeln!(output, "{HELP}")?,
            Command::Show => write!(
                output,
                "{}",
                report::render_dashboard(students, &state, Utc::now())
            )?,
            Command::Table => write!(
                output,
                "{}",
                report::render_table(&state.visible(students), state.selected.as_ref())
            )?,
            Command::Profile => write!(
                output,
                "{}",
                report::render_profile(state.selected_record(students))
            )?,
            Command::Search(query) => {
                state.search = query;
                print_view(students, &state, &mut output)?;
            }
            Command::Sort(field) => {
                state.sort_field = field;
                print_view(students, &state, &mut output)?;
            }
            Command::Toggle => {
                state.toggle_direction();
                print_view(students, &state, &mut output)?;
            }
            Command::Select(row) => {
                if state.select_row(students, row - 1).is_some() {
                    print_view(students, &state, &mut output)?;
                } else {
                    writeln!(output, "error: no row {row} in the current table")?;
                }
            }
            Command::Pick(id) => {
                if state.select_id(students, &id).is_some() {
                    print_view(students, &state, &mut output)?;
                } else {
                    writeln!(output, "error: no student with ID {id}")?;
                }
            }
        }

        write!(output, "{PROMPT}")?;
        output.flush()?;
    }

    writeln!(output)?;
    Ok(state)
}

fn print_view<W: Write>(
    students: &[StudentRecord],
    state: &ViewState,
    output: &mut W,
) -> anyhow::Result<()> {
    let search = if state.search.is_empty() {
        String::new()
    } else {
        format!(" | search \"{}\"", state.search)
    };
    writeln!(
        output,
        "Sort: {} {} {}{}",
        state.sort_field.label(),
        state.sort_direction.arrow(),
        state.sort_direction.label(),
        search
    )?;
    write!(
        output,
        "{}",
        report::render_table(&state.visible(students), state.selected.as_ref())
    )?;
    write!(output, "{}", report::render_profile(state.selected_record(students)))?;
    Ok(())
}
