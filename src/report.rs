use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{format_number, BarEntry, Key, ScatterPoint, StudentRecord};
use crate::view::{self, ViewState};

const SCATTER_WIDTH: usize = 48;
const SCATTER_HEIGHT: usize = 12;
const BAR_WIDTH: usize = 40;
const RADAR_WIDTH: usize = 30;

pub fn render_dashboard(
    students: &[StudentRecord],
    state: &ViewState,
    generated_at: DateTime<Utc>,
) -> String {
    let overview = view::overview(students);
    let rows = state.visible(students);

    let mut output = String::new();

    let _ = writeln!(output, "# 📊 Student Performance Dashboard");
    let _ = writeln!(
        output,
        "Generated {} from {} students",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        students.len()
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Avg Assessment: {}", overview.avg_assessment);
    let _ = writeln!(output, "- Avg Comprehension: {}", overview.avg_comprehension);
    let _ = writeln!(output, "- Avg Engagement (min): {}", overview.avg_engagement);
    let _ = writeln!(output);

    let _ = writeln!(output, "## Controls");
    let search = if state.search.is_empty() {
        "(none)".to_string()
    } else {
        format!("\"{}\"", state.search)
    };
    let _ = writeln!(output, "- Search: {search}");
    let _ = writeln!(output, "- Sort: {}", state.sort_field.label());
    let _ = writeln!(
        output,
        "- Direction: {} {}",
        state.sort_direction.arrow(),
        state.sort_direction.label()
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Attention vs Assessment (Scatter)");
    let _ = writeln!(output, "```");
    output.push_str(&render_scatter(&view::scatter_points(students)));
    let _ = writeln!(output, "```");
    let _ = writeln!(output);

    let _ = writeln!(output, "## Assessment Scores (Bar)");
    let _ = writeln!(output, "```");
    output.push_str(&render_bars(&view::bar_series(students)));
    let _ = writeln!(output, "```");
    let _ = writeln!(output);

    let _ = writeln!(output, "## Student Profile");
    output.push_str(&render_profile(state.selected_record(students)));
    let _ = writeln!(output);

    let _ = writeln!(output, "## Insights");
    for line in view::insight_lines(&overview).iter() {
        let _ = writeln!(output, "- {line}");
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Student Table");
    output.push_str(&render_table(&rows, state.selected.as_ref()));

    output
}

pub fn render_scatter(points: &[ScatterPoint]) -> String {
    let mut output = String::new();

    if points.is_empty() {
        let _ = writeln!(output, "No data to plot.");
        return output;
    }

    let (x_min, x_max) = bounds(points.iter().map(|p| p.attention));
    let (y_min, y_max) = bounds(points.iter().map(|p| p.assessment_score));

    let mut grid = vec![[0usize; SCATTER_WIDTH]; SCATTER_HEIGHT];
    for point in points {
        let col = cell(point.attention, x_min, x_max, SCATTER_WIDTH);
        let row = SCATTER_HEIGHT - 1 - cell(point.assessment_score, y_min, y_max, SCATTER_HEIGHT);
        grid[row][col] += 1;
    }

    let y_top = format_number(y_max);
    let y_bottom = format_number(y_min);
    let gutter = y_top.len().max(y_bottom.len());

    for (index, cells) in grid.iter().enumerate() {
        let label = if index == 0 {
            y_top.as_str()
        } else if index == SCATTER_HEIGHT - 1 {
            y_bottom.as_str()
        } else {
            ""
        };
        let line: String = cells
            .iter()
            .map(|count| match count {
                0 => ' ',
                1 => '•',
                _ => '●',
            })
            .collect();
        let _ = writeln!(output, "{label:>gutter$} |{}", line.trim_end());
    }

    let _ = writeln!(output, "{:>gutter$} +{}", "", "-".repeat(SCATTER_WIDTH));
    let x_left = format_number(x_min);
    let x_right = format_number(x_max);
    let span = SCATTER_WIDTH.saturating_sub(x_left.len());
    let _ = writeln!(output, "{:>gutter$}  {x_left}{x_right:>span$}", "");
    let _ = writeln!(output, "x: attention, y: assessment score");

    output
}

pub fn render_bars(entries: &[BarEntry<'_>]) -> String {
    let mut output = String::new();

    if entries.is_empty() {
        let _ = writeln!(output, "No data to plot.");
        return output;
    }

    let max = entries
        .iter()
        .map(|e| e.assessment_score)
        .fold(0.0, f64::max);
    let name_width = entries
        .iter()
        .map(|e| e.name.chars().count())
        .max()
        .unwrap_or(0);

    for entry in entries {
        let bar = "█".repeat(scaled(entry.assessment_score, max, BAR_WIDTH));
        let _ = writeln!(
            output,
            "{:<name_width$} |{} {}",
            entry.name,
            bar,
            format_number(entry.assessment_score)
        );
    }

    output
}

pub fn render_profile(selected: Option<&StudentRecord>) -> String {
    let mut output = String::new();

    let Some(record) = selected else {
        let _ = writeln!(output, "No student selected");
        return output;
    };

    let axes = view::radar_profile(record);
    let scale = view::radar_scale(&axes);

    let _ = writeln!(output, "{} (ID {})", record.name, record.student_id);
    let _ = writeln!(output, "```");
    for axis in axes.iter() {
        let bar = "▓".repeat(scaled(axis.value, scale, RADAR_WIDTH));
        let _ = writeln!(
            output,
            "{:<13} |{:<RADAR_WIDTH$}| {}",
            axis.skill,
            bar,
            format_number(axis.value)
        );
    }
    let _ = writeln!(output, "```");

    output
}

pub fn render_table(rows: &[&StudentRecord], selected: Option<&Key>) -> String {
    let mut output = String::new();

    if rows.is_empty() {
        let _ = writeln!(output, "No students match the current search.");
        return output;
    }

    let _ = writeln!(output, "| # | ID | Name | Score | Persona |");
    let _ = writeln!(output, "|---|----|------|-------|---------|");
    for (index, record) in rows.iter().enumerate() {
        let marker = if selected == Some(&record.student_id) {
            "▶ "
        } else {
            ""
        };
        let _ = writeln!(
            output,
            "| {}{} | {} | {} | {} | {} |",
            marker,
            index + 1,
            escape_cell(&record.student_id.to_string()),
            escape_cell(&record.name),
            format_number(record.assessment_score),
            escape_cell(&record.persona_label())
        );
    }

    output
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
        (min.min(v), max.max(v))
    });
    if min.is_finite() && max.is_finite() {
        (min, max)
    } else {
        (0.0, 0.0)
    }
}

fn cell(value: f64, min: f64, max: f64, cells: usize) -> usize {
    if max <= min {
        return 0;
    }
    let position = ((value - min) / (max - min) * (cells - 1) as f64).round();
    (position.max(0.0) as usize).min(cells - 1)
}

fn scaled(value: f64, max: f64, width: usize) -> usize {
    if max <= 0.0 || value <= 0.0 {
        return 0;
    }
    ((value / max * width as f64).round() as usize).min(width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortDirection;
    use crate::view::tests::student;
    use chrono::TimeZone;

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn dashboard_includes_cards_and_table() {
        let students = vec![student(1, "Ann", 80.0), student(2, "Bob", 60.0)];
        let state = ViewState::new(&students);
        let report = render_dashboard(&students, &state, generated_at());

        assert!(report.contains("Generated 2026-03-01 09:30 UTC from 2 students"));
        assert!(report.contains("- Avg Assessment: 70"));
        assert!(report.contains("- Avg Comprehension: 70"));
        assert!(report.contains("- Avg Engagement (min): 30"));
        assert!(report.contains("- Direction: ⬆ Asc"));
        assert!(report.contains("| ▶ 1 | 1 | Ann | 80 | - |"));
        assert!(report.contains("| 2 | 2 | Bob | 60 | - |"));
        assert!(report.contains("- Average assessment score: 70"));
    }

    #[test]
    fn table_follows_search_and_sort() {
        let students = vec![
            student(1, "Ann", 80.0),
            student(2, "Bob", 60.0),
            student(3, "Hannah", 90.0),
        ];
        let mut state = ViewState::new(&students);
        state.search = "AN".to_string();
        state.sort_field = crate::models::SortField::Score;
        state.sort_direction = SortDirection::Descending;

        let table = render_table(&state.visible(&students), None);
        let hannah = table.find("Hannah").unwrap();
        let ann = table.find("| Ann |").unwrap();
        assert!(hannah < ann);
        assert!(!table.contains("Bob"));
    }

    #[test]
    fn empty_dataset_renders_placeholders() {
        let state = ViewState::new(&[]);
        let report = render_dashboard(&[], &state, generated_at());

        assert!(report.contains("- Avg Assessment: 0"));
        assert!(report.contains("No student selected"));
        assert!(report.contains("No students match the current search."));
        assert!(report.contains("No data to plot."));
    }

    #[test]
    fn profile_scales_against_largest_axis() {
        let record = student(1, "Ann", 80.0);
        let profile = render_profile(Some(&record));
        let full = format!("|{}|", "▓".repeat(RADAR_WIDTH));
        assert!(profile.starts_with("Ann (ID 1)"));
        assert!(profile.contains(&format!("comprehension {full} 70")));
    }

    #[test]
    fn scatter_marks_extremes() {
        let points = [
            ScatterPoint {
                attention: 10.0,
                assessment_score: 20.0,
            },
            ScatterPoint {
                attention: 90.0,
                assessment_score: 100.0,
            },
        ];
        let plot = render_scatter(&points);
        let lines: Vec<&str> = plot.lines().collect();
        assert!(lines[0].starts_with("100 |"));
        assert!(lines[0].ends_with('•'));
        assert!(lines[SCATTER_HEIGHT - 1].starts_with(" 20 |•"));
    }

    #[test]
    fn bars_are_proportional() {
        let entries = [
            BarEntry {
                name: "Ann",
                assessment_score: 80.0,
            },
            BarEntry {
                name: "Bob",
                assessment_score: 40.0,
            },
        ];
        let chart = render_bars(&entries);
        assert!(chart.contains(&format!("Ann |{} 80", "█".repeat(BAR_WIDTH))));
        assert!(chart.contains(&format!("Bob |{} 40", "█".repeat(BAR_WIDTH / 2))));
    }

    #[test]
    fn pipes_in_names_are_escaped() {
        let record = student(1, "A|B", 1.0);
        let table = render_table(&[&record], None);
        assert!(table.contains("A\\|B"));
    }
}
