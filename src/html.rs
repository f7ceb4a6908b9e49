use std::f64::consts::PI;
use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{format_number, BarEntry, ScatterPoint, StudentRecord};
use crate::view::{self, ViewState};

const CHART_WIDTH: f64 = 480.0;
const CHART_HEIGHT: f64 = 250.0;
const CHART_PAD: f64 = 32.0;
const RADAR_SIZE: f64 = 300.0;

const STYLE: &str = "body{font-family:Inter,Segoe UI,sans-serif;background:#f3f4f6;margin:0;padding:24px;color:#111827}\
main{max-width:1280px;margin:0 auto}\
h1{text-align:center}\
.grid{display:grid;grid-template-columns:repeat(auto-fit,minmax(300px,1fr));gap:16px;margin-bottom:24px}\
.card{background:#fff;border-radius:12px;box-shadow:0 1px 3px rgba(0,0,0,.1);padding:16px}\
.label{font-size:13px;color:#6b7280}.value{font-size:24px;font-weight:600}\
.controls{display:flex;gap:12px;margin-bottom:24px}\
table{width:100%;border-collapse:collapse}th,td{border:1px solid #e5e7eb;padding:8px}\
tr.selected{background:#fef3c7}";

pub fn render_page(
    students: &[StudentRecord],
    state: &ViewState,
    generated_at: DateTime<Utc>,
) -> String {
    let overview = view::overview(students);
    let rows = state.visible(students);

    let mut page = String::new();

    let _ = writeln!(page, "<!DOCTYPE html>");
    let _ = writeln!(page, "<html lang=\"en\">");
    let _ = writeln!(page, "<head>");
    let _ = writeln!(page, "<meta charset=\"utf-8\">");
    let _ = writeln!(page, "<title>Student Performance Dashboard</title>");
    let _ = writeln!(page, "<style>{STYLE}</style>");
    let _ = writeln!(page, "</head>");
    let _ = writeln!(page, "<body>");
    let _ = writeln!(page, "<main>");
    let _ = writeln!(page, "<h1>📊 Student Performance Dashboard</h1>");
    let _ = writeln!(
        page,
        "<p class=\"label\">Generated {} from {} students</p>",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        students.len()
    );

    let cards = [
        ("Avg Assessment", overview.avg_assessment),
        ("Avg Comprehension", overview.avg_comprehension),
        ("Avg Engagement (min)", overview.avg_engagement),
    ];
    let _ = writeln!(page, "<section class=\"grid\">");
    for (label, value) in cards {
        let _ = writeln!(
            page,
            "<div class=\"card\"><div class=\"label\">{label}</div><div class=\"value\">{value}</div></div>"
        );
    }
    let _ = writeln!(page, "</section>");

    let _ = writeln!(page, "<section class=\"controls card\">");
    let _ = writeln!(
        page,
        "<span>Search: <strong>{}</strong></span>",
        escape_text(&state.search)
    );
    let _ = writeln!(
        page,
        "<span>Sort: <strong>{}</strong></span>",
        state.sort_field.label()
    );
    let _ = writeln!(
        page,
        "<span>{} {}</span>",
        state.sort_direction.arrow(),
        state.sort_direction.label()
    );
    let _ = writeln!(page, "</section>");

    let _ = writeln!(page, "<section class=\"grid\">");
    let _ = writeln!(
        page,
        "<div class=\"card\"><h3>Attention vs Assessment (Scatter)</h3>{}</div>",
        scatter_svg(&view::scatter_points(students))
    );
    let _ = writeln!(
        page,
        "<div class=\"card\"><h3>Assessment Scores (Bar)</h3>{}</div>",
        bar_svg(&view::bar_series(students))
    );
    let _ = writeln!(page, "</section>");

    let profile = match state.selected_record(students) {
        Some(record) => format!(
            "<p>{} (ID {})</p>{}",
            escape_text(&record.name),
            escape_text(&record.student_id.to_string()),
            radar_svg(record)
        ),
        None => "<div>No student selected</div>".to_string(),
    };
    let _ = writeln!(page, "<section class=\"grid\">");
    let _ = writeln!(
        page,
        "<div class=\"card\"><h3>Student Profile</h3>{profile}</div>"
    );
    let _ = writeln!(page, "<div class=\"card\"><h3>Insights</h3><ul>");
    for line in view::insight_lines(&overview).iter() {
        let _ = writeln!(page, "<li>{}</li>", escape_text(line));
    }
    let _ = writeln!(page, "</ul></div>");
    let _ = writeln!(page, "</section>");

    let _ = writeln!(page, "<section class=\"card\">");
    let _ = writeln!(page, "<h3>Student Table</h3>");
    if rows.is_empty() {
        let _ = writeln!(page, "<p>No students match the current search.</p>");
    } else {
        let _ = writeln!(page, "<table>");
        let _ = writeln!(
            page,
            "<thead><tr><th>ID</th><th>Name</th><th>Score</th><th>Persona</th></tr></thead>"
        );
        let _ = writeln!(page, "<tbody>");
        for record in rows.iter() {
            let id = escape_text(&record.student_id.to_string());
            let class = if state.selected.as_ref() == Some(&record.student_id) {
                " class=\"selected\""
            } else {
                ""
            };
            let _ = writeln!(
                page,
                "<tr data-student-id=\"{id}\"{class}><td>{id}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_text(&record.name),
                format_number(record.assessment_score),
                escape_text(&record.persona_label())
            );
        }
        let _ = writeln!(page, "</tbody>");
        let _ = writeln!(page, "</table>");
    }
    let _ = writeln!(page, "</section>");

    let _ = writeln!(page, "</main>");
    let _ = writeln!(page, "</body>");
    let _ = writeln!(page, "</html>");

    page
}

fn scatter_svg(points: &[ScatterPoint]) -> String {
    let mut svg = open_svg(CHART_WIDTH, CHART_HEIGHT);
    axes(&mut svg);

    let x_max = points.iter().map(|p| p.attention).fold(0.0, f64::max);
    let y_max = points.iter().map(|p| p.assessment_score).fold(0.0, f64::max);

    for point in points {
        let x = CHART_PAD + ratio(point.attention, x_max) * (CHART_WIDTH - 2.0 * CHART_PAD);
        let y = CHART_HEIGHT
            - CHART_PAD
            - ratio(point.assessment_score, y_max) * (CHART_HEIGHT - 2.0 * CHART_PAD);
        let _ = write!(
            svg,
            "<circle cx='{x:.1}' cy='{y:.1}' r='4' fill='#82ca9d'><title>attention {}, score {}</title></circle>",
            format_number(point.attention),
            format_number(point.assessment_score)
        );
    }

    svg.push_str("</svg>");
    svg
}

fn bar_svg(entries: &[BarEntry<'_>]) -> String {
    let mut svg = open_svg(CHART_WIDTH, CHART_HEIGHT);
    axes(&mut svg);

    let max = entries
        .iter()
        .map(|e| e.assessment_score)
        .fold(0.0, f64::max);
    let plot_width = CHART_WIDTH - 2.0 * CHART_PAD;
    let plot_height = CHART_HEIGHT - 2.0 * CHART_PAD;
    let slot = plot_width / entries.len().max(1) as f64;

    for (index, entry) in entries.iter().enumerate() {
        let height = ratio(entry.assessment_score, max) * plot_height;
        let x = CHART_PAD + index as f64 * slot + slot * 0.1;
        let y = CHART_HEIGHT - CHART_PAD - height;
        let _ = write!(
            svg,
            "<rect x='{x:.1}' y='{y:.1}' width='{:.1}' height='{height:.1}' fill='#8884d8'><title>{}: {}</title></rect>",
            slot * 0.8,
            escape_text(entry.name),
            format_number(entry.assessment_score)
        );
    }

    svg.push_str("</svg>");
    svg
}

fn radar_svg(record: &StudentRecord) -> String {
    let axes = view::radar_profile(record);
    let scale = view::radar_scale(&axes);
    let center = RADAR_SIZE / 2.0;
    let radius = center * 0.8;

    let vertex = |index: usize, fraction: f64| {
        let angle = -PI / 2.0 + 2.0 * PI * index as f64 / axes.len() as f64;
        (
            center + radius * fraction * angle.cos(),
            center + radius * fraction * angle.sin(),
        )
    };

    let mut svg = open_svg(RADAR_SIZE, RADAR_SIZE);

    for ring in [0.25, 0.5, 0.75, 1.0] {
        let outline: Vec<String> = (0..axes.len())
            .map(|i| {
                let (x, y) = vertex(i, ring);
                format!("{x:.1},{y:.1}")
            })
            .collect();
        let _ = write!(
            svg,
            "<polygon points='{}' fill='none' stroke='#d1d5db'/>",
            outline.join(" ")
        );
    }

    for (index, axis) in axes.iter().enumerate() {
        let (x, y) = vertex(index, 1.0);
        let (lx, ly) = vertex(index, 1.12);
        let _ = write!(
            svg,
            "<line x1='{center:.1}' y1='{center:.1}' x2='{x:.1}' y2='{y:.1}' stroke='#d1d5db'/>\
<text x='{lx:.1}' y='{ly:.1}' font-size='11' text-anchor='middle'>{}</text>",
            axis.skill
        );
    }

    let shape: Vec<String> = axes
        .iter()
        .enumerate()
        .map(|(index, axis)| {
            let (x, y) = vertex(index, ratio(axis.value, scale));
            format!("{x:.1},{y:.1}")
        })
        .collect();
    let _ = write!(
        svg,
        "<polygon points='{}' stroke='#ff7300' fill='#ff7300' fill-opacity='0.6'/>",
        shape.join(" ")
    );

    svg.push_str("</svg>");
    svg
}

fn open_svg(width: f64, height: f64) -> String {
    format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='100%' viewBox='0 0 {width:.0} {height:.0}' role='img'>"
    )
}

fn axes(svg: &mut String) {
    let bottom = CHART_HEIGHT - CHART_PAD;
    let right = CHART_WIDTH - CHART_PAD;
    let _ = write!(
        svg,
        "<line x1='{CHART_PAD}' y1='{bottom}' x2='{right}' y2='{bottom}' stroke='#9ca3af'/>\
<line x1='{CHART_PAD}' y1='{CHART_PAD}' x2='{CHART_PAD}' y2='{bottom}' stroke='#9ca3af'/>"
    );
}

fn ratio(value: f64, max: f64) -> f64 {
    if max <= 0.0 {
        0.0
    } else {
        (value / max).clamp(0.0, 1.0)
    }
}

fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::tests::student;
    use chrono::TimeZone;

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn page_has_charts_and_rows() {
        let students = vec![student(1, "Ann", 80.0), student(2, "Bob", 60.0)];
        let state = ViewState::new(&students);
        let page = render_page(&students, &state, generated_at());

        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<div class=\"value\">70</div>"));
        assert!(page.contains("<tr data-student-id=\"1\" class=\"selected\">"));
        assert!(page.contains("<tr data-student-id=\"2\"><td>2</td><td>Bob</td><td>60</td><td>-</td></tr>"));
        assert_eq!(page.matches("<circle").count(), 2);
        assert_eq!(page.matches("fill='#8884d8'").count(), 2);
        assert!(page.contains("fill='#ff7300'"));
    }

    #[test]
    fn bar_chart_stops_at_thirty_records() {
        let students: Vec<StudentRecord> = (1..=45)
            .map(|i| student(i, &format!("S{i}"), i as f64))
            .collect();
        let page = render_page(&students, &ViewState::new(&students), generated_at());
        assert_eq!(page.matches("fill='#8884d8'").count(), 30);
        assert_eq!(page.matches("<circle").count(), 45);
    }

    #[test]
    fn names_are_escaped() {
        let students = vec![student(1, "<script>", 10.0)];
        let page = render_page(&students, &ViewState::new(&students), generated_at());
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
    }

    #[test]
    fn empty_dataset_shows_placeholders() {
        let page = render_page(&[], &ViewState::new(&[]), generated_at());
        assert!(page.contains("No student selected"));
        assert!(page.contains("No students match the current search."));
        assert!(page.contains("<div class=\"value\">0</div>"));
    }
}
