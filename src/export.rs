use std::io;

use serde::Serialize;

use crate::models::{format_number, StudentRecord};

#[derive(Serialize)]
struct TableRow<'a> {
    student_id: String,
    name: &'a str,
    assessment_score: String,
    persona: String,
}

/// Writes the table rows, in the order given, as CSV. Returns the row count.
pub fn write_table<W: io::Write>(rows: &[&StudentRecord], writer: W) -> anyhow::Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for record in rows {
        csv_writer.serialize(TableRow {
            student_id: record.student_id.to_string(),
            name: &record.name,
            assessment_score: format_number(record.assessment_score),
            persona: record.persona_label(),
        })?;
    }

    if rows.is_empty() {
        csv_writer.write_record(["student_id", "name", "assessment_score", "persona"])?;
    }

    csv_writer.flush()?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Key, SortDirection, SortField};
    use crate::view::tests::student;
    use crate::view::ViewState;

    #[test]
    fn writes_visible_rows_in_order() {
        let mut students = vec![
            student(1, "Ann", 80.0),
            student(2, "Bob", 60.0),
            student(3, "Hannah, Jr.", 91.5),
        ];
        students[0].persona = Some(Key::Text("Explorer".to_string()));

        let state = ViewState {
            search: "an".to_string(),
            sort_field: SortField::Score,
            sort_direction: SortDirection::Descending,
            selected: None,
        };

        let mut buffer = Vec::new();
        let count = write_table(&state.visible(&students), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            text,
            "student_id,name,assessment_score,persona\n3,\"Hannah, Jr.\",91.5,-\n1,Ann,80,Explorer\n"
        );
    }

    #[test]
    fn empty_table_still_has_header() {
        let mut buffer = Vec::new();
        let count = write_table(&[], &mut buffer).unwrap();
        assert_eq!(count, 0);
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "student_id,name,assessment_score,persona\n"
        );
    }

    #[test]
    fn writes_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        let students = vec![student(1, "Ann", 80.0)];
        let rows: Vec<&StudentRecord> = students.iter().collect();

        let file = std::fs::File::create(&path).unwrap();
        write_table(&rows, file).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.ends_with("1,Ann,80,-\n"));
    }
}
