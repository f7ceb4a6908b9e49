use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::LoadError;
use crate::models::{Key, StudentRecord};

#[derive(Deserialize)]
struct StudentRow {
    student_id: Key,
    name: String,
    #[serde(default)]
    assessment_score: Option<f64>,
    #[serde(default)]
    comprehension: Option<f64>,
    #[serde(default)]
    attention: Option<f64>,
    #[serde(default)]
    focus: Option<f64>,
    #[serde(default)]
    retention: Option<f64>,
    #[serde(default)]
    engagement_time: Option<f64>,
    #[serde(default)]
    cluster: Option<Key>,
    #[serde(default)]
    persona: Option<Key>,
}

impl From<StudentRow> for StudentRecord {
    fn from(row: StudentRow) -> Self {
        StudentRecord {
            student_id: row.student_id,
            name: row.name,
            assessment_score: row.assessment_score.unwrap_or(0.0),
            comprehension: row.comprehension.unwrap_or(0.0),
            attention: row.attention.unwrap_or(0.0),
            focus: row.focus.unwrap_or(0.0),
            retention: row.retention.unwrap_or(0.0),
            engagement_time: row.engagement_time.unwrap_or(0.0),
            persona: row.cluster.or(row.persona),
        }
    }
}

pub fn load_students(path: &Path) -> Result<Vec<StudentRecord>, LoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let students = parse_students(&raw, path)?;
    info!(path = %path.display(), count = students.len(), "loaded student data");
    Ok(students)
}

/// Parses the contents of `path` without touching the filesystem.
///
/// Ids collide when their display forms match, so `1` and `"1"` cannot coexist.
pub fn parse_students(raw: &str, path: &Path) -> Result<Vec<StudentRecord>, LoadError> {
    let rows: Vec<StudentRow> =
        serde_json::from_str(raw).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut seen = HashSet::new();
    let mut students = Vec::with_capacity(rows.len());

    for row in rows {
        let record = StudentRecord::from(row);
        if !seen.insert(record.student_id.to_string()) {
            return Err(LoadError::DuplicateId {
                id: record.student_id,
            });
        }
        students.push(record);
    }

    debug!(count = students.len(), "parsed student records");
    Ok(students)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(raw: &str) -> Result<Vec<StudentRecord>, LoadError> {
        parse_students(raw, Path::new("students.json"))
    }

    #[test]
    fn missing_numbers_default_to_zero() {
        let students = parse(
            r#"[{"student_id": 1, "name": "Ann", "assessment_score": 80, "focus": null}]"#,
        )
        .unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].assessment_score, 80.0);
        assert_eq!(students[0].focus, 0.0);
        assert_eq!(students[0].engagement_time, 0.0);
    }

    #[test]
    fn cluster_takes_precedence_over_persona() {
        let students = parse(
            r#"[
                {"student_id": 1, "name": "Ann", "cluster": 2, "persona": "Explorer"},
                {"student_id": 2, "name": "Bob", "persona": "Explorer"},
                {"student_id": 3, "name": "Cy", "cluster": null, "persona": null},
                {"student_id": 4, "name": "Di"}
            ]"#,
        )
        .unwrap();

        assert_eq!(students[0].persona_label(), "2");
        assert_eq!(students[1].persona_label(), "Explorer");
        assert_eq!(students[2].persona_label(), "-");
        assert_eq!(students[3].persona_label(), "-");
    }

    #[test]
    fn preserves_file_order_and_accepts_text_ids() {
        let students = parse(
            r#"[{"student_id": "S-9", "name": "Zed"}, {"student_id": "S-1", "name": "Amy"}]"#,
        )
        .unwrap();
        let names: Vec<&str> = students.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Zed", "Amy"]);
        assert_eq!(students[0].student_id, Key::Text("S-9".to_string()));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = parse(
            r#"[{"student_id": 7, "name": "Ann"}, {"student_id": 7, "name": "Bob"}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateId { .. }));
        assert_eq!(err.to_string(), "duplicate student_id '7' in student data");
    }

    #[test]
    fn rejects_records_without_name() {
        let err = parse(r#"[{"student_id": 1}]"#).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn rejects_non_array_payload() {
        let err = parse(r#"{"student_id": 1, "name": "Ann"}"#).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"student_id": 1, "name": "Ann", "assessment_score": 80}}]"#
        )
        .unwrap();

        let students = load_students(file.path()).unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].name, "Ann");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_students(&dir.path().join("students.json")).unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(parse("[]").unwrap().is_empty());
    }

    #[test]
    fn rejects_number_and_text_ids_that_display_alike() {
        let err = parse(
            r#"[{"student_id": 1, "name": "Ann"}, {"student_id": "1", "name": "Bob"}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateId { .. }));
    }

    #[test]
    fn malformed_file_error_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = load_students(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
        assert!(err
            .to_string()
            .contains(&file.path().display().to_string()));
    }
}
