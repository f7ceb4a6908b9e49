use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Identifier or label value as it appears in the dataset: a JSON number or string.
///
/// Numbers compare numerically and order before text; text compares by code point.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Number(f64),
    Text(String),
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Key::Number(a), Key::Number(b)) => a.total_cmp(b),
            (Key::Text(a), Key::Text(b)) => a.cmp(b),
            (Key::Number(_), Key::Text(_)) => Ordering::Less,
            (Key::Text(_), Key::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Number(value) => f.write_str(&format_number(*value)),
            Key::Text(value) => f.write_str(value),
        }
    }
}

/// Formats a dataset number, dropping the fractional part when it is integral.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    pub student_id: Key,
    pub name: String,
    pub assessment_score: f64,
    pub comprehension: f64,
    pub attention: f64,
    pub focus: f64,
    pub retention: f64,
    pub engagement_time: f64,
    /// `cluster` when present, otherwise `persona`.
    pub persona: Option<Key>,
}

impl StudentRecord {
    pub fn persona_label(&self) -> String {
        self.persona
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    AssessmentScore,
    Comprehension,
    Attention,
    Focus,
    Retention,
    EngagementTime,
}

impl Metric {
    pub fn value(self, record: &StudentRecord) -> f64 {
        match self {
            Metric::AssessmentScore => record.assessment_score,
            Metric::Comprehension => record.comprehension,
            Metric::Attention => record.attention,
            Metric::Focus => record.focus,
            Metric::Retention => record.retention,
            Metric::EngagementTime => record.engagement_time,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Id,
    Name,
    Score,
    Persona,
}

impl SortField {
    pub fn label(self) -> &'static str {
        match self {
            SortField::Id => "ID",
            SortField::Name => "Name",
            SortField::Score => "Score",
            SortField::Persona => "Persona",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "id" | "student_id" => Ok(SortField::Id),
            "name" => Ok(SortField::Name),
            "score" | "assessment_score" => Ok(SortField::Score),
            "persona" | "cluster" => Ok(SortField::Persona),
            other => Err(format!(
                "unknown sort field '{other}' (expected id, name, score or persona)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortDirection::Ascending => "Asc",
            SortDirection::Descending => "Desc",
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "⬆",
            SortDirection::Descending => "⬇",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Overview {
    pub avg_assessment: i64,
    pub avg_comprehension: i64,
    pub avg_attention: i64,
    pub avg_focus: i64,
    pub avg_retention: i64,
    pub avg_engagement: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadarAxis {
    pub skill: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub attention: f64,
    pub assessment_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarEntry<'a> {
    pub name: &'a str,
    pub assessment_score: f64,
}
