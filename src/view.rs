use std::cmp::Ordering;

use crate::models::{
    BarEntry, Key, Metric, Overview, RadarAxis, ScatterPoint, SortDirection, SortField,
    StudentRecord,
};

pub const BAR_CHART_LIMIT: usize = 30;

pub const CORRELATED_FEATURES: [&str; 3] = ["comprehension", "attention", "focus"];

/// Transient controls of a dashboard view. Every derived value is recomputed from this.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    pub search: String,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    pub selected: Option<Key>,
}

impl ViewState {
    pub fn new(students: &[StudentRecord]) -> Self {
        ViewState {
            selected: students.first().map(|s| s.student_id.clone()),
            ..ViewState::default()
        }
    }

    pub fn visible<'a>(&self, students: &'a [StudentRecord]) -> Vec<&'a StudentRecord> {
        let filtered = filter_students(students, &self.search);
        sort_students(filtered, self.sort_field, self.sort_direction)
    }

    pub fn toggle_direction(&mut self) {
        self.sort_direction = self.sort_direction.toggled();
    }

    pub fn select(&mut self, record: &StudentRecord) {
        self.selected = Some(record.student_id.clone());
    }

    /// Selects the visible row at `row` (0-based) and returns it.
    pub fn select_row<'a>(
        &mut self,
        students: &'a [StudentRecord],
        row: usize,
    ) -> Option<&'a StudentRecord> {
        let record = *self.visible(students).get(row)?;
        self.select(record);
        Some(record)
    }

    /// Selects by identifier from the full collection, ignoring the current filter.
    pub fn select_id<'a>(
        &mut self,
        students: &'a [StudentRecord],
        id: &str,
    ) -> Option<&'a StudentRecord> {
        let record = find_by_id(students, id)?;
        self.select(record);
        Some(record)
    }

    pub fn selected_record<'a>(&self, students: &'a [StudentRecord]) -> Option<&'a StudentRecord> {
        let selected = self.selected.as_ref()?;
        students.iter().find(|s| &s.student_id == selected)
    }
}

pub fn find_by_id<'a>(students: &'a [StudentRecord], id: &str) -> Option<&'a StudentRecord> {
    let id = id.trim();
    students.iter().find(|s| s.student_id.to_string() == id)
}

pub fn filter_students<'a>(students: &'a [StudentRecord], query: &str) -> Vec<&'a StudentRecord> {
    let needle = query.to_lowercase();
    students
        .iter()
        .filter(|s| s.name.to_lowercase().contains(&needle))
        .collect()
}

pub fn sort_students(
    mut rows: Vec<&StudentRecord>,
    field: SortField,
    direction: SortDirection,
) -> Vec<&StudentRecord> {
    rows.sort_by(|a, b| match direction {
        SortDirection::Ascending => compare_by(field, a, b),
        SortDirection::Descending => compare_by(field, b, a),
    });
    rows
}

fn compare_by(field: SortField, a: &StudentRecord, b: &StudentRecord) -> Ordering {
    match field {
        SortField::Id => a.student_id.cmp(&b.student_id),
        SortField::Name => a.name.cmp(&b.name),
        SortField::Score => a.assessment_score.total_cmp(&b.assessment_score),
        SortField::Persona => a.persona.cmp(&b.persona),
    }
}

pub fn average(students: &[StudentRecord], metric: Metric) -> i64 {
    if students.is_empty() {
        return 0;
    }
    let total: f64 = students.iter().map(|s| metric.value(s)).sum();
    // Halves round toward positive infinity.
    (total / students.len() as f64 + 0.5).floor() as i64
}

pub fn overview(students: &[StudentRecord]) -> Overview {
    Overview {
        avg_assessment: average(students, Metric::AssessmentScore),
        avg_comprehension: average(students, Metric::Comprehension),
        avg_attention: average(students, Metric::Attention),
        avg_focus: average(students, Metric::Focus),
        avg_retention: average(students, Metric::Retention),
        avg_engagement: average(students, Metric::EngagementTime),
    }
}

pub fn insight_lines(overview: &Overview) -> [String; 4] {
    [
        format!("Average assessment score: {}", overview.avg_assessment),
        format!(
            "Top features correlated with performance: {}",
            CORRELATED_FEATURES.join(", ")
        ),
        "Cluster sizes are available in the Jupyter notebook.".to_string(),
        "Try clicking a row in the table to see that student's profile.".to_string(),
    ]
}

pub fn scatter_points(students: &[StudentRecord]) -> Vec<ScatterPoint> {
    students
        .iter()
        .map(|s| ScatterPoint {
            attention: s.attention,
            assessment_score: s.assessment_score,
        })
        .collect()
}

pub fn bar_series(students: &[StudentRecord]) -> Vec<BarEntry<'_>> {
    students
        .iter()
        .take(BAR_CHART_LIMIT)
        .map(|s| BarEntry {
            name: &s.name,
            assessment_score: s.assessment_score,
        })
        .collect()
}

pub fn radar_profile(record: &StudentRecord) -> [RadarAxis; 5] {
    [
        RadarAxis {
            skill: "comprehension",
            value: record.comprehension,
        },
        RadarAxis {
            skill: "attention",
            value: record.attention,
        },
        RadarAxis {
            skill: "focus",
            value: record.focus,
        },
        RadarAxis {
            skill: "retention",
            value: record.retention,
        },
        RadarAxis {
            skill: "engagement",
            value: record.engagement_time,
        },
    ]
}

/// Largest axis value of a profile; the radius every axis is scaled against.
pub fn radar_scale(axes: &[RadarAxis]) -> f64 {
    axes.iter().map(|a| a.value).fold(0.0, f64::max)
}
