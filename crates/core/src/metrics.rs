//! Derived summary statistics over the response ledger.
//!
//! `summarize` is a pure function recomputed from scratch on every request;
//! ledgers are small enough that caching would buy nothing but staleness
//! bugs. Entries reach this module already normalized by legacy migration,
//! so "graded" simply means a non-null numeric grade.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::Response;

/// Number of most recent graded answers the consistency measure looks at.
pub const CONSISTENCY_WINDOW: usize = 5;

/// Population std-dev below this is "highly consistent".
const HIGHLY_CONSISTENT_MAX: f64 = 0.4;
/// Population std-dev below this is "moderately consistent".
const MODERATELY_CONSISTENT_MAX: f64 = 0.8;

/// Topic used for graded entries whose topic never resolved.
const UNCATEGORIZED: &str = "Uncategorized";

//
// ─── TYPES ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsistencyLabel {
    #[serde(rename = "highly consistent")]
    HighlyConsistent,
    #[serde(rename = "moderately consistent")]
    ModeratelyConsistent,
    #[serde(rename = "variable")]
    Variable,
    #[serde(rename = "insufficient data")]
    InsufficientData,
}

impl fmt::Display for ConsistencyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ConsistencyLabel::HighlyConsistent => "highly consistent",
            ConsistencyLabel::ModeratelyConsistent => "moderately consistent",
            ConsistencyLabel::Variable => "variable",
            ConsistencyLabel::InsufficientData => "insufficient data",
        };
        write!(f, "{text}")
    }
}

/// Sliding-window consistency: std-dev of the most recent graded answers.
///
/// `std_dev` is `None` when fewer than two graded answers fall in the
/// window; the window size is always reported for transparency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consistency {
    pub window: usize,
    pub std_dev: Option<f64>,
    pub label: ConsistencyLabel,
}

/// Mean grade for one topic group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicAverage {
    pub topic: String,
    pub average: f64,
    pub count: usize,
}

/// Aggregate statistics for a summary view or exported report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Count of graded entries; ungraded legacy entries are excluded.
    pub total_questions: usize,
    pub average_score: Option<f64>,
    pub consistency: Consistency,
    /// Sorted lexicographically by topic name.
    pub topic_averages: Vec<TopicAverage>,
}

//
// ─── SUMMARIZE ────────────────────────────────────────────────────────────────
//

/// Computes summary statistics from the ledger's responses.
#[must_use]
pub fn summarize(responses: &[Response]) -> Metrics {
    let graded: Vec<&Response> = responses.iter().filter(|r| r.is_graded()).collect();
    let grades: Vec<f64> = graded.iter().filter_map(|r| r.grade).collect();

    let average_score = if grades.is_empty() {
        None
    } else {
        Some(grades.iter().sum::<f64>() / grades.len() as f64)
    };

    Metrics {
        total_questions: graded.len(),
        average_score,
        consistency: windowed_consistency(&grades),
        topic_averages: topic_averages(&graded),
    }
}

/// Std-dev over the last `CONSISTENCY_WINDOW` grades in ledger order.
///
/// The window covers recent answers only, so late-session drift reflects
/// current performance rather than the whole run.
fn windowed_consistency(grades: &[f64]) -> Consistency {
    let start = grades.len().saturating_sub(CONSISTENCY_WINDOW);
    let window = &grades[start..];

    if window.len() < 2 {
        return Consistency {
            window: CONSISTENCY_WINDOW,
            std_dev: None,
            label: ConsistencyLabel::InsufficientData,
        };
    }

    let mean = window.iter().sum::<f64>() / window.len() as f64;
    let variance =
        window.iter().map(|g| (g - mean).powi(2)).sum::<f64>() / window.len() as f64;
    let std_dev = variance.sqrt();

    let label = if std_dev < HIGHLY_CONSISTENT_MAX {
        ConsistencyLabel::HighlyConsistent
    } else if std_dev < MODERATELY_CONSISTENT_MAX {
        ConsistencyLabel::ModeratelyConsistent
    } else {
        ConsistencyLabel::Variable
    };

    Consistency {
        window: CONSISTENCY_WINDOW,
        std_dev: Some(std_dev),
        label,
    }
}

fn topic_averages(graded: &[&Response]) -> Vec<TopicAverage> {
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for response in graded {
        let Some(grade) = response.grade else { continue };
        let topic = response.topic.as_deref().unwrap_or(UNCATEGORIZED);
        let entry = groups.entry(topic).or_insert((0.0, 0));
        entry.0 += grade;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(topic, (sum, count))| TopicAverage {
            topic: topic.to_owned(),
            average: sum / count as f64,
            count,
        })
        .collect()
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
