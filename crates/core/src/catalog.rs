//! Immutable question catalog: id lookup plus the derived topic set.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{Question, QuestionId};

/// Catalog metadata, carried verbatim into session snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMeta {
    #[serde(default)]
    pub start_question: Option<QuestionId>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Wire shape of the externally supplied catalog document.
///
/// Both fields degrade gracefully: a missing `questions` array yields an
/// empty catalog, a missing `meta` yields no defined entry point.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub meta: Option<CatalogMeta>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Immutable lookup of question records for one session.
///
/// Loaded once before any navigation call and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    meta: CatalogMeta,
    questions: HashMap<QuestionId, Question>,
    topics: Vec<String>,
}

impl Catalog {
    /// Builds a catalog from a parsed document.
    ///
    /// Duplicate question ids silently overwrite the earlier entry; the
    /// catalog is treated as externally curated and is not validated here.
    /// Topics are the distinct non-empty categories, sorted.
    #[must_use]
    pub fn load(doc: CatalogDocument) -> Self {
        let mut topics: Vec<String> = Vec::new();
        for question in &doc.questions {
            if !question.category.is_empty() && !topics.contains(&question.category) {
                topics.push(question.category.clone());
            }
        }
        topics.sort();

        let questions = doc
            .questions
            .into_iter()
            .map(|q| (q.id.clone(), q))
            .collect();

        Self {
            meta: doc.meta.unwrap_or_default(),
            questions,
            topics,
        }
    }

    /// Parses and loads a catalog from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if the document is not valid JSON of
    /// the expected shape.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let doc: CatalogDocument = serde_json::from_str(json)?;
        Ok(Self::load(doc))
    }

    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.get(id)
    }

    #[must_use]
    pub fn meta(&self) -> &CatalogMeta {
        &self.meta
    }

    /// Entry question defined by the catalog, if any.
    #[must_use]
    pub fn start_question(&self) -> Option<&QuestionId> {
        self.meta.start_question.as_ref()
    }

    /// Distinct non-empty categories, lexicographically sorted.
    #[must_use]
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
