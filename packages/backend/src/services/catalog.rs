//! Question catalog assembly: static seed questions, an optional CSV import
//! and the cache of AI-generated questions, merged with first-id-wins.

use std::io::Read;
use std::path::Path;

use neuro_algo::catalog::{merge_catalogs, seed_questions, topics};
use neuro_algo::{Difficulty, Question, QuestionType};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

const CSV_ESTIMATED_SECONDS: f64 = 600.0;
const DEFAULT_TOPIC: &str = "general";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot open catalog csv {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed catalog csv: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Default, Deserialize)]
struct CsvRow {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    difficulty: String,
    #[serde(default)]
    related_topics: String,
}

impl CsvRow {
    fn into_question(self, row_index: usize) -> Option<Question> {
        let title = self.title.trim();
        let description = self.description.trim();
        if title.is_empty() || description.is_empty() {
            return None;
        }

        let tags: Vec<String> = self
            .related_topics
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        let topic = tags
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_TOPIC.to_string());
        let subtopic = tags.get(1).cloned().unwrap_or_else(|| topic.clone());

        let id = match self.id.trim() {
            "" => format!("csv-row{row_index}"),
            raw => format!("csv-{raw}"),
        };

        Some(Question {
            id,
            topic,
            subtopic,
            difficulty: Difficulty::parse(&self.difficulty).unwrap_or(Difficulty::Medium),
            question_type: QuestionType::CodeWriting,
            title: title.to_string(),
            description: description.to_string(),
            starter_code: String::new(),
            solution_code: None,
            test_cases: Vec::new(),
            hints: Vec::new(),
            tags,
            estimated_time: CSV_ESTIMATED_SECONDS,
        })
    }
}

/// Parse questions from CSV with the header
/// `id,title,description,difficulty,acceptance_rate,url,companies,related_topics`.
/// Columns not used by the catalog are ignored; incomplete rows are skipped.
pub fn parse_csv_questions<R: Read>(reader: R) -> Result<Vec<Question>, CatalogError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut questions = Vec::new();
    let mut skipped = 0usize;
    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(err) if err.is_io_error() => return Err(CatalogError::Csv(err)),
            Err(err) => {
                debug!(row = index, error = %err, "skipping unreadable csv row");
                skipped += 1;
                continue;
            }
        };
        match row.into_question(index) {
            Some(question) => questions.push(question),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(skipped, "csv rows skipped");
    }
    Ok(questions)
}

pub fn load_csv_questions(path: &Path) -> Result<Vec<Question>, CatalogError> {
    let file = std::fs::File::open(path).map_err(|source| CatalogError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let questions = parse_csv_questions(file)?;
    info!(path = %path.display(), count = questions.len(), "csv catalog loaded");
    Ok(questions)
}

/// Merged catalog in source order
#[derive(Debug, Clone, Default)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

impl QuestionCatalog {
    pub fn assemble(csv: &[Question], ai: &[Question]) -> Self {
        let seed = seed_questions();
        let questions = merge_catalogs([seed.as_slice(), csv, ai]);
        Self { questions }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn topics(&self) -> Vec<String> {
        topics(&self.questions)
    }

    /// Append unless the id is already present. Returns whether it was added.
    pub fn insert(&mut self, question: Question) -> bool {
        if self.find(&question.id).is_some() {
            return false;
        }
        self.questions.push(question);
        true
    }
}
