use std::collections::HashMap;

use super::llm_client::LlmClient;
use crate::models::{ArticleLink, GlossaryEntry};
use crate::Result;

// ============================================================================
// GLOSSARY
// ============================================================================

/// Medical terms collected from articles. The first definition seen for a
/// term is kept; later ones are ignored.
#[derive(Debug, Default, Clone)]
pub struct Glossary {
    terms: HashMap<String, String>,
}

impl Glossary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the term was already known.
    pub fn add(&mut self, term: &str, definition: &str) -> bool {
        if self.terms.contains_key(term) {
            return false;
        }
        self.terms.insert(term.to_string(), definition.to_string());
        true
    }

    pub fn get(&self, term: &str) -> Option<&str> {
        self.terms.get(term).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Entries sorted by term.
    pub fn entries(&self) -> Vec<GlossaryEntry> {
        let mut entries: Vec<_> = self
            .terms
            .iter()
            .map(|(term, definition)| GlossaryEntry {
                term: term.clone(),
                definition: definition.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.term.cmp(&b.term));
        entries
    }

    /// Add every `term,definition` row of a model's CSV answer.
    pub fn ingest_csv(&mut self, csv: &str) -> usize {
        data_rows(csv)
            .into_iter()
            .filter(|row| self.add(&row[0], &row[1]))
            .count()
    }
}

// ============================================================================
// CSV
// ============================================================================

/// Split one CSV line, honouring double quotes and `""` escapes.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);

    fields.into_iter().map(|f| f.trim().to_string()).collect()
}

/// Rows after the single header row with at least two non-empty leading
/// columns. The first data row is kept.
/// Markdown code fences around the table are ignored.
fn data_rows(csv: &str) -> Vec<Vec<String>> {
    csv.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("```"))
        .skip(1)
        .map(split_csv_line)
        .filter(|row| row.len() >= 2 && !row[0].is_empty() && !row[1].is_empty())
        .collect()
}

pub fn parse_article_links(csv: &str) -> Vec<ArticleLink> {
    data_rows(csv)
        .into_iter()
        .map(|row| ArticleLink {
            website_name: row[0].clone(),
            url: row[1].clone(),
        })
        .collect()
}

// ============================================================================
// MODEL CALLS
// ============================================================================

/// Ask the model for the key terms of an article and add them to `glossary`.
/// Returns how many new terms were added.
pub async fn read_article(llm: &LlmClient, glossary: &mut Glossary, link: &str) -> Result<usize> {
    let prompt = format!(
        "Please read through this medical website: {} and create a short list of important \
         terms and their definitions. Return them in a csv format with two columns: Term, Definition.",
        link
    );
    let csv = llm.chat_completion(vec![LlmClient::user_message(&prompt)], None).await?;
    let added = glossary.ingest_csv(&csv);
    tracing::info!(link, added, total = glossary.len(), "glossary updated");
    Ok(added)
}

/// Ask the model for reputable pages about `topic`.
pub async fn find_articles(llm: &LlmClient, topic: &str) -> Result<Vec<ArticleLink>> {
    let prompt = format!(
        "Please provide a list of reputable medical websites where I can read about {}. \
         Return them in a csv format with two columns: Website Name, URL.",
        topic
    );
    let csv = llm.chat_completion(vec![LlmClient::user_message(&prompt)], None).await?;
    let links = parse_article_links(&csv);
    tracing::info!(topic, found = links.len(), "articles found");
    Ok(links)
}
