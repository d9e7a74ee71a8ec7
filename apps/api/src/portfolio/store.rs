//! Portfolio store: CSV-backed index of work samples keyed by tech stack.
//!
//! The CSV has two columns, `Techstack` and `Links`. Matching is lexical:
//! a skill matches an entry when its tokens appear in the entry's tech stack.

use std::collections::HashSet;
use std::io::Read;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::errors::AppError;

/// A work sample link returned for a skill query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioLink {
    pub tech_stack: String,
    pub link: String,
}

/// Skill → work sample lookup.
#[async_trait]
pub trait PortfolioIndex: Send + Sync {
    /// Idempotent warm-up. Safe to call on every request.
    async fn load(&self) -> Result<(), AppError>;

    async fn query_links(&self, skills: &[String]) -> Result<Vec<PortfolioLink>, AppError>;
}

#[derive(Debug, Deserialize)]
struct PortfolioRow {
    #[serde(rename = "Techstack", alias = "techstack", alias = "tech_stack")]
    tech_stack: String,
    #[serde(rename = "Links", alias = "links", alias = "link")]
    link: String,
}

#[derive(Debug, Clone)]
struct PortfolioEntry {
    tokens: HashSet<String>,
    link: PortfolioLink,
}

pub struct CsvPortfolio {
    path: PathBuf,
    links_per_skill: usize,
    entries: RwLock<Option<Vec<PortfolioEntry>>>,
}

impl CsvPortfolio {
    pub fn new(path: impl Into<PathBuf>, links_per_skill: usize) -> Self {
        Self {
            path: path.into(),
            links_per_skill,
            entries: RwLock::new(None),
        }
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.read().await.as_ref().map_or(0, Vec::len)
    }
}

#[async_trait]
impl PortfolioIndex for CsvPortfolio {
    async fn load(&self) -> Result<(), AppError> {
        if self.entries.read().await.is_some() {
            return Ok(());
        }

        let mut guard = self.entries.write().await;
        // another request may have loaded it while we waited for the lock
        if guard.is_some() {
            return Ok(());
        }

        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            AppError::Portfolio(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let entries = parse_portfolio(bytes.as_slice()).map_err(|e| {
            AppError::Portfolio(format!("invalid portfolio {}: {e}", self.path.display()))
        })?;

        info!(
            "Loaded {} portfolio entries from {}",
            entries.len(),
            self.path.display()
        );
        *guard = Some(entries);
        Ok(())
    }

    async fn query_links(&self, skills: &[String]) -> Result<Vec<PortfolioLink>, AppError> {
        let guard = self.entries.read().await;
        let entries = guard
            .as_ref()
            .ok_or_else(|| AppError::Portfolio("portfolio has not been loaded".to_string()))?;

        Ok(match_links(entries, skills, self.links_per_skill))
    }
}

fn parse_portfolio<R: Read>(reader: R) -> Result<Vec<PortfolioEntry>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut entries = Vec::new();

    for record in csv_reader.deserialize::<PortfolioRow>() {
        let row = record?;
        if row.link.is_empty() {
            continue;
        }
        entries.push(PortfolioEntry {
            tokens: tokenize(&row.tech_stack),
            link: PortfolioLink {
                tech_stack: row.tech_stack,
                link: row.link,
            },
        });
    }

    Ok(entries)
}

/// Lower-cased tokens; `+`, `#` and inner `.` survive so "C++" and "Node.js" stay intact.
fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|t| t.trim_matches('.').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Share of the skill's tokens present in the entry.
fn overlap_score(skill_tokens: &HashSet<String>, entry: &PortfolioEntry) -> f32 {
    if skill_tokens.is_empty() {
        return 0.0;
    }
    let hits = skill_tokens
        .iter()
        .filter(|t| entry.tokens.contains(*t))
        .count();
    hits as f32 / skill_tokens.len() as f32
}

/// Best `per_skill` links for each skill, in skill order, without duplicates.
fn match_links(entries: &[PortfolioEntry], skills: &[String], per_skill: usize) -> Vec<PortfolioLink> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for skill in skills {
        let skill_tokens = tokenize(skill);

        let mut ranked: Vec<(f32, &PortfolioEntry)> = entries
            .iter()
            .map(|entry| (overlap_score(&skill_tokens, entry), entry))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        // stable sort keeps file order among equal scores
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

        for (_, entry) in ranked.into_iter().take(per_skill) {
            if seen.insert(entry.link.link.clone()) {
                links.push(entry.link.clone());
            }
        }
    }

    links
}
