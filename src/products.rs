//! Product mention extraction and name matching.
//!
//! Candidate names come from an LLM pass over each segment group. Matching
//! against the known product set is case-insensitive and tolerant of
//! punctuation and spacing via normalization; fuzzy merging is an explicit
//! opt-in, and an ambiguous fuzzy match creates a new entity instead of
//! silently merging.

use crate::config::{ProductSettings, Prompts};
use crate::error::{Result, VaultError};
use crate::grouping::SegmentGroup;
use crate::llm::{extract_json, LanguageModel};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Normalize a product name into its match key.
///
/// Lowercases and strips punctuation/whitespace, so "Next.js", "nextjs"
/// and "NEXT JS" all share one key.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Outcome of matching a candidate name against the known set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch {
    /// Matches an existing product, identified by its normalized name.
    Existing(String),
    /// No (unambiguous) match; create a new product.
    New,
}

/// Match a candidate against known normalized names.
///
/// Exact normalized match wins. With fuzzy matching enabled, a single
/// known name within edit distance 1 also matches; two or more candidates
/// at that distance is ambiguous and falls back to `New`.
pub fn match_name(candidate: &str, known: &[String], fuzzy: bool) -> NameMatch {
    let normalized = normalize_name(candidate);

    if known.iter().any(|k| *k == normalized) {
        return NameMatch::Existing(normalized);
    }

    if fuzzy {
        let near: Vec<&String> = known
            .iter()
            .filter(|k| levenshtein(k, &normalized) == 1)
            .collect();

        match near.as_slice() {
            [single] => return NameMatch::Existing((*single).clone()),
            [] => {}
            _ => {
                warn!(
                    "Ambiguous fuzzy match for '{}' ({} candidates), creating new product",
                    candidate,
                    near.len()
                );
            }
        }
    }

    NameMatch::New
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// A product mention recognized in one segment group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductMention {
    /// Display name as extracted.
    pub name: String,
    /// Normalized match key.
    pub normalized_name: String,
}

/// Extracts product mentions from segment groups.
pub struct ProductExtractor {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
    settings: ProductSettings,
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    #[serde(default)]
    products: Vec<String>,
}

impl ProductExtractor {
    pub fn new(model: Arc<dyn LanguageModel>, prompts: Prompts, settings: ProductSettings) -> Self {
        Self {
            model,
            prompts,
            settings,
        }
    }

    /// Extract product mentions from one segment group.
    ///
    /// `known_names` holds normalized names already in the registry, used
    /// to fold name variants into existing entities.
    #[instrument(skip(self, group, known_names), fields(group = group.index))]
    pub async fn extract(
        &self,
        group: &SegmentGroup,
        known_names: &[String],
    ) -> Result<Vec<ProductMention>> {
        if group.segments.is_empty() {
            return Ok(Vec::new());
        }

        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), group.transcript_text());

        let system = Prompts::render(&self.prompts.products.system, &vars);
        let user = Prompts::render(&self.prompts.products.user, &vars);

        let response = self
            .model
            .generate(&self.settings.model, &system, &user)
            .await?;

        let json_str = extract_json(&response).ok_or_else(|| {
            VaultError::GenerationFailed(format!(
                "No JSON in product response: {}",
                &response[..response.len().min(200)]
            ))
        })?;

        let parsed: ProductResponse = serde_json::from_str(json_str).map_err(|e| {
            VaultError::GenerationFailed(format!("Failed to parse product response: {}", e))
        })?;

        let mut mentions = Vec::new();
        for name in parsed.products {
            let name = name.trim().to_string();
            if name.is_empty() {
                continue;
            }

            let normalized_name = match match_name(&name, known_names, self.settings.fuzzy_matching)
            {
                NameMatch::Existing(key) => key,
                NameMatch::New => normalize_name(&name),
            };

            if normalized_name.is_empty() {
                continue;
            }

            mentions.push(ProductMention {
                name,
                normalized_name,
            });
        }

        debug!("Found {} product mentions in group {}", mentions.len(), group.index);
        Ok(mentions)
    }
}
