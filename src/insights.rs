//! Insight extraction over segment groups.

use crate::config::{InsightSettings, Prompts};
use crate::error::{Result, VaultError};
use crate::grouping::SegmentGroup;
use crate::llm::{extract_json, LanguageModel};
use crate::model::{Insight, InsightCategory};
use serde::Deserialize;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Extracts categorized insights from segment groups.
pub struct InsightExtractor {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
    settings: InsightSettings,
}

#[derive(Debug, Deserialize)]
struct InsightResponse {
    #[serde(default)]
    insights: Vec<RawInsight>,
}

#[derive(Debug, Deserialize)]
struct RawInsight {
    category: String,
    content: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

fn default_confidence() -> f64 {
    0.8
}

impl InsightExtractor {
    pub fn new(model: Arc<dyn LanguageModel>, prompts: Prompts, settings: InsightSettings) -> Self {
        Self {
            model,
            prompts,
            settings,
        }
    }

    /// Extract insights from one segment group.
    ///
    /// Each insight is anchored to the group's time range. Entries with
    /// unknown categories or empty content are dropped.
    #[instrument(skip(self, group), fields(group = group.index))]
    pub async fn extract(&self, episode_id: &str, group: &SegmentGroup) -> Result<Vec<Insight>> {
        if group.segments.is_empty() {
            return Ok(Vec::new());
        }

        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), group.transcript_text());

        let system = Prompts::render(&self.prompts.insights.system, &vars);
        let user = Prompts::render(&self.prompts.insights.user, &vars);

        let response = self
            .model
            .generate(&self.settings.model, &system, &user)
            .await?;

        let json_str = extract_json(&response).ok_or_else(|| {
            VaultError::GenerationFailed(format!(
                "No JSON in insight response: {}",
                &response[..response.len().min(200)]
            ))
        })?;

        let parsed: InsightResponse = serde_json::from_str(json_str).map_err(|e| {
            VaultError::GenerationFailed(format!("Failed to parse insight response: {}", e))
        })?;

        let mut insights = Vec::new();
        for raw in parsed.insights {
            let Some(category) = InsightCategory::parse_label(&raw.category) else {
                warn!("Dropping insight with unknown category: {}", raw.category);
                continue;
            };

            let content = raw.content.trim().to_string();
            if content.is_empty() {
                continue;
            }

            insights.push(Insight::new(
                episode_id.to_string(),
                category,
                content,
                raw.confidence.clamp(0.0, 1.0),
                group.start_seconds(),
                group.end_seconds(),
            ));
        }

        debug!("Extracted {} insights from group {}", insights.len(), group.index);
        Ok(insights)
    }
}

/// Drop insights whose (category, content) pair is already present.
///
/// Re-running extraction over an unchanged group yields identical pairs,
/// so this makes persistence idempotent.
pub fn dedupe_insights(existing: &[Insight], new: Vec<Insight>) -> Vec<Insight> {
    let mut seen: HashSet<(InsightCategory, String)> = existing
        .iter()
        .map(|i| (i.category, i.content.clone()))
        .collect();

    new.into_iter()
        .filter(|i| seen.insert((i.category, i.content.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::SimulatedModel;
    use crate::model::Segment;

    fn group_from_text(text: &str) -> SegmentGroup {
        SegmentGroup {
            segments: vec![Segment {
                id: "s0".to_string(),
                episode_id: "e1".to_string(),
                start_seconds: 0.0,
                end_seconds: 60.0,
                raw_text: text.to_string(),
                display_text: text.to_string(),
                speaker: "Speaker A".to_string(),
                confidence: 0.9,
                position: 0,
            }],
            index: 0,
        }
    }

    fn extractor() -> InsightExtractor {
        InsightExtractor::new(
            Arc::new(SimulatedModel::new()),
            Prompts::default(),
            InsightSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_extract_anchors_to_group_range() {
        let group = group_from_text("a story about a failed launch, \"quoted wisdom\"");
        let insights = extractor().extract("e1", &group).await.unwrap();

        assert!(!insights.is_empty());
        for insight in &insights {
            assert_eq!(insight.episode_id, "e1");
            assert!((insight.start_seconds - 0.0).abs() < f64::EPSILON);
            assert!((insight.end_seconds - 60.0).abs() < f64::EPSILON);
        }

        // Simulated output spans multiple categories
        let categories: HashSet<InsightCategory> =
            insights.iter().map(|i| i.category).collect();
        assert!(categories.len() >= 2);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent_after_dedupe() {
        let group = group_from_text("a story about a failed launch");
        let ex = extractor();

        let first = ex.extract("e1", &group).await.unwrap();
        let second = ex.extract("e1", &group).await.unwrap();

        let added = dedupe_insights(&first, second);
        assert!(added.is_empty());
    }

    #[test]
    fn test_dedupe_keeps_new_pairs() {
        let a = Insight::new(
            "e1".into(),
            InsightCategory::Quotes,
            "quote one".into(),
            0.9,
            0.0,
            10.0,
        );
        let b = Insight::new(
            "e1".into(),
            InsightCategory::Quotes,
            "quote two".into(),
            0.9,
            0.0,
            10.0,
        );
        let dup = Insight::new(
            "e1".into(),
            InsightCategory::Quotes,
            "quote one".into(),
            0.7,
            10.0,
            20.0,
        );

        let added = dedupe_insights(&[a], vec![b.clone(), dup]);
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].content, "quote two");
    }

    #[tokio::test]
    async fn test_empty_group() {
        let group = SegmentGroup {
            segments: vec![],
            index: 0,
        };
        let insights = extractor().extract("e1", &group).await.unwrap();
        assert!(insights.is_empty());
    }
}
