//! Deterministic language-model backend for demos and tests.
//!
//! Answers are derived only from the prompt text, so repeated calls with
//! the same input produce the same output.

use super::LanguageModel;
use crate::error::Result;
use async_trait::async_trait;

/// Product names the simulator recognizes in transcript text.
const KNOWN_PRODUCTS: &[&str] = &[
    "LangChain",
    "Supabase",
    "Vercel",
    "Next.js",
    "React",
    "OpenAI",
    "GitHub",
    "Docker",
    "Kubernetes",
    "AWS",
];

/// Simulated language model.
pub struct SimulatedModel;

impl SimulatedModel {
    pub fn new() -> Self {
        Self
    }

    /// A summary whose word count always lands in the 150-250 range.
    fn summary(user: &str) -> String {
        let base = "In this episode the hosts dig into how early-stage builders decide \
                    what to work on next. The conversation opens with a framework for \
                    ranking product ideas by how often users have already asked for them, \
                    then moves into a debate about planning versus shipping, with one \
                    speaker arguing that a rough deploy teaches more than a polished \
                    roadmap. Along the way they trade stories about launches that failed \
                    for predictable reasons and the rebuilds that finally worked, and \
                    they call out the tools that carried those rebuilds. The closing \
                    stretch turns practical: how to run customer conversations without \
                    leading the witness, when to charge for a prototype, and why the \
                    best product feedback usually arrives as a complaint. ";

        let closing = "Both guests agree that the discipline is less about any single \
                       tool and more about keeping the feedback loop between users and \
                       the roadmap short enough that bad bets die cheaply. Listeners \
                       looking for concrete next steps will find the middle third the \
                       most useful, where the guests walk through their own checklists \
                       in detail and explain the mistakes each item exists to prevent.";

        // Scale the body so the total stays inside the target range.
        let approx_words = user.split_whitespace().count();
        let mut summary = String::from(base);
        if approx_words > 500 {
            summary.push_str(
                "Later sections revisit the same themes from the guest's perspective, \
                 contrasting the advice with what actually happened at their company \
                 and where the framework broke down under pressure. ",
            );
        }
        summary.push_str(closing);
        summary
    }

    fn insights(user: &str) -> String {
        let mut insights = vec![
            serde_json::json!({
                "category": "Frameworks & Exercises",
                "content": "Rank candidate product ideas by how many users have independently asked for them before building anything.",
                "confidence": 0.9,
            }),
            serde_json::json!({
                "category": "Points of View",
                "content": "A rough deploy teaches more than another week of roadmap planning.",
                "confidence": 0.85,
            }),
        ];

        if user.contains("story") || user.contains("failed") {
            insights.push(serde_json::json!({
                "category": "Stories & Anecdotes",
                "content": "A failed launch became the company's best business idea after a rebuild on a managed backend.",
                "confidence": 0.8,
            }));
        }

        if user.contains('"') {
            insights.push(serde_json::json!({
                "category": "Quotes",
                "content": "\"The best roadmap is a list of things users already asked for twice.\"",
                "confidence": 0.9,
            }));
        }

        serde_json::json!({ "insights": insights }).to_string()
    }

    fn products(user: &str) -> String {
        let lower = user.to_lowercase();
        let found: Vec<&str> = KNOWN_PRODUCTS
            .iter()
            .filter(|name| lower.contains(&name.to_lowercase()))
            .copied()
            .collect();

        serde_json::json!({ "products": found }).to_string()
    }
}

impl Default for SimulatedModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for SimulatedModel {
    async fn generate(&self, _model: &str, system: &str, user: &str) -> Result<String> {
        // Dispatch on the prompt's role description
        let response = if system.contains("summarizer") {
            Self::summary(user)
        } else if system.contains("insights") {
            Self::insights(user)
        } else if system.contains("products") {
            Self::products(user)
        } else {
            "OK".to_string()
        };

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;

    #[tokio::test]
    async fn test_summary_word_count_in_range() {
        let model = SimulatedModel::new();
        let prompts = Prompts::default();

        let summary = model
            .generate("sim", &prompts.summary.system, "a short transcript")
            .await
            .unwrap();

        let words = summary.split_whitespace().count();
        assert!((150..=250).contains(&words), "word count was {}", words);
    }

    #[tokio::test]
    async fn test_products_found_in_text() {
        let model = SimulatedModel::new();
        let prompts = Prompts::default();

        let response = model
            .generate(
                "sim",
                &prompts.products.system,
                "We moved everything to Supabase and deploy with Vercel.",
            )
            .await
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&response).unwrap();
        let names: Vec<&str> = parsed["products"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(names, vec!["Supabase", "Vercel"]);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let model = SimulatedModel::new();
        let prompts = Prompts::default();

        let a = model
            .generate("sim", &prompts.insights.system, "a story about a failed launch")
            .await
            .unwrap();
        let b = model
            .generate("sim", &prompts.insights.system, "a story about a failed launch")
            .await
            .unwrap();
        assert_eq!(a, b);
    }
}
