//! Prompt templates for Podvault.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub summary: SummaryPrompts,
    pub insights: InsightPrompts,
    pub products: ProductPrompts,
}


/// Prompts for episode summarization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub system: String,
    pub user: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a podcast summarizer. You write concise, engaging summaries of podcast episodes for an audience of software builders and founders.

Rules:
- Write between {{min_words}} and {{max_words}} words
- Cover the main themes and the most actionable takeaways
- Mention the speakers by their labels where it helps readability
- Plain prose, no headings or bullet points"#
                .to_string(),

            user: r#"Summarize this podcast transcript in {{min_words}}-{{max_words}} words:

{{transcript}}"#
                .to_string(),
        }
    }
}

/// Prompts for insight extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightPrompts {
    pub system: String,
    pub user: String,
}

impl Default for InsightPrompts {
    fn default() -> Self {
        Self {
            system: r#"You extract key insights from podcast transcripts for a searchable knowledge vault.

Each insight belongs to exactly one of these categories:
- Frameworks & Exercises: repeatable methods, mental models, exercises
- Points of View: strongly held opinions and contrarian takes
- Business Ideas: startup or product ideas discussed or implied
- Stories & Anecdotes: concrete stories with a lesson
- Quotes: memorable verbatim lines worth keeping
- Products: notable tools or products and what they are used for

Respond with a JSON object: {"insights": [{"category": "...", "content": "...", "confidence": 0.0-1.0}]}.
The "content" field is 1-2 sentences. Only include insights actually present in the transcript; an empty array is a valid answer."#
                .to_string(),

            user: r#"Extract insights from this transcript excerpt:

{{transcript}}"#
                .to_string(),
        }
    }
}

/// Prompts for product name extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductPrompts {
    pub system: String,
    pub user: String,
}

impl Default for ProductPrompts {
    fn default() -> Self {
        Self {
            system: r#"You identify named developer tools, platforms and products mentioned in podcast transcripts.

Rules:
- Only include real, named products (e.g. "LangChain", "Supabase", "Next.js")
- Do not include generic terms ("database", "the cloud"), companies discussed only as employers, or people
- Use the product's canonical spelling

Respond with a JSON object: {"products": ["Name", ...]}. An empty array is a valid answer."#
                .to_string(),

            user: r#"List the products mentioned in this transcript excerpt:

{{transcript}}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with an optional custom directory.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }

            let insights_path = custom_path.join("insights.toml");
            if insights_path.exists() {
                let content = std::fs::read_to_string(&insights_path)?;
                prompts.insights = toml::from_str(&content)?;
            }

            let products_path = custom_path.join("products.toml");
            if products_path.exists() {
                let content = std::fs::read_to_string(&products_path)?;
                prompts.products = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.insights.system.contains("Frameworks & Exercises"));
        assert!(prompts.summary.system.contains("{{min_words}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Summarize in {{min_words}}-{{max_words}} words.";
        let mut vars = std::collections::HashMap::new();
        vars.insert("min_words".to_string(), "150".to_string());
        vars.insert("max_words".to_string(), "250".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Summarize in 150-250 words.");
    }
}
