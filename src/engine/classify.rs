//! Keyword classifier used when no upstream classification is available.

use crate::models::{DevComplexity, Feature, FeatureClassification};

const RND_KEYWORDS: &[&str] = &[
    "research",
    "algorithm",
    "machine learning",
    "ai",
    "optimization",
    "real-time",
    "websocket",
    "blockchain",
    "performance",
    "scalability",
    "architecture",
    "proof of concept",
    "poc",
    "feasibility",
    "complex",
];

const UI_KEYWORDS: &[&str] = &[
    "ui",
    "ux",
    "interface",
    "dashboard",
    "form",
    "page",
    "screen",
    "button",
    "display",
    "view",
    "visualization",
    "chart",
    "graph",
    "modal",
    "dialog",
    "menu",
    "navigation",
    "user-facing",
    "frontend",
];

const DB_KEYWORDS: &[&str] = &[
    "database",
    "schema",
    "table",
    "model",
    "migration",
    "data structure",
    "entity",
    "relationship",
    "store",
    "persist",
    "save",
    "crud",
    "collection",
    "document",
    "sql",
    "nosql",
    "query",
];

const COMPLEX_KEYWORDS: &[&str] = &[
    "complex",
    "advanced",
    "sophisticated",
    "real-time",
    "distributed",
    "scalable",
];

const SIMPLE_KEYWORDS: &[&str] = &[
    "simple",
    "basic",
    "straightforward",
    "easy",
    "quick",
    "export",
    "utility",
];

/// Features mentioning these are routine enough that AI classification is skipped.
const ROUTINE_KEYWORDS: &[&str] = &[
    "export", "import", "csv", "json", "pdf", "print", "download", "upload",
];

const PLAIN_UI_KEYWORDS: &[&str] = &["dashboard", "form", "page", "screen", "button", "menu"];

const AMBIGUOUS_KEYWORDS: &[&str] = &[
    "algorithm",
    "optimization",
    "real-time",
    "machine learning",
    "ai",
    "distributed",
];

/// Descriptions shorter than this with plain UI vocabulary are not sent to the AI.
const SHORT_DESCRIPTION: usize = 100;

fn haystack(feature: &Feature) -> String {
    format!("{} {}", feature.name, feature.description).to_lowercase()
}

/// Short keywords ("ai", "ui", "poc") must match a whole word; longer ones
/// may match anywhere.
fn mentions(text: &str, keyword: &str) -> bool {
    if keyword.len() <= 3 {
        text.split(|c: char| !c.is_alphanumeric())
            .any(|word| word == keyword)
    } else {
        text.contains(keyword)
    }
}

fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| mentions(text, k))
}

/// Classify a feature from the words in its name and description.
pub fn keyword_classify(feature: &Feature) -> FeatureClassification {
    let text = haystack(feature);

    let dev_complexity = if mentions_any(&text, COMPLEX_KEYWORDS) {
        DevComplexity::Complex
    } else if mentions_any(&text, SIMPLE_KEYWORDS) {
        DevComplexity::Simple
    } else {
        DevComplexity::Medium
    };

    FeatureClassification {
        needs_rnd: mentions_any(&text, RND_KEYWORDS),
        needs_ui: mentions_any(&text, UI_KEYWORDS),
        needs_db: mentions_any(&text, DB_KEYWORDS),
        dev_complexity,
        reasoning: Some("Keyword-based analysis".to_string()),
    }
}

/// Whether a feature is unclear enough to be worth an AI classification call.
pub fn is_ambiguous(feature: &Feature) -> bool {
    let text = haystack(feature);

    if mentions_any(&text, ROUTINE_KEYWORDS) {
        return false;
    }
    if mentions_any(&text, PLAIN_UI_KEYWORDS) && feature.description.len() < SHORT_DESCRIPTION {
        return false;
    }
    mentions_any(&text, AMBIGUOUS_KEYWORDS)
}
