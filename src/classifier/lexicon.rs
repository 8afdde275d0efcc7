//! Built-in term-list model. A stand-in for a real ML model with the same
//! interface: per-category probabilities plus a hard `matched` verdict at
//! high confidence.

use std::sync::Arc;

use async_trait::async_trait;

use super::{CategoryScore, ModelLoader, ToxicityModel};

/// Probability at or above which a category counts as a hard match.
const MATCH_THRESHOLD: f64 = 0.8;

struct Category {
    label: &'static str,
    terms: &'static [&'static str],
}

// Terms with spaces are matched as phrases, the rest as whole tokens.
const CATEGORIES: &[Category] = &[
    Category {
        label: "insult",
        terms: &[
            "idiot", "idiots", "moron", "morons", "stupid", "dumb", "loser", "losers",
            "pathetic", "clown", "clowns", "jerk", "fool", "fools",
        ],
    },
    Category {
        label: "threat",
        terms: &[
            "kill you",
            "hurt you",
            "beat you up",
            "destroy you",
            "watch your back",
            "make you pay",
        ],
    },
    Category {
        label: "obscene",
        terms: &["damn", "crap", "wtf", "bs", "freaking"],
    },
    Category {
        label: "identity_attack",
        terms: &["your kind", "people like you", "subhuman", "go back where"],
    },
];

pub struct LexiconModel;

impl LexiconModel {
    pub fn new() -> Self {
        Self
    }

    fn score_category(category: &Category, tokens: &[String], joined: &str) -> CategoryScore {
        let mut hits = 0u32;
        for term in category.terms {
            if term.contains(' ') {
                if joined.contains(term) {
                    hits += 1;
                }
            } else {
                hits += tokens.iter().filter(|t| t.as_str() == *term).count() as u32;
            }
        }

        // Each hit shrinks the remaining doubt: 1 hit = 0.7, 2 = 0.91, ...
        let probability = if hits == 0 {
            0.0
        } else {
            round4(1.0 - 0.3f64.powi(hits as i32))
        };

        CategoryScore {
            label: category.label.to_string(),
            matched: probability >= MATCH_THRESHOLD,
            probability,
        }
    }
}

impl Default for LexiconModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToxicityModel for LexiconModel {
    async fn classify(&self, text: &str) -> anyhow::Result<Vec<CategoryScore>> {
        let tokens: Vec<String> = text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
            .collect();
        let joined = tokens.join(" ");

        Ok(CATEGORIES
            .iter()
            .map(|category| Self::score_category(category, &tokens, &joined))
            .collect())
    }

    fn name(&self) -> &str {
        "lexicon"
    }
}

/// Loader for the built-in model. Construction is trivial but still goes
/// through the loader seam so swapping in a heavyweight model is a one
/// line change in main.
pub struct LexiconLoader;

#[async_trait]
impl ModelLoader for LexiconLoader {
    async fn load(&self) -> anyhow::Result<Arc<dyn ToxicityModel>> {
        Ok(Arc::new(LexiconModel::new()))
    }
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}
