pub mod lexicon;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

/// Per-category verdict from the toxicity model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScore {
    pub label: String,
    pub matched: bool,
    pub probability: f64,
}

/// Full analysis of one piece of text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToxicityAnalysis {
    pub categories: Vec<CategoryScore>,
}

impl ToxicityAnalysis {
    pub fn has_match(&self) -> bool {
        self.categories.iter().any(|c| c.matched)
    }

    /// Highest probability across categories, 0.0 for an empty analysis.
    pub fn max_probability(&self) -> f64 {
        self.categories
            .iter()
            .map(|c| c.probability)
            .fold(0.0, f64::max)
    }
}

/// A toxicity model. Implementations own whatever weights or tables they
/// need; `classify` is called once per submission.
#[async_trait]
pub trait ToxicityModel: Send + Sync {
    async fn classify(&self, text: &str) -> anyhow::Result<Vec<CategoryScore>>;

    fn name(&self) -> &str;
}

/// Deferred model construction. Loading can be slow (weights from disk or
/// network), so it runs at most once, on first use.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self) -> anyhow::Result<Arc<dyn ToxicityModel>>;
}

/// Front door for toxicity analysis. Holds the model behind a `OnceCell`:
/// concurrent first callers share a single load, a failed load leaves the
/// cell empty so the next call retries, and a successful load is reused
/// for the life of the process.
pub struct Classifier {
    loader: Box<dyn ModelLoader>,
    model: OnceCell<Arc<dyn ToxicityModel>>,
}

impl Classifier {
    pub fn new(loader: impl ModelLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            model: OnceCell::new(),
        }
    }

    /// Classifier with an already constructed model. Used in tests.
    pub fn preloaded(model: Arc<dyn ToxicityModel>) -> Self {
        Self {
            loader: Box::new(PreloadedModel(model.clone())),
            model: OnceCell::new_with(Some(model)),
        }
    }

    pub async fn analyze(&self, text: &str) -> anyhow::Result<ToxicityAnalysis> {
        if text.trim().is_empty() {
            return Ok(ToxicityAnalysis::default());
        }

        let model = self
            .model
            .get_or_try_init(|| async {
                let model = self.loader.load().await?;
                tracing::info!("Toxicity model loaded: {}", model.name());
                Ok::<_, anyhow::Error>(model)
            })
            .await?;

        let categories = model.classify(text).await?;
        Ok(ToxicityAnalysis { categories })
    }
}

struct PreloadedModel(Arc<dyn ToxicityModel>);

#[async_trait]
impl ModelLoader for PreloadedModel {
    async fn load(&self) -> anyhow::Result<Arc<dyn ToxicityModel>> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FixedModel(Vec<CategoryScore>);

    #[async_trait]
    impl ToxicityModel for FixedModel {
        async fn classify(&self, _text: &str) -> anyhow::Result<Vec<CategoryScore>> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct CountingLoader {
        calls: Arc<AtomicUsize>,
        fail_first: AtomicBool,
    }

    #[async_trait]
    impl ModelLoader for CountingLoader {
        async fn load(&self) -> anyhow::Result<Arc<dyn ToxicityModel>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first.swap(false, Ordering::SeqCst) {
                anyhow::bail!("weights unavailable");
            }
            Ok(Arc::new(FixedModel(vec![])))
        }
    }

    fn score(label: &str, matched: bool, probability: f64) -> CategoryScore {
        CategoryScore {
            label: label.to_string(),
            matched,
            probability,
        }
    }

    #[test]
    fn empty_analysis_has_no_match_and_zero_probability() {
        let analysis = ToxicityAnalysis::default();
        assert!(!analysis.has_match());
        assert_eq!(analysis.max_probability(), 0.0);
    }

    #[test]
    fn max_probability_picks_largest() {
        let analysis = ToxicityAnalysis {
            categories: vec![
                score("insult", false, 0.42),
                score("threat", false, 0.91),
                score("obscene", false, 0.05),
            ],
        };
        assert_eq!(analysis.max_probability(), 0.91);
        assert!(!analysis.has_match());
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let classifier = Arc::new(Classifier::new(CountingLoader {
            calls: calls.clone(),
            fail_first: AtomicBool::new(false),
        }));

        let a = classifier.clone();
        let b = classifier.clone();
        let (ra, rb) = tokio::join!(a.analyze("first"), b.analyze("second"));
        ra.unwrap();
        rb.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Later calls reuse the loaded model.
        classifier.analyze("third").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_load_is_retried_on_next_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let classifier = Classifier::new(CountingLoader {
            calls: calls.clone(),
            fail_first: AtomicBool::new(true),
        });

        assert!(classifier.analyze("boom").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        classifier.analyze("ok now").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn blank_text_skips_the_model_entirely() {
        let calls = Arc::new(AtomicUsize::new(0));
        let classifier = Classifier::new(CountingLoader {
            calls: calls.clone(),
            fail_first: AtomicBool::new(false),
        });

        let analysis = classifier.analyze("   ").await.unwrap();
        assert!(analysis.categories.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn preloaded_classifier_never_loads() {
        let classifier =
            Classifier::preloaded(Arc::new(FixedModel(vec![score("insult", true, 0.99)])));
        let analysis = classifier.analyze("whatever").await.unwrap();
        assert!(analysis.has_match());
    }
}
