//! Opt-out filtering.

use std::collections::BTreeSet;
use std::sync::Arc;

use masscontact_common::{AppResult, OptOutMode};
use tracing::debug;

use crate::models::{Category, OPT_OUT_ALL, OptOutCriteria, RecipientSet};
use crate::traits::RecipientDirectory;

/// Computes which recipients must be excluded for a set of categories.
#[derive(Clone)]
pub struct OptOutFilter {
    mode: OptOutMode,
    directory: Arc<dyn RecipientDirectory>,
}

impl OptOutFilter {
    /// Create a new opt-out filter.
    #[must_use]
    pub fn new(mode: OptOutMode, directory: Arc<dyn RecipientDirectory>) -> Self {
        Self { mode, directory }
    }

    /// The configured mode.
    #[must_use]
    pub const fn mode(&self) -> OptOutMode {
        self.mode
    }

    /// Query criteria for `categories`, or `None` when opt-outs are ignored.
    #[must_use]
    pub fn criteria(&self, categories: &[Category]) -> Option<OptOutCriteria> {
        match self.mode {
            OptOutMode::Disabled => None,
            OptOutMode::Global => Some(OptOutCriteria::AnyValue),
            OptOutMode::PerCategory => {
                let mut values: BTreeSet<String> =
                    categories.iter().map(|c| c.id.clone()).collect();
                values.insert(OPT_OUT_ALL.to_string());
                Some(OptOutCriteria::OneOf(values))
            }
        }
    }

    /// Recipients opted out of any of `categories`.
    pub async fn opted_out(&self, categories: &[Category]) -> AppResult<RecipientSet> {
        let Some(criteria) = self.criteria(categories) else {
            return Ok(RecipientSet::new());
        };

        let opted_out = self.directory.find_opted_out(&criteria).await?;
        debug!(mode = ?self.mode, count = opted_out.len(), "Collected opted-out recipients");

        Ok(opted_out)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::InMemoryDirectory;

    fn directory() -> Arc<InMemoryDirectory> {
        let directory = InMemoryDirectory::new();
        directory.insert_active("subscribed", None);
        directory.insert_active("default", Some("0"));
        directory.insert_active("all", Some("1"));
        directory.insert_active("news_only", Some("news"));
        directory.insert_inactive("blocked", Some("1"));
        Arc::new(directory)
    }

    fn ids(set: &RecipientSet) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[tokio::test]
    async fn test_disabled_never_queries() {
        let directory = directory();
        let filter = OptOutFilter::new(OptOutMode::Disabled, directory.clone());

        let result = filter.opted_out(&[Category::new("news", "News")]).await.unwrap();

        assert!(result.is_empty());
        assert_eq!(directory.opt_out_queries(), 0);
    }

    #[tokio::test]
    async fn test_global_excludes_any_non_default_value() {
        let filter = OptOutFilter::new(OptOutMode::Global, directory());

        let for_news = filter.opted_out(&[Category::new("news", "News")]).await.unwrap();
        let for_sports = filter.opted_out(&[Category::new("sports", "Sports")]).await.unwrap();

        assert_eq!(ids(&for_news), vec!["all", "news_only"]);
        assert_eq!(for_news, for_sports);
    }

    #[tokio::test]
    async fn test_per_category_only_matches_targeted_category() {
        let filter = OptOutFilter::new(OptOutMode::PerCategory, directory());

        let for_news = filter.opted_out(&[Category::new("news", "News")]).await.unwrap();
        let for_sports = filter.opted_out(&[Category::new("sports", "Sports")]).await.unwrap();

        assert_eq!(ids(&for_news), vec!["all", "news_only"]);
        assert_eq!(ids(&for_sports), vec!["all"]);
    }

    #[tokio::test]
    async fn test_per_category_without_categories_matches_sentinel() {
        let filter = OptOutFilter::new(OptOutMode::PerCategory, directory());

        let result = filter.opted_out(&[]).await.unwrap();

        assert_eq!(ids(&result), vec!["all"]);
    }
}
