use std::collections::HashMap;

use itertools::Itertools;
use serde::Serialize;

use crate::{
    domain::{
        domain_name::clean_tracked_domain,
        localization::LocalizationConfig,
        serp::{SerpAnalysis, SerpCategory},
        tracking::TrackingConfig,
    },
    services::{
        google_fetcher::{FetchOutcome, SerpFetcher},
        localization::build_google_url,
        pacer::{RequestPacer, Sleeper},
        serp_extractor::SerpExtractor,
    },
};

/// Per-keyword result of one run: the filtered analysis, or the error that
/// took that keyword down. Failures stay data; they never abort the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KeywordOutcome {
    Analysis(SerpAnalysis),
    Failed { error: String },
}

impl KeywordOutcome {
    pub fn analysis(&self) -> Option<&SerpAnalysis> {
        match self {
            KeywordOutcome::Analysis(analysis) => Some(analysis),
            KeywordOutcome::Failed { .. } => None,
        }
    }
}

/// Drives fetch → extract → resolve → filter across a project's keywords.
///
/// Keywords are processed in consecutive batches, strictly sequentially
/// inside each batch. Google throttles bursty clients hard, so one in-flight
/// request per project is a design constraint here, not a missing
/// optimization.
pub struct RankTracker<F: SerpFetcher, S: Sleeper> {
    fetcher: F,
    extractor: SerpExtractor,
    pacer: RequestPacer<S>,
    batch_size: usize,
}

impl<F: SerpFetcher, S: Sleeper> RankTracker<F, S> {
    pub fn new(fetcher: F, pacer: RequestPacer<S>, batch_size: usize) -> Self {
        RankTracker {
            fetcher,
            extractor: SerpExtractor::new(),
            pacer,
            batch_size: batch_size.max(1),
        }
    }

    /// Checks every keyword and returns an outcome per keyword. The map
    /// always contains all input keywords; outcomes land in input order.
    pub async fn check_rankings(
        &self,
        domain: &str,
        keywords: &[String],
        localization: &LocalizationConfig,
        tracking: TrackingConfig,
    ) -> HashMap<String, KeywordOutcome> {
        let target = clean_tracked_domain(domain);
        let batch_count = keywords.len().div_ceil(self.batch_size);
        let mut results = HashMap::new();

        log::info!(
            "Starting rank check for {} keywords on domain {} ({}/{}, mode {})",
            keywords.len(),
            target,
            localization.country_code,
            localization.language_code,
            tracking.mode_str()
        );

        for (batch_index, batch) in keywords.chunks(self.batch_size).enumerate() {
            log::info!("Processing batch {}/{}", batch_index + 1, batch_count);

            for keyword in batch {
                let outcome = self
                    .check_keyword(keyword, &target, localization, tracking)
                    .await;
                log_keyword_outcome(keyword, &outcome);
                results.insert(keyword.clone(), outcome);
                self.pacer.wait_after_keyword().await;
            }

            if (batch_index + 1) * self.batch_size < keywords.len() {
                self.pacer.wait_between_batches().await;
            }
        }

        log::info!("Rank check completed for {} keywords", keywords.len());
        results
    }

    async fn check_keyword(
        &self,
        keyword: &str,
        target: &str,
        localization: &LocalizationConfig,
        tracking: TrackingConfig,
    ) -> KeywordOutcome {
        let url = build_google_url(keyword, localization);

        match self.fetcher.fetch_serp(&url).await {
            FetchOutcome::Failed(message) => KeywordOutcome::Failed { error: message },
            // An empty SERP is a valid observation, not an error: every
            // category list comes back empty.
            FetchOutcome::NoResults => {
                KeywordOutcome::Analysis(tracking.apply(self.extractor.analyze("", Some(target))))
            }
            FetchOutcome::Html(html) => {
                let analysis = self.extractor.analyze(&html, Some(target));
                KeywordOutcome::Analysis(tracking.apply(analysis))
            }
        }
    }
}

fn log_keyword_outcome(keyword: &str, outcome: &KeywordOutcome) {
    let analysis = match outcome {
        KeywordOutcome::Failed { error } => {
            log::error!("{}: {}", keyword, error);
            return;
        }
        KeywordOutcome::Analysis(analysis) => analysis,
    };

    let other_positions = analysis
        .target_positions
        .iter()
        .filter(|(category, _)| **category != SerpCategory::Organic)
        .map(|(category, found)| format!("{}: {}", category.as_str(), found.position))
        .join(", ");

    match (analysis.organic_position(), other_positions.is_empty()) {
        (Some(position), true) => log::info!("{}: organic position {}", keyword, position),
        (Some(position), false) => {
            log::info!(
                "{}: organic position {} (also {})",
                keyword,
                position,
                other_positions
            )
        }
        (None, true) => log::info!("{}: not found in organic results", keyword),
        (None, false) => {
            log::info!(
                "{}: not in organic results, found in {}",
                keyword,
                other_positions
            )
        }
    }
}
