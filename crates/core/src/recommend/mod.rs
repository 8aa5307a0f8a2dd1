//! Recommendation orchestration
//!
//! A [`RecommendationSession`] owns the fetched catalog and the enriched list
//! for one profile. Filters and sort modes are applied over that list on
//! demand; only a profile change or a catalog refresh triggers a new scoring
//! pass.

mod enrich;

pub use enrich::{Alternative, EnrichedPlan, PlanCategory};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{load_catalog, CatalogSource};
use crate::domain::{Plan, ProfileFingerprint, UserProfile};
use crate::errors::CatalogError;
use crate::explanation::{profile_summary, top_analysis, ProfileSummary, TopAnalysis};
use crate::label::MatchLevel;
use crate::narrative::{NarrativeGenerator, NarrativeRequest};
use crate::pipeline::{self, PlanFilters, RelaxationStage, SortMode};
use crate::scoring::{MatchScorer, ScoringConfig};

/// One filter/sort pass over the enriched list.
#[derive(Debug, Serialize)]
pub struct RecommendationView<'a> {
    pub plans: Vec<&'a EnrichedPlan>,
    pub sort: SortMode,
    pub relaxation: RelaxationStage,
    pub filters_summary: String,
}

impl RecommendationView<'_> {
    pub fn was_relaxed(&self) -> bool {
        self.relaxation != RelaxationStage::Strict
    }

    /// Nothing matched even after relaxation. Not an error.
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn top(&self) -> Option<&EnrichedPlan> {
        self.plans.first().copied()
    }
}

#[derive(Debug)]
pub struct RecommendationSession {
    scorer: MatchScorer,
    catalog: Vec<Plan>,
    skipped_rows: usize,
    profile: UserProfile,
    fingerprint: ProfileFingerprint,
    enriched: Vec<EnrichedPlan>,
    scoring_passes: u64,
}

impl RecommendationSession {
    /// Fetch the catalog and enrich it for `profile`. A failed fetch is
    /// returned as-is; an empty catalog is a valid, empty session.
    pub async fn start(
        source: &dyn CatalogSource,
        profile: UserProfile,
        config: ScoringConfig,
        fetched_on: NaiveDate,
    ) -> Result<Self, CatalogError> {
        let load = load_catalog(source, fetched_on).await?;
        let mut session = Self::from_plans(load.plans, profile, config);
        session.skipped_rows = load.skipped.len();
        Ok(session)
    }

    /// Build a session over an already-mapped catalog.
    pub fn from_plans(plans: Vec<Plan>, profile: UserProfile, config: ScoringConfig) -> Self {
        let fingerprint = profile.fingerprint();
        let mut session = Self {
            scorer: MatchScorer::with_config(config),
            catalog: plans,
            skipped_rows: 0,
            profile,
            fingerprint,
            enriched: Vec::new(),
            scoring_passes: 0,
        };
        session.rescore();
        session
    }

    /// Re-fetch and re-enrich. On failure the previous catalog stays in place.
    pub async fn refresh_catalog(
        &mut self,
        source: &dyn CatalogSource,
        fetched_on: NaiveDate,
    ) -> Result<(), CatalogError> {
        let load = load_catalog(source, fetched_on).await?;
        self.catalog = load.plans;
        self.skipped_rows = load.skipped.len();
        self.rescore();
        Ok(())
    }

    /// Swap the profile. Returns whether a scoring pass ran; an equal profile
    /// keeps the cached list.
    pub fn update_profile(&mut self, profile: UserProfile) -> bool {
        let fingerprint = profile.fingerprint();
        if fingerprint == self.fingerprint {
            return false;
        }
        self.profile = profile;
        self.fingerprint = fingerprint;
        self.rescore();
        true
    }

    fn rescore(&mut self) {
        self.enriched = enrich::enrich(&self.catalog, &self.profile, &self.scorer);
        self.scoring_passes += 1;
        info!(
            event_name = "recommend.enrich.completed",
            profile_fingerprint = %self.fingerprint.0,
            plans = self.enriched.len(),
            scoring_pass = self.scoring_passes,
            "enriched plan catalog"
        );
    }

    /// Filter, relax and sort the cached list. Never re-scores.
    pub fn view(&self, filters: &PlanFilters, sort: SortMode) -> RecommendationView<'_> {
        let result = pipeline::apply(
            &self.enriched,
            filters,
            sort,
            self.scorer.config().weak_match_floor,
        );
        if result.was_relaxed() {
            info!(
                event_name = "recommend.filters.relaxed",
                stage = ?result.relaxation,
                plans = result.plans.len(),
                "strict filters matched nothing; relaxed"
            );
        }
        RecommendationView {
            plans: result.plans,
            sort,
            relaxation: result.relaxation,
            filters_summary: filters.summary(),
        }
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn fingerprint(&self) -> &ProfileFingerprint {
        &self.fingerprint
    }

    pub fn catalog(&self) -> &[Plan] {
        &self.catalog
    }

    pub fn enriched(&self) -> &[EnrichedPlan] {
        &self.enriched
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    pub fn scoring_config(&self) -> &ScoringConfig {
        self.scorer.config()
    }

    /// Number of full scoring passes since the session started.
    pub fn scoring_passes(&self) -> u64 {
        self.scoring_passes
    }

    /// Sort tab to open with for this profile.
    pub fn default_sort(&self) -> SortMode {
        SortMode::default_for(self.profile.lifestyle)
    }

    pub fn profile_summary(&self) -> ProfileSummary {
        profile_summary(&self.profile)
    }

    pub fn top_analysis(&self, view: &RecommendationView<'_>) -> TopAnalysis {
        let top = view.top();
        let band = top.map_or(MatchLevel::Cautious, |item| item.label.level);
        top_analysis(&self.profile, view.sort, top.map(|item| &item.plan), band)
    }

    /// Optional narrative. Generator failures are logged and yield `None`.
    pub async fn narrative(&self, generator: &dyn NarrativeGenerator) -> Option<String> {
        let request = NarrativeRequest::from_profile(&self.profile);
        match generator.generate(&request).await {
            Ok(text) => Some(text),
            Err(error) => {
                warn!(
                    event_name = "recommend.narrative.failed",
                    profile_fingerprint = %self.fingerprint.0,
                    error = %error,
                    "narrative generation failed; omitting narrative"
                );
                None
            }
        }
    }
}
