pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod explanation;
pub mod label;
pub mod narrative;
pub mod pipeline;
pub mod recommend;
pub mod scoring;

pub use catalog::{load_catalog, map_row, CatalogLoad, CatalogSource, RawPlanRow};
pub use domain::{
    FeatureTag, Lifestyle, Plan, PlanId, PreFilter, Priority, ProfileFingerprint, QuickNeeds,
    UserProfile,
};
pub use errors::{ApplicationError, CatalogError, CatalogRowError, InterfaceError, NarrativeError};
pub use explanation::{explain, PlanExplanation, ProfileSummary, TopAnalysis};
pub use label::{classify, MatchLabel, MatchLevel};
pub use narrative::{NarrativeGenerator, NarrativeRequest};
pub use pipeline::{PlanFilters, RelaxationStage, Scored, SortMode};
pub use recommend::{EnrichedPlan, PlanCategory, RecommendationSession, RecommendationView};
pub use scoring::{MatchScorer, ScoreBreakdown, ScoreResult, ScoringConfig};

pub use chrono;
pub use rust_decimal;
