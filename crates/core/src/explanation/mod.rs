//! Deterministic, template-driven copy
//!
//! Every sentence here is a pure function of its inputs: the same plan and
//! profile always produce byte-identical text.

mod plan;
mod summary;

pub use plan::{explain, feature_list, PlanExplanation, MAX_BULLETS};
pub use summary::{profile_summary, top_analysis, ProfileSummary, TopAnalysis};

use rust_decimal::Decimal;

/// `£12`, `£7.5`; trailing zeros dropped.
pub(crate) fn pounds(amount: Decimal) -> String {
    format!("£{}", amount.normalize())
}

pub(crate) fn gigabytes(amount: Decimal) -> String {
    format!("{}GB", amount.normalize())
}
