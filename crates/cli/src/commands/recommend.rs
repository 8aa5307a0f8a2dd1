use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Args;
use serde::Serialize;
use simfit_agent::{generator_from_config, transcribe_with_config};
use simfit_catalog::source_from_config;
use simfit_core::chrono::Utc;
use simfit_core::config::{AppConfig, LlmConfig, LoadOptions};
use simfit_core::domain::{FeatureTag, Lifestyle, PreFilter, Priority, UnknownTag, UserProfile};
use simfit_core::errors::ApplicationError;
use simfit_core::explanation::{PlanExplanation, ProfileSummary, TopAnalysis};
use simfit_core::label::MatchLevel;
use simfit_core::pipeline::{PlanFilters, RelaxationStage, SortMode};
use simfit_core::recommend::{EnrichedPlan, PlanCategory, RecommendationSession};
use simfit_core::rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use super::{config_failure, current_thread_runtime, CommandResult};

const COMMAND: &str = "recommend";

#[derive(Debug, Clone, Default, Args)]
pub struct RecommendArgs {
    #[arg(long, help = "How you use your phone, in your own words")]
    pub description: Option<String>,
    #[arg(
        long,
        value_name = "FILE",
        help = "Spoken description (.wav or .mp3) transcribed by the configured model"
    )]
    pub description_audio: Option<PathBuf>,
    #[arg(long, help = "Monthly budget in GBP; zero or less means no budget")]
    pub budget: Option<String>,
    #[arg(long, help = "everyday|budget|power|remote|travel|streamer|social|other")]
    pub lifestyle: Option<String>,
    #[arg(long = "priority", help = "Priority key or phrase (repeatable)")]
    pub priorities: Vec<String>,
    #[arg(long = "feature", help = "Feature tag such as DATA_ROLLOVER (repeatable)")]
    pub features: Vec<String>,
    #[arg(long, help = "Contract pre-filter: any|1-month|12-months|24-months")]
    pub pre_contract: Option<String>,
    #[arg(long, help = "Data pre-filter: any|light|moderate|heavy|unlimited")]
    pub pre_data: Option<String>,
    #[arg(long, help = "Roaming pre-filter: any|eu|global")]
    pub pre_roaming: Option<String>,
    #[arg(long, help = "Sort mode; defaults to the lifestyle's first tab")]
    pub sort: Option<String>,
    #[arg(long, help = "Price band: any|5-10|10-15|15-20|20-30|30+")]
    pub price: Option<String>,
    #[arg(long, help = "Data band filter")]
    pub data: Option<String>,
    #[arg(long, help = "Contract filter: any|1|12|24")]
    pub contract: Option<String>,
    #[arg(long, help = "Roaming filter")]
    pub roaming: Option<String>,
    #[arg(long, help = "Network filter: any|vodafone|o2|three|ee")]
    pub network: Option<String>,
    #[arg(long = "special", help = "Required special feature (repeatable)")]
    pub special_features: Vec<String>,
    #[arg(long, help = "Show at most this many plans")]
    pub limit: Option<usize>,
    #[arg(long, help = "Ask the configured LLM for a personal fit summary")]
    pub narrative: bool,
}

#[derive(Debug, Serialize)]
pub struct RecommendReport {
    pub command: &'static str,
    pub status: &'static str,
    pub correlation_id: String,
    pub catalog_size: usize,
    pub skipped_rows: usize,
    pub profile: ProfileSummary,
    pub analysis: TopAnalysis,
    pub sort: SortMode,
    pub filters: String,
    pub relaxation: RelaxationStage,
    pub was_relaxed: bool,
    pub is_empty: bool,
    pub matched: usize,
    pub plans: Vec<PlanReport>,
    pub narrative: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlanReport {
    pub id: String,
    pub provider: String,
    pub plan_name: String,
    pub network: String,
    pub monthly_price: Decimal,
    pub total: u8,
    pub label: &'static str,
    pub level: MatchLevel,
    pub sub_scores: SubScores,
    pub category: PlanCategory,
    pub explanation: PlanExplanation,
    pub features: Vec<String>,
    pub footnote: String,
    pub deal_url: String,
}

#[derive(Debug, Serialize)]
pub struct SubScores {
    pub price_fit: f64,
    pub data_fit: f64,
    pub roaming_fit: f64,
    pub reliability_fit: f64,
    pub contract_fit: f64,
    pub features_fit: f64,
    pub coverage_fit: f64,
    pub hotspot_fit: f64,
    pub budget_fit: f64,
}

impl From<&EnrichedPlan> for PlanReport {
    fn from(item: &EnrichedPlan) -> Self {
        let breakdown = &item.score.breakdown;
        Self {
            id: item.plan.id.0.clone(),
            provider: item.plan.provider.clone(),
            plan_name: item.plan.plan_name.clone(),
            network: item.plan.network.clone(),
            monthly_price: item.plan.monthly_price,
            total: item.score.total,
            label: item.label.label,
            level: item.label.level,
            sub_scores: SubScores {
                price_fit: breakdown.price_fit,
                data_fit: breakdown.data_fit,
                roaming_fit: breakdown.roaming_fit,
                reliability_fit: breakdown.reliability_fit,
                contract_fit: breakdown.contract_fit,
                features_fit: breakdown.features_fit,
                coverage_fit: breakdown.coverage_fit(),
                hotspot_fit: breakdown.hotspot_fit(),
                budget_fit: breakdown.budget_fit(),
            },
            category: item.category,
            explanation: item.explanation.clone(),
            features: item.features.clone(),
            footnote: item.footnote.clone(),
            deal_url: item.plan.deal_url.clone(),
        }
    }
}

pub fn run(options: &LoadOptions, args: &RecommendArgs) -> CommandResult {
    let correlation_id = Uuid::new_v4().to_string();
    let runtime = match current_thread_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    match runtime.block_on(execute(options, args, &correlation_id)) {
        Ok(report) => CommandResult::report(COMMAND, &report),
        Err(error) => CommandResult::from_application_error(COMMAND, error, &correlation_id),
    }
}

async fn execute(
    options: &LoadOptions,
    args: &RecommendArgs,
    correlation_id: &str,
) -> Result<RecommendReport, ApplicationError> {
    let mut profile = build_profile(args)?;
    let filters = build_filters(args)?;
    let sort = args.sort.as_deref().map(parse::<SortMode>).transpose()?;

    let mut options = options.clone();
    if args.narrative {
        options.overrides.llm_enabled = Some(true);
    }
    let config = AppConfig::load(options).map_err(config_failure)?;
    let source = source_from_config(&config.catalog)?;

    if let Some(path) = args.description_audio.as_deref() {
        let transcript = transcribe_with_config(&config.llm, path).await?;
        profile.description = append_description(&profile.description, &transcript);
    }

    info!(
        event_name = "cli.recommend.start",
        correlation_id,
        catalog_source = source.name(),
        profile_fingerprint = %profile.fingerprint().0,
        "building recommendations"
    );

    let session = RecommendationSession::start(
        source.as_ref(),
        profile,
        config.scoring_config(),
        Utc::now().date_naive(),
    )
    .await?;

    let sort = sort.unwrap_or_else(|| session.default_sort());
    let view = session.view(&filters, sort);
    let narrative =
        if args.narrative { narrative_for(&session, &config.llm).await } else { None };

    let limit = args.limit.unwrap_or(view.plans.len());
    Ok(RecommendReport {
        command: COMMAND,
        status: "ok",
        correlation_id: correlation_id.to_string(),
        catalog_size: session.catalog().len(),
        skipped_rows: session.skipped_rows(),
        profile: session.profile_summary(),
        analysis: session.top_analysis(&view),
        sort: view.sort,
        filters: view.filters_summary.clone(),
        relaxation: view.relaxation,
        was_relaxed: view.was_relaxed(),
        is_empty: view.is_empty(),
        matched: view.plans.len(),
        plans: view.plans.iter().take(limit).map(|item| PlanReport::from(*item)).collect(),
        narrative,
    })
}

async fn narrative_for(session: &RecommendationSession, llm: &LlmConfig) -> Option<String> {
    match generator_from_config(llm) {
        Ok(Some(generator)) => session.narrative(generator.as_ref()).await,
        Ok(None) => None,
        Err(error) => {
            warn!(
                event_name = "cli.narrative.unavailable",
                error = %format!("{error:#}"),
                "narrative generator could not be built; omitting narrative"
            );
            None
        }
    }
}

/// Typed and spoken descriptions are kept together, typed text first.
fn append_description(typed: &str, spoken: &str) -> String {
    match typed.trim() {
        "" => spoken.to_string(),
        typed => format!("{typed} {spoken}"),
    }
}

fn parse<T: FromStr<Err = UnknownTag>>(value: &str) -> Result<T, ApplicationError> {
    value.parse().map_err(|error: UnknownTag| ApplicationError::InvalidInput(error.to_string()))
}

fn parse_or_default<T>(value: Option<&str>) -> Result<T, ApplicationError>
where
    T: FromStr<Err = UnknownTag> + Default,
{
    value.map(parse).transpose().map(Option::unwrap_or_default)
}

fn parse_budget(value: &str) -> Result<Decimal, ApplicationError> {
    let trimmed = value.trim().trim_start_matches('£');
    Decimal::from_str(trimmed)
        .map_err(|_| ApplicationError::InvalidInput(format!("budget `{value}` is not a number")))
}

pub fn build_profile(args: &RecommendArgs) -> Result<UserProfile, ApplicationError> {
    let mut profile = UserProfile::new(args.description.clone().unwrap_or_default());
    if let Some(budget) = args.budget.as_deref() {
        profile = profile.with_budget(parse_budget(budget)?);
    }
    if let Some(lifestyle) = args.lifestyle.as_deref() {
        profile = profile.with_lifestyle(parse::<Lifestyle>(lifestyle)?);
    }

    let priorities = args
        .priorities
        .iter()
        .map(|value| parse::<Priority>(value))
        .collect::<Result<Vec<_>, _>>()?;
    profile = profile.with_priorities(priorities);

    for feature in &args.features {
        profile = profile.with_feature(parse::<FeatureTag>(feature)?);
    }

    let pre_filter = PreFilter {
        contract: parse_or_default(args.pre_contract.as_deref())?,
        data: parse_or_default(args.pre_data.as_deref())?,
        roaming: parse_or_default(args.pre_roaming.as_deref())?,
    };
    if pre_filter != PreFilter::default() {
        profile = profile.with_pre_filter(pre_filter);
    }
    Ok(profile)
}

pub fn build_filters(args: &RecommendArgs) -> Result<PlanFilters, ApplicationError> {
    Ok(PlanFilters {
        price: parse_or_default(args.price.as_deref())?,
        data: parse_or_default(args.data.as_deref())?,
        contract: parse_or_default(args.contract.as_deref())?,
        roaming: parse_or_default(args.roaming.as_deref())?,
        network: parse_or_default(args.network.as_deref())?,
        special_features: args
            .special_features
            .iter()
            .map(|value| parse(value))
            .collect::<Result<BTreeSet<_>, _>>()?,
    })
}
