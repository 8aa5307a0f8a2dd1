use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{gigabytes, pounds};
use crate::domain::{HotspotPolicy, Lifestyle, Plan, Priority, RoamingType, UserProfile};

pub const MAX_BULLETS: usize = 3;
const MAX_USER_BULLETS: usize = 2;

/// Networks flagged for patchier rural signal when premium coverage matters.
const VALUE_NETWORKS: [&str; 3] = ["Three", "Smarty", "iD Mobile"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanExplanation {
    pub primary: String,
    pub tradeoff: Option<String>,
    pub bullets: Vec<String>,
}

struct Context<'a> {
    plan: &'a Plan,
    lifestyle: Option<Lifestyle>,
    budget: Option<Decimal>,
    needs_roaming: bool,
    needs_heavy_data: bool,
    needs_flexibility: bool,
}

impl<'a> Context<'a> {
    fn new(plan: &'a Plan, profile: &UserProfile) -> Self {
        let lifestyle = profile.lifestyle;
        Self {
            plan,
            lifestyle,
            budget: profile.budget.filter(|budget| *budget > Decimal::ZERO),
            needs_roaming: lifestyle == Some(Lifestyle::Travel)
                || profile.has(Priority::EuropeTravel),
            needs_heavy_data: matches!(
                lifestyle,
                Some(Lifestyle::Streamer | Lifestyle::Power | Lifestyle::Social)
            ) || profile.has(Priority::NeverRunOut),
            needs_flexibility: profile.has(Priority::NoContract),
        }
    }
}

/// Build the primary sentence, at most one trade-off, and up to three bullets.
pub fn explain(plan: &Plan, profile: &UserProfile) -> PlanExplanation {
    let context = Context::new(plan, profile);
    PlanExplanation {
        primary: primary_sentence(&context),
        tradeoff: tradeoff(&context),
        bullets: bullets(&context),
    }
}

fn primary_sentence(context: &Context<'_>) -> String {
    let plan = context.plan;
    match context.lifestyle {
        Some(Lifestyle::Budget) if plan.monthly_price <= Decimal::from(10) => {
            "For a Budget Focused user, this plan keeps monthly costs extremely low without \
             sacrificing essential connectivity."
                .to_string()
        }
        Some(Lifestyle::Budget) => "While not the cheapest on the market, this offers great \
                                    value for the specific features included."
            .to_string(),
        Some(Lifestyle::Travel) if plan.roaming_type != RoamingType::UkOnly => {
            "As a Frequent Traveller, the inclusive roaming in this plan is a major advantage \
             for your trips."
                .to_string()
        }
        Some(Lifestyle::Travel) => "This plan offers strong UK specs, though you'll need to pay \
                                    extra when you travel abroad."
            .to_string(),
        Some(Lifestyle::Streamer | Lifestyle::Power) => {
            let generous = plan.data_allowance_gb.map_or(true, |gb| gb > Decimal::from(100));
            if generous {
                "Perfect for heavy usage: this generous data allowance means you can stream and \
                 scroll without worry."
                    .to_string()
            } else {
                "A reliable network choice, though the data cap means you'll need to monitor \
                 usage during heavy streaming months."
                    .to_string()
            }
        }
        Some(Lifestyle::Remote) if plan.hotspot_policy != HotspotPolicy::NotAllowed => {
            "Ideal for Remote Work with hotspotting support, allowing you to get online with \
             your laptop anywhere."
                .to_string()
        }
        Some(Lifestyle::Remote) => "Good connectivity for your phone, but check the tethering \
                                    limits if you work from a laptop often."
            .to_string(),
        Some(Lifestyle::Social) => "This plan delivers the data and speed you need for social \
                                    apps like TikTok and Instagram."
            .to_string(),
        Some(Lifestyle::Everyday) if plan.contract_length_months == 1 => {
            "A flexible, no-commitment choice that gives you control to switch whenever you \
             want."
                .to_string()
        }
        Some(Lifestyle::Everyday) => format!(
            "A balanced, reliable choice on the {} network that covers all the basics well.",
            plan.network
        ),
        Some(Lifestyle::Other) | None => {
            format!("A solid option running on the {} network.", plan.network)
        }
    }
}

type TradeoffRule = fn(&Context<'_>) -> Option<String>;

/// Ordered candidates; the first match is the only trade-off surfaced.
const TRADEOFF_RULES: [TradeoffRule; 6] = [
    roaming_tradeoff,
    data_tradeoff,
    price_tradeoff,
    contract_tradeoff,
    network_tradeoff,
    speed_cap_tradeoff,
];

fn tradeoff(context: &Context<'_>) -> Option<String> {
    TRADEOFF_RULES.iter().find_map(|rule| rule(context)).or_else(|| {
        (context.plan.monthly_price > Decimal::from(25))
            .then(|| "Tradeoff: Higher monthly cost than average market rates.".to_string())
    })
}

fn roaming_tradeoff(context: &Context<'_>) -> Option<String> {
    (context.needs_roaming && !context.plan.eu_roaming_included)
        .then(|| "Tradeoff: Roaming is paid, so it's not ideal for frequent travel.".to_string())
}

fn data_tradeoff(context: &Context<'_>) -> Option<String> {
    match context.plan.data_allowance_gb {
        Some(gb) if context.needs_heavy_data && gb < Decimal::from(20) => Some(format!(
            "Tradeoff: {} might be tight for your heavy streaming needs.",
            gigabytes(gb)
        )),
        _ => None,
    }
}

fn price_tradeoff(context: &Context<'_>) -> Option<String> {
    let budget = context.budget?;
    let price = context.plan.monthly_price;
    let over_by_two = budget.checked_add(Decimal::TWO).is_some_and(|limit| price > limit);
    over_by_two.then(|| {
        format!(
            "Tradeoff: At {}, this is a bit above your {} target.",
            pounds(price),
            pounds(budget)
        )
    })
}

fn contract_tradeoff(context: &Context<'_>) -> Option<String> {
    let months = context.plan.contract_length_months;
    let wants_flexibility =
        context.needs_flexibility || context.lifestyle == Some(Lifestyle::Budget);
    (months > 1 && wants_flexibility).then(|| {
        format!("Tradeoff: Requires a {months}-month commitment, unlike rolling plans.")
    })
}

fn network_tradeoff(context: &Context<'_>) -> Option<String> {
    let on_value_network = VALUE_NETWORKS.iter().any(|network| context.plan.runs_on(network));
    (context.lifestyle == Some(Lifestyle::Remote) && on_value_network).then(|| {
        "Tradeoff: Rural signal may be less consistent than premium networks.".to_string()
    })
}

fn speed_cap_tradeoff(context: &Context<'_>) -> Option<String> {
    context.plan.speed_cap_mbps.filter(|cap| *cap > 0).map(|cap| {
        format!("Tradeoff: Speed is capped at {cap}Mbps (slower than full 5G).")
    })
}

fn user_bullets(context: &Context<'_>) -> Vec<String> {
    let plan = context.plan;
    let mut points = Vec::new();
    match context.lifestyle {
        Some(Lifestyle::Budget) => {
            if plan.monthly_price < Decimal::from(10) {
                points.push("Extremely low monthly cost".to_string());
            }
            if plan.is_rolling() {
                points.push("Cancel anytime flexibility".to_string());
            }
        }
        Some(Lifestyle::Travel) => {
            if plan.eu_roaming_included {
                points.push(match plan.eu_roaming_cap_gb.filter(|cap| *cap > Decimal::ZERO) {
                    Some(cap) => format!("EU Roaming (up to {})", gigabytes(cap)),
                    None => "Free EU Roaming included".to_string(),
                });
            }
            if plan.global_roaming_included {
                points.push("Global roaming destinations".to_string());
            }
        }
        Some(Lifestyle::Remote | Lifestyle::Power)
            if plan.hotspot_policy == HotspotPolicy::Unlimited =>
        {
            points.push("Unlimited hotspotting for devices".to_string());
        }
        _ if context.needs_heavy_data && plan.is_unlimited() => {
            points.push("Truly unlimited data".to_string());
        }
        _ => {}
    }
    points.truncate(MAX_USER_BULLETS);
    points
}

fn objective_bullets(plan: &Plan) -> Vec<String> {
    let mut points = Vec::new();
    if plan.includes_5g {
        points.push("5G ready".to_string());
    }
    if plan.has_no_credit_check() {
        points.push("No credit check".to_string());
    }
    if plan.has_data_rollover() {
        points.push("Data rollover".to_string());
    }
    if let Some(gb) = plan.data_allowance_gb.filter(|gb| *gb >= Decimal::from(50)) {
        points.push(format!("{} data allowance", gigabytes(gb)));
    }
    if plan.contract_length_months == 1 {
        points.push("1-month rolling plan".to_string());
    }
    if !plan.network.trim().is_empty() {
        points.push(format!("{} coverage", plan.network));
    }
    points
}

fn bullets(context: &Context<'_>) -> Vec<String> {
    let mut points = user_bullets(context);
    for point in objective_bullets(context.plan) {
        if points.len() >= MAX_BULLETS {
            break;
        }
        if !points.contains(&point) {
            points.push(point);
        }
    }
    points
}

/// Display feature list for a plan card.
pub fn feature_list(plan: &Plan) -> Vec<String> {
    let mut features = plan.key_perks.clone();
    if plan.includes_5g {
        features.push("5G Ready".to_string());
    }
    if plan.is_unlimited() {
        features.push("Unlimited Data".to_string());
    }
    if plan.eu_roaming_included {
        features.push(match plan.eu_roaming_cap_gb.filter(|cap| *cap > Decimal::ZERO) {
            Some(cap) => format!("EU Roaming ({} cap)", gigabytes(cap)),
            None => "Free EU Roaming".to_string(),
        });
    }
    if let Some(cap) = plan.speed_cap_mbps.filter(|cap| *cap > 0) {
        features.push(format!("Speed Cap: {cap}Mbps"));
    }
    features
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{explain, feature_list, MAX_BULLETS};
    use crate::domain::plan::fixtures;
    use crate::domain::{HotspotPolicy, Lifestyle, Plan, Priority, UserProfile};

    fn priced(plan: Plan, pounds: i64) -> Plan {
        Plan { monthly_price: Decimal::from(pounds), ..plan }
    }

    #[test]
    fn custom_profile_gets_generic_network_sentence() {
        let explanation = explain(&fixtures::plan("p"), &UserProfile::new("x"));
        assert_eq!(explanation.primary, "A solid option running on the O2 network.");
    }

    #[test]
    fn travel_primary_branches_on_roaming() {
        let profile = UserProfile::new("x").with_lifestyle(Lifestyle::Travel);
        let roaming = explain(&fixtures::plan("r"), &profile);
        let uk_only = explain(&fixtures::uk_only(fixtures::plan("u")), &profile);
        assert!(roaming.primary.starts_with("As a Frequent Traveller"));
        assert!(uk_only.primary.starts_with("This plan offers strong UK specs"));
        assert_eq!(
            uk_only.tradeoff.as_deref(),
            Some("Tradeoff: Roaming is paid, so it's not ideal for frequent travel.")
        );
    }

    #[test]
    fn roaming_tradeoff_wins_over_later_rules() {
        let profile = UserProfile::new("x")
            .with_lifestyle(Lifestyle::Travel)
            .with_priority(Priority::NeverRunOut)
            .with_budget(Decimal::from(5));
        let plan = fixtures::uk_only(fixtures::with_allowance(priced(fixtures::plan("r"), 30), Some(5)));
        let tradeoff = explain(&plan, &profile).tradeoff;
        assert_eq!(
            tradeoff.as_deref(),
            Some("Tradeoff: Roaming is paid, so it's not ideal for frequent travel.")
        );
    }

    #[test]
    fn price_tradeoff_needs_more_than_two_pounds_over() {
        let profile = UserProfile::new("x").with_budget(Decimal::from(10));
        let close = explain(&priced(fixtures::plan("c"), 12), &profile);
        let over = explain(&priced(fixtures::plan("o"), 13), &profile);
        assert_eq!(close.tradeoff, None);
        assert_eq!(
            over.tradeoff.as_deref(),
            Some("Tradeoff: At £13, this is a bit above your £10 target.")
        );
    }

    #[test]
    fn price_tradeoff_tolerates_extreme_budgets() {
        let huge = UserProfile::new("x").with_budget(Decimal::MAX);
        assert_eq!(explain(&fixtures::plan("h"), &huge).tradeoff, None);

        let tiny = UserProfile::new("x").with_budget(Decimal::new(1, 28));
        let tradeoff = explain(&priced(fixtures::plan("t"), 13), &tiny).tradeoff;
        let tradeoff = tradeoff.expect("tiny budget is exceeded");
        assert!(tradeoff.starts_with("Tradeoff: At £13, this is a bit above"), "{tradeoff}");
    }

    #[test]
    fn heavy_data_tradeoff_reports_allowance() {
        let profile = UserProfile::new("x").with_lifestyle(Lifestyle::Streamer);
        let plan = fixtures::with_allowance(fixtures::plan("s"), Some(12));
        assert_eq!(
            explain(&plan, &profile).tradeoff.as_deref(),
            Some("Tradeoff: 12GB might be tight for your heavy streaming needs.")
        );
    }

    #[test]
    fn contract_tradeoff_for_flexibility_seekers() {
        let profile = UserProfile::new("x").with_priority(Priority::NoContract);
        let plan = fixtures::fixed_term(fixtures::plan("f"), 24);
        assert_eq!(
            explain(&plan, &profile).tradeoff.as_deref(),
            Some("Tradeoff: Requires a 24-month commitment, unlike rolling plans.")
        );
    }

    #[test]
    fn network_caveat_only_for_remote_workers() {
        let mut plan = fixtures::plan("n");
        plan.network = "Three".to_string();
        plan.speed_cap_mbps = Some(10);
        let remote = UserProfile::new("x").with_lifestyle(Lifestyle::Remote);
        let everyday = UserProfile::new("x").with_lifestyle(Lifestyle::Everyday);
        assert_eq!(
            explain(&plan, &remote).tradeoff.as_deref(),
            Some("Tradeoff: Rural signal may be less consistent than premium networks.")
        );
        assert_eq!(
            explain(&plan, &everyday).tradeoff.as_deref(),
            Some("Tradeoff: Speed is capped at 10Mbps (slower than full 5G).")
        );
    }

    #[test]
    fn expensive_plan_falls_back_to_generic_cost_note() {
        let explanation = explain(&priced(fixtures::plan("e"), 30), &UserProfile::new("x"));
        assert_eq!(
            explanation.tradeoff.as_deref(),
            Some("Tradeoff: Higher monthly cost than average market rates.")
        );
    }

    #[test]
    fn no_tradeoff_is_absent_not_empty() {
        let explanation = explain(&fixtures::plan("ok"), &UserProfile::new("x"));
        assert_eq!(explanation.tradeoff, None);
    }

    #[test]
    fn bullets_mix_user_and_objective_points() {
        let profile = UserProfile::new("x").with_lifestyle(Lifestyle::Budget);
        let plan = fixtures::with_perks(priced(fixtures::plan("b"), 7));
        let explanation = explain(&plan, &profile);
        assert_eq!(
            explanation.bullets,
            vec!["Extremely low monthly cost", "Cancel anytime flexibility", "5G ready"]
        );
    }

    #[test]
    fn objective_bullets_follow_fixed_order() {
        let mut plan = fixtures::with_perks(fixtures::with_allowance(fixtures::plan("o"), Some(60)));
        plan.includes_5g = false;
        let explanation = explain(&plan, &UserProfile::new("x"));
        assert_eq!(explanation.bullets, vec!["No credit check", "Data rollover", "60GB data allowance"]);
    }

    #[test]
    fn bullets_never_exceed_three() {
        let mut plan = fixtures::with_perks(fixtures::plan("g"));
        plan.global_roaming_included = true;
        plan.hotspot_policy = HotspotPolicy::Unlimited;
        for lifestyle in Lifestyle::ALL {
            let profile = UserProfile::new("x").with_lifestyle(lifestyle);
            assert!(explain(&plan, &profile).bullets.len() <= MAX_BULLETS);
        }
    }

    #[test]
    fn explanation_is_deterministic() {
        let profile = UserProfile::new("x")
            .with_lifestyle(Lifestyle::Remote)
            .with_priorities([Priority::Hotspot, Priority::BestCoverage]);
        let plan = fixtures::with_perks(fixtures::plan("d"));
        assert_eq!(explain(&plan, &profile), explain(&plan, &profile));
    }

    #[test]
    fn feature_list_adds_derived_entries() {
        let mut plan = fixtures::with_perks(fixtures::with_allowance(fixtures::plan("f"), None));
        plan.eu_roaming_cap_gb = Some(Decimal::from(15));
        plan.speed_cap_mbps = Some(10);
        assert_eq!(
            feature_list(&plan),
            vec![
                "No credit check",
                "Data Rollover",
                "5G Ready",
                "Unlimited Data",
                "EU Roaming (15GB cap)",
                "Speed Cap: 10Mbps",
            ]
        );
    }
}
