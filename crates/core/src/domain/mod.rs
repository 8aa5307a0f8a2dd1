pub mod plan;
pub mod profile;

pub use plan::{
    ContractType, DataCategory, HotspotPolicy, Plan, PlanId, RoamingType, PERK_DATA_ROLLOVER,
    PERK_NO_CREDIT_CHECK,
};
pub use profile::{
    DataUsage, FeatureTag, Lifestyle, PlanFocus, PreFilter, PreFilterContract, PreFilterData,
    PreFilterRoaming, Priority, ProfileFingerprint, QuickNeeds, TravelFrequency, UnknownTag,
    UserProfile, GENERIC_DESCRIPTION,
};
