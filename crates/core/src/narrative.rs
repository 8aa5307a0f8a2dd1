//! Optional personal-fit narrative
//!
//! The generator is an outside collaborator. Its failure never reaches the
//! scored view; the orchestrator folds it into an absent narrative.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::UserProfile;
use crate::errors::NarrativeError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeRequest {
    pub description: String,
    /// Canonical priority phrases, in stable order.
    pub priorities: Vec<String>,
}

impl NarrativeRequest {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            description: profile.effective_description().to_string(),
            priorities: profile.priorities.iter().map(|p| p.phrase().to_string()).collect(),
        }
    }

    /// Priorities joined for prompts, `None` when there are none.
    pub fn priority_list(&self) -> String {
        if self.priorities.is_empty() {
            "None".to_string()
        } else {
            self.priorities.join(", ")
        }
    }
}

#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(&self, request: &NarrativeRequest) -> Result<String, NarrativeError>;
}
