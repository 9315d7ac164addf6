use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::service::ServiceConfig;

/// Configuration for the users_votes module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsersVotesConfig {
    /// Page size used by the REST listing when the query omits one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "default_vote_cooldown", with = "humantime_serde")]
    pub vote_cooldown: Duration,
}

impl Default for UsersVotesConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            vote_cooldown: default_vote_cooldown(),
        }
    }
}

impl UsersVotesConfig {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            vote_cooldown: self.vote_cooldown,
        }
    }
}

fn default_page_size() -> u64 {
    10
}

fn default_vote_cooldown() -> Duration {
    Duration::from_secs(60 * 60)
}
