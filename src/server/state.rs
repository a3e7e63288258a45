use axum::extract::FromRef;

use crate::query::CohortRegistry;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedCohortRegistry = Arc<CohortRegistry>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub cohorts: GuardedCohortRegistry,
}

impl ServerState {
    pub fn new(config: ServerConfig, cohorts: GuardedCohortRegistry) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            cohorts,
        }
    }
}

impl FromRef<ServerState> for GuardedCohortRegistry {
    fn from_ref(input: &ServerState) -> Self {
        input.cohorts.clone()
    }
}
