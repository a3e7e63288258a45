//! Role and similarity endpoints.

use super::http_cache;
use super::state::{GuardedCohortRegistry, ServerState};
use crate::artifacts::{PlayerId, PlayerSeasonKey, SeasonId};
use crate::query::QueryError;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct CohortSummary {
    name: String,
    seasons: Vec<SeasonId>,
    loaded_seasons: usize,
    minutes_threshold: u32,
}

#[derive(Deserialize, Debug)]
struct SimilarParams {
    k: Option<usize>,
}

fn query_error_response(err: QueryError) -> Response {
    match err {
        QueryError::InvalidArgument(message) => (StatusCode::BAD_REQUEST, message).into_response(),
        // Details are already logged by the facade.
        QueryError::DataIntegrity(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Role artifacts failed an integrity check",
        )
            .into_response(),
    }
}

fn unknown_cohort(cohort: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("Unknown cohort {}", cohort)).into_response()
}

async fn list_cohorts(State(cohorts): State<GuardedCohortRegistry>) -> Response {
    let mut summaries = vec![];
    for queries in cohorts.iter() {
        let seasons = match queries.available_seasons() {
            Ok(seasons) => seasons,
            Err(err) => return query_error_response(err),
        };
        let minutes_threshold = match queries.minutes_threshold() {
            Ok(threshold) => threshold,
            Err(err) => return query_error_response(err),
        };
        summaries.push(CohortSummary {
            name: queries.cohort().to_string(),
            seasons,
            loaded_seasons: queries.loaded_season_count(),
            minutes_threshold,
        });
    }
    Json(summaries).into_response()
}

async fn get_role(
    State(cohorts): State<GuardedCohortRegistry>,
    Path((cohort, player_id, season_id)): Path<(String, PlayerId, SeasonId)>,
) -> Response {
    let Some(queries) = cohorts.get(&cohort) else {
        return unknown_cohort(&cohort);
    };
    match queries.get_role(PlayerSeasonKey::new(player_id, season_id)) {
        Ok(Some(assignment)) => Json(assignment).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => query_error_response(err),
    }
}

async fn get_similar(
    State(cohorts): State<GuardedCohortRegistry>,
    Path((cohort, player_id, season_id)): Path<(String, PlayerId, SeasonId)>,
    Query(params): Query<SimilarParams>,
) -> Response {
    let Some(queries) = cohorts.get(&cohort) else {
        return unknown_cohort(&cohort);
    };
    match queries.get_similar(PlayerSeasonKey::new(player_id, season_id), params.k) {
        Ok(similar) => Json(similar).into_response(),
        Err(err) => query_error_response(err),
    }
}

pub fn make_roles_routes(state: ServerState) -> Router {
    let player_routes: Router = Router::new()
        .route(
            "/v1/cohorts/{cohort}/players/{player_id}/seasons/{season_id}/role",
            get(get_role),
        )
        .route(
            "/v1/cohorts/{cohort}/players/{player_id}/seasons/{season_id}/similar",
            get(get_similar),
        )
        .layer(middleware::from_fn_with_state(
            state.config.content_cache_age_sec,
            http_cache,
        ))
        .with_state(state.clone());

    Router::new()
        .route("/v1/cohorts", get(list_cohorts))
        .with_state(state)
        .merge(player_routes)
}
