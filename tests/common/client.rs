//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per server endpoint.
//! When API routes change, update only this file.

use super::constants::*;
use reqwest::Response;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("Request failed")
    }

    // ========================================================================
    // Server Endpoints
    // ========================================================================

    pub async fn get_home(&self) -> Response {
        self.get("/").await
    }

    pub async fn list_cohorts(&self) -> Response {
        self.get("/v1/cohorts").await
    }

    // ========================================================================
    // Role Endpoints
    // ========================================================================

    pub async fn get_role(&self, cohort: &str, player_id: u64, season_id: u32) -> Response {
        self.get(&format!(
            "/v1/cohorts/{}/players/{}/seasons/{}/role",
            cohort, player_id, season_id
        ))
        .await
    }

    // ========================================================================
    // Similarity Endpoints
    // ========================================================================

    pub async fn get_similar(
        &self,
        cohort: &str,
        player_id: u64,
        season_id: u32,
        k: Option<usize>,
    ) -> Response {
        let mut path = format!(
            "/v1/cohorts/{}/players/{}/seasons/{}/similar",
            cohort, player_id, season_id
        );
        if let Some(k) = k {
            path.push_str(&format!("?k={}", k));
        }
        self.get(&path).await
    }
}
