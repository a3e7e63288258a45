//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When the test artifacts change (players, seasons, roles), update only
//! this file and the fixture writer.

// ============================================================================
// Test Cohort
// ============================================================================

/// Name the test cohort is served under
pub const COHORT: &str = "strikers";

/// Season with three strikers and a neighbor table
pub const SEASON_1_ID: u32 = 317;

/// Earlier season, holds the cross-season neighbor
pub const SEASON_2_ID: u32 = 281;

/// Season directory whose cluster probabilities are missing
pub const BROKEN_SEASON_ID: u32 = 299;

/// Season with no directory at all
pub const UNPROCESSED_SEASON_ID: u32 = 330;

// ============================================================================
// Test Players
// ============================================================================

/// Clear Link-Up striker in season 317, confidence 0.73
pub const STRIKER_1_ID: u64 = 1001;
pub const STRIKER_1_NAME: &str = "Alpha Striker";

/// Hybrid striker in season 317, top probability 0.40
pub const STRIKER_2_ID: u64 = 1002;
pub const STRIKER_2_NAME: &str = "Beta Striker";

/// Pressing striker, only present in season 281
pub const STRIKER_3_ID: u64 = 1003;
pub const STRIKER_3_NAME: &str = "Gamma Striker";

/// Poacher in season 317, has no precomputed neighbors
pub const STRIKER_4_ID: u64 = 1004;
pub const STRIKER_4_NAME: &str = "Delta Striker";

/// Player that appears in no artifact
pub const UNKNOWN_PLAYER_ID: u64 = 4242;

// ============================================================================
// Test Roles
// ============================================================================

pub const ROLE_LINK_UP: &str = "Link-Up / Complete Striker";
pub const ROLE_PRESSING: &str = "Pressing Striker";
pub const ROLE_POACHER: &str = "Poacher";

pub const ROLE_LINK_UP_DESCRIPTION: &str =
    "Drops deep to connect play, strong passing and chance creation.";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Cache age the test server is configured with (seconds)
pub const CONTENT_CACHE_AGE_SEC: usize = 120;
