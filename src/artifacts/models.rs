use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

pub type PlayerId = u64;
pub type SeasonId = u32;
pub type ClusterId = u32;

/// Identity of one player's sample within one season.
///
/// Ordering is `(player_id, season_id)`, which is the order used to break
/// similarity ties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerSeasonKey {
    pub player_id: PlayerId,
    pub season_id: SeasonId,
}

impl PlayerSeasonKey {
    pub fn new(player_id: PlayerId, season_id: SeasonId) -> Self {
        Self {
            player_id,
            season_id,
        }
    }
}

impl fmt::Display for PlayerSeasonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {} season {}", self.player_id, self.season_id)
    }
}

/// Reduced-space style vector of a player-season.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StyleEmbedding(Vec<f64>);

impl StyleEmbedding {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn dims(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Probability of each latent style cluster for one player-season.
///
/// Construct through [`super::validation::validate_posterior`] so that the
/// distribution invariants hold for every instance handed out by a store.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClusterPosterior {
    probabilities: BTreeMap<ClusterId, f64>,
}

impl ClusterPosterior {
    pub(super) fn from_validated(probabilities: BTreeMap<ClusterId, f64>) -> Self {
        Self { probabilities }
    }

    /// Iterates `(cluster, probability)` in ascending cluster order.
    pub fn iter(&self) -> impl Iterator<Item = (ClusterId, f64)> + '_ {
        self.probabilities.iter().map(|(c, p)| (*c, *p))
    }

    pub fn clusters(&self) -> impl Iterator<Item = ClusterId> + '_ {
        self.probabilities.keys().copied()
    }

    pub fn probability(&self, cluster: ClusterId) -> Option<f64> {
        self.probabilities.get(&cluster).copied()
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}

/// Cluster index to role name, for one season's model.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMapping(BTreeMap<ClusterId, String>);

impl RoleMapping {
    pub fn new(roles: BTreeMap<ClusterId, String>) -> Self {
        Self(roles)
    }

    pub fn role_for(&self, cluster: ClusterId) -> Option<&str> {
        self.0.get(&cluster).map(String::as_str)
    }

    pub fn contains(&self, cluster: ClusterId) -> bool {
        self.0.contains_key(&cluster)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClusterId, &str)> {
        self.0.iter().map(|(c, r)| (*c, r.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Free-text description of each role. Cosmetic, so lookups never fail.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDescriptions(HashMap<String, String>);

impl RoleDescriptions {
    pub fn new(descriptions: HashMap<String, String>) -> Self {
        Self(descriptions)
    }

    pub fn describe(&self, role: &str) -> &str {
        self.0.get(role).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Precomputed `source -> target` similarity edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NeighborEdge {
    pub source: PlayerSeasonKey,
    pub target: PlayerSeasonKey,
    pub similarity: f64,
}

/// Metadata carried next to the style vectors, used to label results.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PlayerInfo {
    pub player_name: Option<String>,
    pub team_id: Option<u64>,
    pub team_name: Option<String>,
    pub minutes: Option<u32>,
}
