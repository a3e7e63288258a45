use crate::artifacts::{
    ClusterId, ClusterPosterior, DataIntegrityError, IntegrityResult, PlayerSeasonKey,
    RoleDescriptions, RoleMapping,
};
use serde::Serialize;

/// Below this maximum posterior probability a player-season is hybrid.
/// Exactly the threshold is a primary role.
pub const HYBRID_THRESHOLD: f64 = 0.60;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleProbability {
    pub role: String,
    pub cluster: ClusterId,
    pub probability: f64,
}

/// Classification of one player-season. Every valid posterior yields a
/// role; `is_hybrid` only says no single cluster dominates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleAssignment {
    pub role: String,
    pub is_hybrid: bool,
    pub confidence: f64,
    /// Full posterior, most likely first.
    pub top_roles: Vec<RoleProbability>,
    pub tooltip: String,
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Turns a posterior into a role.
///
/// Argmax ties go to the lowest cluster index, and `top_roles` ties are
/// ordered the same way, so the result never depends on storage order.
/// The hybrid check uses the unrounded probability.
pub fn assign_role(
    key: PlayerSeasonKey,
    posterior: &ClusterPosterior,
    mapping: &RoleMapping,
    descriptions: &RoleDescriptions,
    hybrid_threshold: f64,
) -> IntegrityResult<RoleAssignment> {
    let mut entries: Vec<(ClusterId, f64)> = posterior.iter().collect();
    // Stable sort over ascending clusters keeps the lowest index first on ties.
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (top_cluster, p_max) =
        *entries
            .first()
            .ok_or_else(|| DataIntegrityError::MalformedPosterior {
                key,
                reason: "no cluster probabilities".to_string(),
            })?;

    let mut top_roles = Vec::with_capacity(entries.len());
    for (cluster, probability) in entries {
        let role = mapping
            .role_for(cluster)
            .ok_or(DataIntegrityError::UnmappedCluster {
                season_id: key.season_id,
                cluster,
                key: Some(key),
            })?;
        top_roles.push(RoleProbability {
            role: role.to_string(),
            cluster,
            probability: round3(probability),
        });
    }

    let role = top_roles
        .iter()
        .find(|entry| entry.cluster == top_cluster)
        .map(|entry| entry.role.clone())
        .unwrap_or_default();
    let tooltip = descriptions.describe(&role).to_string();

    Ok(RoleAssignment {
        is_hybrid: p_max < hybrid_threshold,
        confidence: round3(p_max),
        top_roles,
        tooltip,
        role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::InMemoryArtifactStore;
    use crate::artifacts::{ArtifactStore, PlayerInfo};
    use std::collections::{BTreeMap, HashMap};

    fn key() -> PlayerSeasonKey {
        PlayerSeasonKey::new(1001, 317)
    }

    fn mapping() -> RoleMapping {
        RoleMapping::new(BTreeMap::from([
            (0, "Poacher".to_string()),
            (1, "Pressing Striker".to_string()),
            (2, "Link-Up Striker".to_string()),
        ]))
    }

    fn descriptions() -> RoleDescriptions {
        RoleDescriptions::new(HashMap::from([(
            "Poacher".to_string(),
            "Focuses on box occupation and finishing, limited link play.".to_string(),
        )]))
    }

    // Posteriors are only constructible through validation, so go through a store.
    fn posterior(probabilities: &[(ClusterId, f64)]) -> ClusterPosterior {
        InMemoryArtifactStore::builder()
            .global_role_mapping(mapping())
            .embedding(key(), vec![0.0], PlayerInfo::default())
            .posterior(key(), probabilities.iter().copied())
            .build()
            .unwrap()
            .get_posterior(key())
            .unwrap()
            .unwrap()
    }

    fn assign(probabilities: &[(ClusterId, f64)]) -> RoleAssignment {
        assign_role(
            key(),
            &posterior(probabilities),
            &mapping(),
            &descriptions(),
            HYBRID_THRESHOLD,
        )
        .unwrap()
    }

    #[test]
    fn dominant_cluster_is_primary_role() {
        let assignment = assign(&[(0, 0.73), (1, 0.15), (2, 0.12)]);
        assert_eq!(assignment.role, "Poacher");
        assert!(!assignment.is_hybrid);
        assert_eq!(assignment.confidence, 0.73);
        let top: Vec<(&str, f64)> = assignment
            .top_roles
            .iter()
            .map(|r| (r.role.as_str(), r.probability))
            .collect();
        assert_eq!(
            top,
            vec![
                ("Poacher", 0.73),
                ("Pressing Striker", 0.15),
                ("Link-Up Striker", 0.12)
            ]
        );
        assert_eq!(
            assignment.tooltip,
            "Focuses on box occupation and finishing, limited link play."
        );
    }

    #[test]
    fn ambiguous_posterior_is_hybrid() {
        let assignment = assign(&[(0, 0.40), (1, 0.35), (2, 0.25)]);
        assert!(assignment.is_hybrid);
        assert_eq!(assignment.role, "Poacher");
        assert_eq!(assignment.confidence, 0.40);
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        let at = assign(&[(0, 0.20), (1, 0.60), (2, 0.20)]);
        assert!(!at.is_hybrid);
        assert_eq!(at.role, "Pressing Striker");

        let below = assign(&[(0, 0.200001), (1, 0.599999), (2, 0.2)]);
        assert!(below.is_hybrid);
        // rounding must not lift the flag
        assert_eq!(below.confidence, 0.6);
    }

    #[test]
    fn ties_go_to_lowest_cluster() {
        let assignment = assign(&[(0, 0.2), (1, 0.4), (2, 0.4)]);
        assert_eq!(assignment.role, "Pressing Striker");
        assert_eq!(assignment.top_roles[0].cluster, 1);
        assert_eq!(assignment.top_roles[1].cluster, 2);
    }

    #[test]
    fn missing_description_is_empty_tooltip() {
        let assignment = assign(&[(0, 0.1), (1, 0.1), (2, 0.8)]);
        assert_eq!(assignment.role, "Link-Up Striker");
        assert_eq!(assignment.tooltip, "");
    }

    #[test]
    fn unmapped_top_cluster_is_an_integrity_error() {
        let partial = RoleMapping::new(BTreeMap::from([(1, "Pressing Striker".to_string())]));
        let err = assign_role(
            key(),
            &posterior(&[(0, 0.7), (1, 0.2), (2, 0.1)]),
            &partial,
            &descriptions(),
            HYBRID_THRESHOLD,
        )
        .unwrap_err();
        assert_eq!(
            err,
            DataIntegrityError::UnmappedCluster {
                season_id: 317,
                cluster: 0,
                key: Some(key())
            }
        );
    }

    #[test]
    fn confidence_is_bounded_and_rounded() {
        for probabilities in [
            [(0, 0.3333), (1, 0.3333), (2, 0.3334)],
            [(0, 1.0), (1, 0.0), (2, 0.0)],
            [(0, 0.0004), (1, 0.9992), (2, 0.0004)],
        ] {
            let assignment = assign(&probabilities);
            let p_max = probabilities.iter().map(|(_, p)| *p).fold(0.0, f64::max);
            assert!((0.0..=1.0).contains(&assignment.confidence));
            assert_eq!(assignment.confidence, round3(p_max));
        }
    }
}
