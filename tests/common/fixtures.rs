//! Test fixture creation for cohort artifacts
//!
//! Writes a small cohort directory in the same layout the offline
//! clustering job produces.

use super::constants::*;
use anyhow::Result;
use scouting_roles_server::artifacts::{
    CLUSTER_PROBS_FILE, CONFIG_FILE, NEIGHBORS_FILE, STYLE_VECTORS_FILE,
};
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_season(
    root: &Path,
    season_id: u32,
    style_vectors: &str,
    cluster_probs: Option<&str>,
) -> Result<()> {
    let dir = root.join(season_id.to_string());
    fs::create_dir_all(&dir)?;
    fs::write(
        dir.join(STYLE_VECTORS_FILE),
        format!(
            "player_id,player_name,team_id,team_name,season_id,minutes,pca_1,pca_2\n{}",
            style_vectors
        ),
    )?;
    if let Some(probs) = cluster_probs {
        fs::write(
            dir.join(CLUSTER_PROBS_FILE),
            format!(
                "player_id,season_id,cluster_0,cluster_1,cluster_2,predicted_cluster\n{}",
                probs
            ),
        )?;
    }
    Ok(())
}

/// Creates a temporary cohort with two valid seasons, one broken season
/// and a neighbor table.
/// Returns the temp dir, which is also the cohort root.
pub fn create_test_cohort() -> Result<TempDir> {
    let dir = TempDir::new()?;
    let root = dir.path();

    let config = json!({
        "cluster_to_role": {
            "0": ROLE_LINK_UP,
            "1": ROLE_PRESSING,
            "2": ROLE_POACHER,
        },
        "role_descriptions": {
            ROLE_LINK_UP: ROLE_LINK_UP_DESCRIPTION,
            ROLE_PRESSING: "Leads the press and attacks space behind the defensive line.",
            ROLE_POACHER: "Focuses on box occupation and finishing, limited link play.",
        },
        "minutes_threshold": 500,
        "n_components_pca": 2,
        "n_clusters_gmm": 3,
        "top_k_neighbors": 3,
    });
    fs::write(root.join(CONFIG_FILE), serde_json::to_string_pretty(&config)?)?;

    write_season(
        root,
        SEASON_1_ID,
        &format!(
            "{},{},10,Reds,{s},2100,0.9,0.1\n\
             {},{},11,Blues,{s},1400,0.6,0.5\n\
             {},{},12,Greens,{s},900,0.2,0.9\n",
            STRIKER_1_ID,
            STRIKER_1_NAME,
            STRIKER_2_ID,
            STRIKER_2_NAME,
            STRIKER_4_ID,
            STRIKER_4_NAME,
            s = SEASON_1_ID
        ),
        Some(&format!(
            "{},{s},0.73,0.15,0.12,0\n\
             {},{s},0.40,0.35,0.25,0\n\
             {},{s},0.10,0.20,0.70,2\n",
            STRIKER_1_ID,
            STRIKER_2_ID,
            STRIKER_4_ID,
            s = SEASON_1_ID
        )),
    )?;

    write_season(
        root,
        SEASON_2_ID,
        &format!(
            "{},{},10,Reds,{s},1800,0.8,0.3\n",
            STRIKER_3_ID,
            STRIKER_3_NAME,
            s = SEASON_2_ID
        ),
        Some(&format!("{},{s},0.05,0.90,0.05,1\n", STRIKER_3_ID, s = SEASON_2_ID)),
    )?;

    write_season(
        root,
        BROKEN_SEASON_ID,
        &format!(
            "{},{},10,Reds,{s},1500,0.7,0.2\n",
            STRIKER_1_ID,
            STRIKER_1_NAME,
            s = BROKEN_SEASON_ID
        ),
        None,
    )?;

    // The self-edge of striker 2 is dropped at query time. Striker 3's only
    // neighbor lives in the broken season.
    fs::write(
        root.join(NEIGHBORS_FILE),
        format!(
            "anchor_player_id,anchor_season_id,neighbor_player_id,neighbor_season_id,cosine_sim\n\
             {p1},{s1},{p3},{s2},0.92\n\
             {p1},{s1},{p4},{s1},0.88\n\
             {p1},{s1},{p2},{s1},0.85\n\
             {p2},{s1},{p1},{s1},0.85\n\
             {p2},{s1},{p2},{s1},0.80\n\
             {p2},{s1},{p4},{s1},0.60\n\
             {p3},{s2},{p1},{sb},0.70\n",
            p1 = STRIKER_1_ID,
            p2 = STRIKER_2_ID,
            p3 = STRIKER_3_ID,
            p4 = STRIKER_4_ID,
            s1 = SEASON_1_ID,
            s2 = SEASON_2_ID,
            sb = BROKEN_SEASON_ID,
        ),
    )?;

    Ok(dir)
}
