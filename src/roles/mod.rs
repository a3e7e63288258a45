//! Role assignment: posterior probabilities in, tactical role out.

mod assignment;
mod engine;

pub use assignment::{assign_role, round3, RoleAssignment, RoleProbability, HYBRID_THRESHOLD};
pub use engine::RoleEngine;
