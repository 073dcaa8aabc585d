//! The brain's own identity plus the lifecycle thresholds it hands down
//! to `cognis-engine::Config`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrainConfig {
    pub agent_name: String,
    pub agent_version: String,
    pub agent_description: String,
    /// `mode` fallback when a request carries none.
    pub default_task_type: String,
    pub lifecycle: cognis_engine::Config,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            agent_name: "cognis-brain".to_string(),
            agent_version: env!("CARGO_PKG_VERSION").to_string(),
            agent_description: "A cognitive agent brain: template-backed reasoning with distillation and grading.".to_string(),
            default_task_type: "default".to_string(),
            lifecycle: cognis_engine::Config::default(),
        }
    }
}
