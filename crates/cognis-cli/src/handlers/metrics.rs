use std::sync::Arc;

use anyhow::Result;
use cognis_index::Database;
use cognis_sdk::Brain;
use serde_json::json;

use crate::args::OutputFormat;
use crate::config::Config;

pub fn handle(db: Arc<Database>, config: Config, format: OutputFormat) -> Result<()> {
    let brain = Brain::new(db, config.brain);
    let metrics = brain.metrics()?;

    match format {
        OutputFormat::Json => {
            let body = json!({
                "health_state": format!("{:?}", metrics.health_state()),
                "health_score": metrics.health_score,
                "probation_count": metrics.probation_count,
                "validated_count": metrics.validated_count,
                "promoted_count": metrics.promoted_count,
                "deprecated_count": metrics.deprecated_count,
                "maturity_ratio": metrics.maturity_ratio,
                "success_rate": metrics.success_rate,
                "local_model_rate": metrics.local_model_rate,
                "distillation_success_rate": metrics.distillation_success_rate,
                "grade_pass_count": metrics.grade_pass_count,
                "grade_partial_count": metrics.grade_partial_count,
                "grade_fail_count": metrics.grade_fail_count,
                "pass_rate": metrics.pass_rate,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Plain => {
            println!("health:      {:?} ({:.1}/100)", metrics.health_state(), metrics.health_score);
            println!("probation:   {}", metrics.probation_count);
            println!("validated:   {}", metrics.validated_count);
            println!("promoted:    {}", metrics.promoted_count);
            println!("deprecated:  {}", metrics.deprecated_count);
            println!("maturity ratio:     {:.2}", metrics.maturity_ratio);
            println!("trace success rate: {:.2}", metrics.success_rate);
            println!("local model rate:   {:.2}", metrics.local_model_rate);
            println!("distillation success rate: {:.2}", metrics.distillation_success_rate);
            println!(
                "grades: {} pass / {} partial / {} fail",
                metrics.grade_pass_count, metrics.grade_partial_count, metrics.grade_fail_count
            );
        }
    }
    Ok(())
}
