//! Everything the engines read about a job, loaded in one go.

use synth_core::error::CoreError;
use synth_core::settings::{OutputSettings, SimulationRules};
use synth_db::models::connection::DatabaseConnection;
use synth_db::models::job::Job;
use synth_db::models::job_mapping::JobMapping;
use synth_db::models::schema::Schema;

#[derive(Debug, Clone)]
pub struct JobContext {
    pub job: Job,
    pub schema: Schema,
    pub destination: Option<DatabaseConnection>,
    pub mappings: Vec<JobMapping>,
}

impl JobContext {
    pub fn simulation_rules(&self) -> Result<SimulationRules, CoreError> {
        SimulationRules::from_json(self.job.simulation_rules.as_ref())
    }

    pub fn output_settings(&self) -> Result<OutputSettings, CoreError> {
        OutputSettings::from_json(self.job.output_settings.as_ref())
    }

    /// The destination and its mappings, when there is anything to insert.
    pub fn insert_targets(&self) -> Option<(&DatabaseConnection, &[JobMapping])> {
        match &self.destination {
            Some(destination) if !self.mappings.is_empty() => {
                Some((destination, self.mappings.as_slice()))
            }
            _ => None,
        }
    }
}
