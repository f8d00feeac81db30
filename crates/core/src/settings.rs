//! Typed views over a job's `simulation_rules` and `output_settings` JSON.
//!
//! Both columns are free-form JSON owned by the job editor. The engine only
//! needs a handful of keys, each with a default when the key (or the whole
//! column) is missing.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Records generated per batch run when `generationFrequency` is unset.
pub const DEFAULT_GENERATION_FREQUENCY: i64 = 1;

/// Bus topic used when `kafkaTopic` is unset.
pub const DEFAULT_TOPIC: &str = "default-topic";

/// Simulation parameters for a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRules {
    #[serde(default)]
    pub event_type: Option<String>,
    /// Batch runs: total records per run. Streaming: records per second.
    #[serde(default)]
    pub generation_frequency: Option<i64>,
    #[serde(default)]
    pub variability_settings: Option<String>,
}

impl SimulationRules {
    /// Parse the `simulation_rules` column. `None` or JSON `null` yields defaults.
    pub fn from_json(value: Option<&serde_json::Value>) -> Result<Self, CoreError> {
        parse_column(value, "simulation_rules")
    }

    /// Records to generate in one batch run.
    pub fn generation_frequency(&self) -> i64 {
        self.generation_frequency
            .unwrap_or(DEFAULT_GENERATION_FREQUENCY)
    }

    /// Pause between streamed records: `1 / frequency` seconds, or one second
    /// when the frequency is not positive.
    pub fn stream_delay(&self) -> Duration {
        let frequency = self.generation_frequency();
        if frequency > 0 {
            Duration::from_secs_f64(1.0 / frequency as f64)
        } else {
            Duration::from_secs(1)
        }
    }
}

/// Output parameters for a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSettings {
    #[serde(default)]
    pub output_format: Option<String>,
    #[serde(default)]
    pub kafka_topic: Option<String>,
    #[serde(default)]
    pub metadata_tags: Vec<String>,
}

impl OutputSettings {
    /// Parse the `output_settings` column. `None` or JSON `null` yields defaults.
    pub fn from_json(value: Option<&serde_json::Value>) -> Result<Self, CoreError> {
        parse_column(value, "output_settings")
    }

    /// Bus topic generated records are published under.
    pub fn topic(&self) -> &str {
        self.kafka_topic
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TOPIC)
    }
}

fn parse_column<T>(value: Option<&serde_json::Value>, column: &str) -> Result<T, CoreError>
where
    T: Default + for<'de> Deserialize<'de>,
{
    match value {
        None | Some(serde_json::Value::Null) => Ok(T::default()),
        Some(v) => T::deserialize(v)
            .map_err(|e| CoreError::Validation(format!("Invalid {column}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_rules_default_to_one_record() {
        let rules = SimulationRules::from_json(None).unwrap();
        assert_eq!(rules.generation_frequency(), 1);

        let rules = SimulationRules::from_json(Some(&json!(null))).unwrap();
        assert_eq!(rules.generation_frequency(), 1);
    }

    #[test]
    fn reads_camel_case_frequency() {
        let value = json!({"eventType": "order", "generationFrequency": 25});
        let rules = SimulationRules::from_json(Some(&value)).unwrap();
        assert_eq!(rules.generation_frequency(), 25);
        assert_eq!(rules.event_type.as_deref(), Some("order"));
    }

    #[test]
    fn rules_without_frequency_key_default() {
        let value = json!({"eventType": "click"});
        let rules = SimulationRules::from_json(Some(&value)).unwrap();
        assert_eq!(rules.generation_frequency(), 1);
    }

    #[test]
    fn wrongly_typed_frequency_is_a_validation_error() {
        let value = json!({"generationFrequency": "lots"});
        assert_matches!(
            SimulationRules::from_json(Some(&value)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn stream_delay_is_reciprocal_of_frequency() {
        let rules = SimulationRules {
            generation_frequency: Some(4),
            ..Default::default()
        };
        assert_eq!(rules.stream_delay(), Duration::from_millis(250));
    }

    #[test]
    fn non_positive_frequency_streams_once_per_second() {
        for frequency in [0, -3] {
            let rules = SimulationRules {
                generation_frequency: Some(frequency),
                ..Default::default()
            };
            assert_eq!(rules.stream_delay(), Duration::from_secs(1));
        }
    }

    #[test]
    fn topic_defaults_when_missing_or_empty() {
        let settings = OutputSettings::from_json(None).unwrap();
        assert_eq!(settings.topic(), DEFAULT_TOPIC);

        let value = json!({"outputFormat": "json", "kafkaTopic": ""});
        let settings = OutputSettings::from_json(Some(&value)).unwrap();
        assert_eq!(settings.topic(), DEFAULT_TOPIC);
    }

    #[test]
    fn topic_read_from_settings() {
        let value = json!({
            "outputFormat": "json",
            "kafkaTopic": "orders.synthetic",
            "metadataTags": ["demo"]
        });
        let settings = OutputSettings::from_json(Some(&value)).unwrap();
        assert_eq!(settings.topic(), "orders.synthetic");
        assert_eq!(settings.metadata_tags, ["demo"]);
    }
}
