use crate::config::Configuration;
use crate::error::Result;
use crate::event::{Event, Recorder};

/// A compiled JSON schema for configurations.
pub struct Validator {
    schema: jsonschema::Validator,
}

impl Validator {
    pub fn new(schema: &serde_json::Value) -> Result<Self> {
        let schema = jsonschema::validator_for(schema)
            .map_err(|e| error!([SchemaValidation] "invalid schema", e.to_string()))?;

        Ok(Validator { schema })
    }

    /// Every way in which `config` violates the schema.
    pub fn violations(&self, config: &Configuration) -> Result<Vec<String>> {
        let instance = config.to_json()?;
        Ok(self.schema.iter_errors(&instance).map(|e| e.to_string()).collect())
    }

    /// Checks `config`, recording each violation before failing with all of
    /// them.
    pub fn validate(&self, config: &Configuration, recorder: &dyn Recorder) -> Result<()> {
        let violations = self.violations(config)?;
        if violations.is_empty() {
            recorder.record(Event::ConfigValid);
            return Ok(());
        }

        for message in &violations {
            recorder.record(Event::SchemaViolation { message: message.clone() });
        }

        err! {
            [SchemaValidation] "config validation failed, please fix the errors",
            "violations" => violations.len(),
            violations.join("\n"),
        }
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::event::MemoryRecorder;

    fn validator() -> Validator {
        Validator::new(&serde_json::json!({
            "type": "object",
            "required": ["template_id", "base"],
            "properties": {
                "template_id": {"const": "0001"},
                "base": {
                    "type": "object",
                    "required": ["site"],
                    "properties": {"site": {"type": "string"}}
                },
                "pages": {"type": "object", "required": ["index"]}
            }
        })).unwrap()
    }

    #[test]
    fn valid_config_is_recorded() {
        let config = Configuration::from_yaml("template_id: '0001'\nbase: { site: Me }\npages: { index: {} }").unwrap();
        let recorder = MemoryRecorder::new();
        validator().validate(&config, &recorder).unwrap();
        assert_eq!(recorder.events(), [Event::ConfigValid]);
    }

    #[test]
    fn every_violation_is_reported() {
        let config = Configuration::from_yaml("template_id: '0002'\nbase: { site: 7 }").unwrap();
        let recorder = MemoryRecorder::new();
        let error = validator().validate(&config, &recorder).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::SchemaValidation);
        assert_eq!(recorder.count(|e| matches!(e, Event::SchemaViolation { .. })), 3);
        assert!(error.mentions("violations: 3"));
    }

    #[test]
    fn absent_base_is_a_missing_property() {
        let config = Configuration::from_yaml("template_id: '0001'\npages: { index: {} }").unwrap();
        let violations = validator().violations(&config).unwrap();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("base"));
    }

    #[test]
    fn malformed_schema_is_rejected() {
        let error = Validator::new(&serde_json::json!({"type": 12})).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SchemaValidation);
    }
}
