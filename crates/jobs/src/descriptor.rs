//! The job descriptor that crosses the queue boundary.

use serde::{Deserialize, Serialize};

use migq_core::{Direction, MigrationId, MigrationResult};

/// Minimal, serializable description of a deferred migration run.
///
/// Carries only the migration identifier and the direction: no reference to
/// the migration instance, no behaviour. Its wire form is exactly
/// `{"identifier": "...", "direction": "up" | "down"}`, and decoding goes through
/// the same validation as [`MigrationJob::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "WirePayload")]
pub struct MigrationJob {
    identifier: MigrationId,
    direction: Direction,
}

/// Unvalidated wire form; decoding funnels through [`MigrationJob::new`].
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct WirePayload {
    identifier: String,
    direction: String,
}

impl TryFrom<WirePayload> for MigrationJob {
    type Error = migq_core::MigrationError;

    fn try_from(wire: WirePayload) -> Result<Self, Self::Error> {
        Self::new(wire.identifier, &wire.direction)
    }
}

impl MigrationJob {
    /// Build a descriptor, rejecting any direction other than `up`/`down`.
    ///
    /// The identifier is not checked here; the registry decides at
    /// resolution time whether it exists.
    pub fn new(identifier: impl Into<MigrationId>, direction: &str) -> MigrationResult<Self> {
        let direction = direction.parse()?;
        Ok(Self::from_parts(identifier.into(), direction))
    }

    pub fn from_parts(identifier: MigrationId, direction: Direction) -> Self {
        Self {
            identifier,
            direction,
        }
    }

    pub fn identifier(&self) -> &MigrationId {
        &self.identifier
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Human-readable label for logs and telemetry.
    pub fn label(&self) -> String {
        format!(
            "Run async migration \"{}\" (Direction {})",
            self.identifier,
            self.direction.label()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migq_core::MigrationError;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn up_and_down_are_allowed() {
        for direction in ["up", "down"] {
            let job = MigrationJob::new("foo", direction).unwrap();
            assert_eq!(job.identifier().as_str(), "foo");
            assert_eq!(job.direction().as_str(), direction);
        }
    }

    #[test]
    fn other_directions_are_rejected() {
        assert_eq!(
            MigrationJob::new("foo", "bar").unwrap_err(),
            MigrationError::InvalidDirection("bar".to_string())
        );
    }

    #[test]
    fn identifier_is_not_validated() {
        assert!(MigrationJob::new("", "up").is_ok());
        assert!(MigrationJob::new("not a version", "down").is_ok());
    }

    #[test]
    fn label_contains_identifier_and_upper_cased_direction() {
        let up = MigrationJob::new("foo", "up").unwrap();
        let down = MigrationJob::new("foo", "down").unwrap();

        assert_eq!(up.label(), "Run async migration \"foo\" (Direction UP)");
        assert_eq!(down.label(), "Run async migration \"foo\" (Direction DOWN)");
    }

    #[test]
    fn wire_payload_has_exactly_two_fields() {
        let job = MigrationJob::new("20210114162911", "up").unwrap();
        let value = serde_json::to_value(&job).unwrap();

        assert_eq!(
            value,
            json!({"identifier": "20210114162911", "direction": "up"})
        );
        assert_eq!(serde_json::from_value::<MigrationJob>(value).unwrap(), job);
    }

    #[test]
    fn equal_inputs_encode_identically() {
        let a = serde_json::to_string(&MigrationJob::new("42", "down").unwrap()).unwrap();
        let b = serde_json::to_string(&MigrationJob::new("42", "down").unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn forged_payloads_are_rejected_on_decode() {
        let err = serde_json::from_value::<MigrationJob>(
            json!({"identifier": "42", "direction": "sideways"}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("\"sideways\""));

        assert!(serde_json::from_value::<MigrationJob>(json!({"identifier": "42"})).is_err());
    }

    #[test]
    fn payloads_with_extra_fields_are_rejected() {
        let err = serde_json::from_value::<MigrationJob>(json!({
            "identifier": "1",
            "direction": "up",
            "migration": {"obj": 1}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("migration"));
    }

    proptest! {
        #[test]
        fn only_up_and_down_build_a_job(direction in ".*") {
            prop_assume!(direction != "up" && direction != "down");
            prop_assert_eq!(
                MigrationJob::new("42", &direction).unwrap_err(),
                MigrationError::InvalidDirection(direction.clone())
            );
        }

        #[test]
        fn jobs_survive_the_wire(identifier in ".*", up in any::<bool>()) {
            let job = MigrationJob::new(identifier.as_str(), if up { "up" } else { "down" }).unwrap();
            let wire = serde_json::to_string(&job).unwrap();
            prop_assert_eq!(serde_json::from_str::<MigrationJob>(&wire).unwrap(), job);
        }
    }
}
