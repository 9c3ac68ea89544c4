use std::fmt::Display;

/// Result of a best-effort rollback step.
///
/// Emitted as a `compensation` tracing event so orphaned records can be
/// found from the logs; the error that triggered the rollback is the one
/// returned to the caller either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompensationOutcome {
    pub action: &'static str,
    pub resource_id: String,
    pub succeeded: bool,
    pub error: Option<String>,
}

impl CompensationOutcome {
    pub fn from_result<E: Display>(
        action: &'static str,
        resource_id: &str,
        result: std::result::Result<(), E>,
    ) -> Self {
        Self {
            action,
            resource_id: resource_id.to_string(),
            succeeded: result.is_ok(),
            error: result.err().map(|err| err.to_string()),
        }
    }

    pub fn outcome(&self) -> &'static str {
        if self.succeeded {
            "completed"
        } else {
            "failed"
        }
    }

    pub fn emit(&self) {
        if self.succeeded {
            tracing::warn!(
                target: "compensation",
                action = self.action,
                resource_id = %self.resource_id,
                outcome = self.outcome(),
                "Compensating action completed"
            );
        } else {
            tracing::error!(
                target: "compensation",
                action = self.action,
                resource_id = %self.resource_id,
                outcome = self.outcome(),
                error = self.error.as_deref().unwrap_or_default(),
                "Compensating action failed, resource may be orphaned"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_records_failure_text() {
        let outcome =
            CompensationOutcome::from_result("delete_invite", "inv-1", Err::<(), _>("boom"));
        assert!(!outcome.succeeded);
        assert_eq!(outcome.outcome(), "failed");
        assert_eq!(outcome.error.as_deref(), Some("boom"));
        outcome.emit();

        let outcome = CompensationOutcome::from_result("delete_user", "u-1", Ok::<(), String>(()));
        assert_eq!(outcome.outcome(), "completed");
        assert_eq!(outcome.error, None);
    }
}
