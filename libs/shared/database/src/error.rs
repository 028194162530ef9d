use serde::Deserialize;
use thiserror::Error;

/// Postgres error code for a unique constraint violation.
pub const UNIQUE_VIOLATION: &str = "23505";
/// Postgres error code for a foreign key violation.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Constraint violation ({code}): {message}")]
    Constraint {
        code: String,
        message: String,
        details: Option<String>,
    },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl DatabaseError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DatabaseError::Constraint { code, .. } if code == UNIQUE_VIOLATION)
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, DatabaseError::Constraint { code, .. } if code == FOREIGN_KEY_VIOLATION)
    }

    /// Details text of a constraint violation, e.g. `Key (doctor_id)=(5) is not present in table "doctors".`
    pub fn constraint_details(&self) -> Option<&str> {
        match self {
            DatabaseError::Constraint { details, .. } => details.as_deref(),
            _ => None,
        }
    }

    /// Builds an error from a non-success PostgREST response.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<PostgrestErrorBody>(body).ok();
        let message = parsed
            .as_ref()
            .and_then(|p| p.message.clone())
            .unwrap_or_else(|| body.to_string());

        if let Some(PostgrestErrorBody { code: Some(code), details, .. }) = parsed {
            // Class 23 is integrity constraint violation
            if code.starts_with("23") {
                return DatabaseError::Constraint { code, message, details };
            }
        }

        match status {
            401 | 403 => DatabaseError::Auth(message),
            404 => DatabaseError::NotFound(message),
            _ => DatabaseError::Api { status, message },
        }
    }
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_unique_violation_is_detected() {
        let body = r#"{"code":"23505","details":"Key (doctor_id, appointment_date_time)=(1, 2024-03-01 09:00:00) already exists.","hint":null,"message":"duplicate key value violates unique constraint \"appointments_doctor_slot_key\""}"#;
        let err = DatabaseError::from_response(409, body);

        assert!(err.is_unique_violation());
        assert!(!err.is_foreign_key_violation());
    }

    #[test]
    fn test_foreign_key_violation_keeps_details() {
        let body = r#"{"code":"23503","details":"Key (animal_id)=(42) is not present in table \"animals\".","hint":null,"message":"insert or update on table \"appointments\" violates foreign key constraint"}"#;
        let err = DatabaseError::from_response(409, body);

        assert!(err.is_foreign_key_violation());
        assert!(err.constraint_details().unwrap().contains("animal_id"));
    }

    #[test]
    fn test_status_fallbacks() {
        assert_matches!(DatabaseError::from_response(401, "nope"), DatabaseError::Auth(_));
        assert_matches!(DatabaseError::from_response(404, "{}"), DatabaseError::NotFound(_));
        assert_matches!(
            DatabaseError::from_response(500, r#"{"code":"XX000","message":"boom"}"#),
            DatabaseError::Api { status: 500, ref message } if message == "boom"
        );
    }
}
