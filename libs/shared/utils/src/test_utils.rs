use std::sync::Arc;
use serde_json::{json, Value};

use shared_config::AppConfig;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub default_page_size: u32,
    pub empty_filter_is_not_found: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            default_page_size: shared_config::DEFAULT_PAGE_SIZE,
            empty_filter_is_not_found: false,
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            default_page_size: self.default_page_size,
            empty_filter_is_not_found: self.empty_filter_is_not_found,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    /// A row of the `appointments` table as PostgREST returns it.
    pub fn appointment_row(id: i64, doctor_id: i64, animal_id: i64, date_time: &str) -> Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "animal_id": animal_id,
            "appointment_date_time": date_time
        })
    }

    pub fn unique_violation() -> Value {
        Self::error_response(
            "23505",
            "duplicate key value violates unique constraint \"appointments_doctor_id_appointment_date_time_key\"",
            Some("Key (doctor_id, appointment_date_time)=(1, 2024-03-01 09:00:00) already exists."),
        )
    }

    pub fn foreign_key_violation(column: &str, id: i64, table: &str) -> Value {
        Self::error_response(
            "23503",
            "insert or update on table \"appointments\" violates foreign key constraint",
            Some(&format!("Key ({})=({}) is not present in table \"{}\".", column, id, table)),
        )
    }

    pub fn error_response(code: &str, message: &str, details: Option<&str>) -> Value {
        json!({
            "code": code,
            "message": message,
            "details": details,
            "hint": null
        })
    }
}
