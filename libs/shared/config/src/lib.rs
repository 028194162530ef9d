use std::env;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_PAGE_SIZE: u32 = 7;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: Option<String>,
    pub server_host: String,
    pub server_port: u16,
    pub default_page_size: u32,
    /// Answer 404 instead of an empty list when a date-range filter matches nothing.
    pub empty_filter_is_not_found: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_role_key: None,
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            default_page_size: DEFAULT_PAGE_SIZE,
            empty_filter_is_not_found: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY").ok(),
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            default_page_size: parse_var("DEFAULT_PAGE_SIZE", defaults.default_page_size),
            empty_filter_is_not_found: parse_var(
                "EMPTY_FILTER_IS_NOT_FOUND",
                defaults.empty_filter_is_not_found,
            ),
        };

        if !config.is_configured() {
            warn!("Supabase not configured - appointments will be kept in memory");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    /// Token sent as the bearer credential on store requests.
    pub fn store_token(&self) -> &str {
        self.supabase_service_role_key
            .as_deref()
            .unwrap_or(&self.supabase_anon_key)
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
