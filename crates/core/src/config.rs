use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    profiled_env_opt(profile, key)
        .and_then(|v| parse_bool(&v))
        .unwrap_or(default)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub preview: PreviewConfig,
    pub validation: ValidationConfig,
    pub store: StoreConfig,
}

/// Well-known env keys that identify a profile when prefixed.
const PROFILE_MARKER_KEYS: &[&str] = &[
    "PREVIEW_ROW_COUNT",
    "PREVIEW_LATENCY_MS",
    "VALIDATION_MAX_FIELDS",
    "VALIDATION_WARN_WITHOUT_FILTERS",
    "STORE_ENFORCE_VALIDATION",
];

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `EXTRACT_PROFILE` env var. When set (e.g. `DEMO`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("EXTRACT_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            preview: PreviewConfig::from_env_profiled(p),
            validation: ValidationConfig::from_env_profiled(p),
            store: StoreConfig::from_env_profiled(p),
        }
    }

    /// Discover available profiles by scanning env vars for `{PREFIX}_{MARKER_KEY}` patterns.
    /// Always includes "default" (the unprefixed config).
    pub fn available_profiles() -> Vec<String> {
        let mut profiles = std::collections::BTreeSet::new();
        profiles.insert("default".to_string());

        for (key, _) in env::vars() {
            for marker in PROFILE_MARKER_KEYS {
                if let Some(prefix) = key.strip_suffix(&format!("_{}", marker)) {
                    if !prefix.is_empty()
                        && prefix.chars().all(|c| c.is_ascii_uppercase() || c == '_')
                    {
                        profiles.insert(prefix.to_string());
                    }
                }
            }
        }

        profiles.into_iter().collect()
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  preview:     rows={}, latency_ms={}",
            self.preview.row_count,
            self.preview.latency_ms
        );
        tracing::info!(
            "  validation:  max_fields={}, warn_without_filters={}",
            self.validation.max_selected_fields,
            self.validation.warn_without_filters
        );
        tracing::info!("  store:       enforce_validation={}", self.store.enforce_validation);
    }

    /// Return a JSON view of the active settings.
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "preview": {
                "row_count": self.preview.row_count,
                "latency_ms": self.preview.latency_ms,
            },
            "validation": {
                "max_selected_fields": self.validation.max_selected_fields,
                "warn_without_filters": self.validation.warn_without_filters,
            },
            "store": { "enforce_validation": self.store.enforce_validation },
        })
    }
}

// ── Preview ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Number of synthetic rows produced per preview.
    pub row_count: usize,
    /// Simulated backend latency.
    pub latency_ms: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            row_count: 5,
            latency_ms: 300,
        }
    }
}

impl PreviewConfig {
    fn from_env_profiled(p: &str) -> Self {
        let defaults = Self::default();
        Self {
            row_count: profiled_env_usize(p, "PREVIEW_ROW_COUNT", defaults.row_count),
            latency_ms: profiled_env_u64(p, "PREVIEW_LATENCY_MS", defaults.latency_ms),
        }
    }
}

// ── Validation ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Selecting more fields than this raises a performance warning.
    pub max_selected_fields: usize,
    /// Warn when a query has no filters at all.
    pub warn_without_filters: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_selected_fields: 20,
            warn_without_filters: true,
        }
    }
}

impl ValidationConfig {
    fn from_env_profiled(p: &str) -> Self {
        let defaults = Self::default();
        Self {
            max_selected_fields: profiled_env_usize(
                p,
                "VALIDATION_MAX_FIELDS",
                defaults.max_selected_fields,
            ),
            warn_without_filters: profiled_env_bool(
                p,
                "VALIDATION_WARN_WITHOUT_FILTERS",
                defaults.warn_without_filters,
            ),
        }
    }
}

// ── Store ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Reject definitions that fail validation on create/update.
    pub enforce_validation: bool,
}

impl StoreConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            enforce_validation: profiled_env_bool(p, "STORE_ENFORCE_VALIDATION", false),
        }
    }
}
