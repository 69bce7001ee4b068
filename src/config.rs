use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use validator::{Validate, ValidationError};

use crate::core::{AnimationConfig, GestureConfig, RadiusPolicy};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    #[validate(nested)]
    pub api: ApiSettings,
    #[serde(default)]
    #[validate(nested)]
    pub gesture: GestureSettings,
    #[serde(default)]
    #[validate(nested)]
    pub animation: AnimationSettings,
    #[serde(default)]
    #[validate(nested)]
    pub search: SearchSettings,
    #[serde(default)]
    #[validate(nested)]
    pub favorites: FavoriteSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ApiSettings {
    #[validate(url)]
    pub base_url: String,
    pub auth_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GestureSettings {
    #[serde(default = "default_viewport_width")]
    #[validate(range(min = 1.0))]
    pub viewport_width: f64,
    #[serde(default = "default_commit_threshold_ratio")]
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub commit_threshold_ratio: f64,
    #[serde(default = "default_max_rotation_deg")]
    #[validate(range(min = 0.0, max = 90.0))]
    pub max_rotation_deg: f64,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            viewport_width: default_viewport_width(),
            commit_threshold_ratio: default_commit_threshold_ratio(),
            max_rotation_deg: default_max_rotation_deg(),
        }
    }
}

fn default_viewport_width() -> f64 { 390.0 }
fn default_commit_threshold_ratio() -> f64 { 0.25 }
fn default_max_rotation_deg() -> f64 { 10.0 }

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_lock_timeout"))]
pub struct AnimationSettings {
    #[serde(default = "default_commit_duration_ms")]
    #[validate(range(max = 5000))]
    pub commit_duration_ms: u64,
    #[serde(default = "default_reset_duration_ms")]
    #[validate(range(max = 5000))]
    pub reset_duration_ms: u64,
    #[serde(default = "default_lock_timeout_ms")]
    #[validate(range(min = 1))]
    pub lock_timeout_ms: u64,
    #[serde(default = "default_frame_interval_ms")]
    #[validate(range(min = 1, max = 1000))]
    pub frame_interval_ms: u64,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            commit_duration_ms: default_commit_duration_ms(),
            reset_duration_ms: default_reset_duration_ms(),
            lock_timeout_ms: default_lock_timeout_ms(),
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

fn default_commit_duration_ms() -> u64 { 250 }
fn default_reset_duration_ms() -> u64 { 200 }
fn default_lock_timeout_ms() -> u64 { 400 }
fn default_frame_interval_ms() -> u64 { 16 }

fn validate_lock_timeout(animation: &AnimationSettings) -> Result<(), ValidationError> {
    if animation.lock_timeout_ms <= animation.commit_duration_ms.max(animation.reset_duration_ms) {
        return Err(ValidationError::new("lock_timeout_not_longer_than_animation"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_search_bounds"))]
pub struct SearchSettings {
    #[serde(default = "default_initial_radius_km")]
    pub initial_radius_km: u32,
    #[serde(default = "default_radius_increment_km")]
    #[validate(range(min = 1))]
    pub radius_increment_km: u32,
    #[serde(default = "default_max_radius_km")]
    pub max_radius_km: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            initial_radius_km: default_initial_radius_km(),
            radius_increment_km: default_radius_increment_km(),
            max_radius_km: default_max_radius_km(),
        }
    }
}

fn default_initial_radius_km() -> u32 { 5 }
fn default_radius_increment_km() -> u32 { 5 }
fn default_max_radius_km() -> u32 { 40 }

fn validate_search_bounds(search: &SearchSettings) -> Result<(), ValidationError> {
    if search.initial_radius_km > search.max_radius_km {
        return Err(ValidationError::new("initial_radius_exceeds_max"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FavoriteSettings {
    #[serde(default = "default_lock_timeout_ms")]
    #[validate(range(min = 1))]
    pub lock_timeout_ms: u64,
}

impl Default for FavoriteSettings {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with PAWSWIPE)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., PAWSWIPE__API__BASE_URL -> api.base_url
            .add_source(
                Environment::with_prefix("PAWSWIPE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::finish(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("PAWSWIPE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::finish(settings)
    }

    fn finish(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        settings
            .validate()
            .map_err(|e| ConfigError::Message(format!("Invalid configuration: {}", e)))?;
        Ok(settings)
    }

    pub fn gesture_config(&self) -> GestureConfig {
        GestureConfig {
            viewport_width: self.gesture.viewport_width,
            commit_threshold_ratio: self.gesture.commit_threshold_ratio,
            max_rotation_deg: self.gesture.max_rotation_deg,
        }
    }

    pub fn animation_config(&self) -> AnimationConfig {
        AnimationConfig {
            commit_duration: Duration::from_millis(self.animation.commit_duration_ms),
            reset_duration: Duration::from_millis(self.animation.reset_duration_ms),
            lock_timeout: Duration::from_millis(self.animation.lock_timeout_ms),
            frame_interval: Duration::from_millis(self.animation.frame_interval_ms),
        }
    }

    pub fn radius_policy(&self) -> RadiusPolicy {
        RadiusPolicy {
            initial_km: self.search.initial_radius_km,
            increment_km: self.search.radius_increment_km,
            max_km: self.search.max_radius_km,
        }
    }

    pub fn favorite_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.favorites.lock_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine_defaults() {
        let search = SearchSettings::default();
        assert_eq!(search.initial_radius_km, 5);
        assert_eq!(search.radius_increment_km, 5);
        assert_eq!(search.max_radius_km, 40);

        let gesture = GestureSettings::default();
        assert_eq!(gesture.commit_threshold_ratio, 0.25);
        assert_eq!(
            GestureConfig::default().commit_threshold_ratio,
            gesture.commit_threshold_ratio
        );
        assert_eq!(AnimationSettings::default().lock_timeout_ms, 400);
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_search_bounds_validated() {
        let search = SearchSettings {
            initial_radius_km: 50,
            radius_increment_km: 5,
            max_radius_km: 40,
        };
        assert!(search.validate().is_err());
        assert!(SearchSettings::default().validate().is_ok());
    }

    #[test]
    fn test_lock_timeout_must_outlast_animations() {
        let animation = AnimationSettings {
            commit_duration_ms: 600,
            lock_timeout_ms: 400,
            ..AnimationSettings::default()
        };
        assert!(animation.validate().is_err());

        let equal = AnimationSettings {
            reset_duration_ms: 400,
            lock_timeout_ms: 400,
            ..AnimationSettings::default()
        };
        assert!(equal.validate().is_err());
        assert!(AnimationSettings::default().validate().is_ok());
    }

    #[test]
    fn test_threshold_ratio_range() {
        let gesture = GestureSettings {
            commit_threshold_ratio: 1.0,
            ..GestureSettings::default()
        };
        assert!(gesture.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("pawswipe-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        std::fs::write(
            &path,
            r#"
[api]
base_url = "https://pets.example.com/api"

[search]
initial_radius_km = 10
max_radius_km = 30
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.api.timeout_secs, 30);
        assert_eq!(settings.radius_policy().initial_km, 10);
        assert_eq!(settings.radius_policy().max_km, 30);
        assert_eq!(settings.animation_config().commit_duration, Duration::from_millis(250));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_rejects_lock_shorter_than_commit() {
        let dir = std::env::temp_dir().join(format!("pawswipe-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        std::fs::write(
            &path,
            r#"
[api]
base_url = "https://pets.example.com/api"

[animation]
commit_duration_ms = 600
lock_timeout_ms = 400
"#,
        )
        .unwrap();

        let err = Settings::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
