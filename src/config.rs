//! Application-level configuration loading, including the material catalog
//! and the upload policy.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SPEEDMODELLING_BACK_CONFIG_PATH";
/// Ceiling applied to uploaded model files when none is configured.
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;
/// Poll cadence advertised to racer tooling when none is configured.
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// CAD material racers must model with.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Identifier used on the wire and in the competition record.
    pub id: String,
    /// Display name shown to racers.
    pub label: String,
    /// Density in grams per cubic centimetre.
    pub density_g_cm3: f64,
}

impl Material {
    /// Display line combining the label with the density.
    pub fn info(&self) -> String {
        format!("{} (Density: {:.2} g/cm\u{b3})", self.label, self.density_g_cm3)
    }
}

/// Constraints applied to an uploaded model file before it is accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPolicy {
    /// Maximum accepted file size in bytes.
    pub max_size_bytes: u64,
    /// Accepted file extensions, lower case, including the leading dot.
    pub allowed_extensions: Vec<String>,
}

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    materials: Vec<Material>,
    upload: UploadPolicy,
    drawing_media_types: Vec<String>,
    poll_interval: Duration,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in defaults for anything missing.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        materials = app_config.materials.len(),
                        "loaded configuration from disk"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// The material catalog.
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Look up a catalog material by identifier.
    pub fn material(&self, id: &str) -> Option<&Material> {
        self.materials.iter().find(|material| material.id == id)
    }

    /// Upload constraints for model files.
    pub fn upload(&self) -> &UploadPolicy {
        &self.upload
    }

    /// Media types accepted for drawing uploads.
    pub fn drawing_media_types(&self) -> &[String] {
        &self.drawing_media_types
    }

    /// Poll cadence advertised to racers.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            materials: default_materials(),
            upload: default_upload_policy(),
            drawing_media_types: default_drawing_media_types(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    materials: Option<Vec<RawMaterial>>,
    #[serde(default)]
    upload: Option<RawUploadPolicy>,
    #[serde(default)]
    drawing_media_types: Option<Vec<String>>,
    #[serde(default)]
    poll_interval_ms: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let materials = value
            .materials
            .map(|materials| materials.into_iter().map(Into::into).collect())
            .filter(|materials: &Vec<Material>| !materials.is_empty())
            .unwrap_or_else(default_materials);
        let upload = value
            .upload
            .map(Into::into)
            .unwrap_or_else(default_upload_policy);
        let drawing_media_types = value
            .drawing_media_types
            .filter(|types| !types.is_empty())
            .unwrap_or_else(default_drawing_media_types);
        let poll_interval =
            Duration::from_millis(value.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS));
        Self {
            materials,
            upload,
            drawing_media_types,
            poll_interval,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single material catalog entry.
struct RawMaterial {
    id: String,
    label: String,
    density_g_cm3: f64,
}

impl From<RawMaterial> for Material {
    fn from(value: RawMaterial) -> Self {
        Self {
            id: value.id,
            label: value.label,
            density_g_cm3: value.density_g_cm3,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the upload policy section.
struct RawUploadPolicy {
    #[serde(default)]
    max_size_bytes: Option<u64>,
    #[serde(default)]
    allowed_extensions: Option<Vec<String>>,
}

impl From<RawUploadPolicy> for UploadPolicy {
    fn from(value: RawUploadPolicy) -> Self {
        let defaults = default_upload_policy();
        Self {
            max_size_bytes: value.max_size_bytes.unwrap_or(defaults.max_size_bytes),
            allowed_extensions: value
                .allowed_extensions
                .filter(|extensions| !extensions.is_empty())
                .map(|extensions| {
                    extensions
                        .into_iter()
                        .map(|extension| extension.to_lowercase())
                        .collect()
                })
                .unwrap_or(defaults.allowed_extensions),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in material catalog shipped with the binary.
fn default_materials() -> Vec<Material> {
    vec![
        Material {
            id: "aluminum".into(),
            label: "Aluminum".into(),
            density_g_cm3: 2.70,
        },
        Material {
            id: "steel".into(),
            label: "Steel".into(),
            density_g_cm3: 7.85,
        },
        Material {
            id: "abs".into(),
            label: "ABS Plastic".into(),
            density_g_cm3: 1.04,
        },
        Material {
            id: "brass".into(),
            label: "Brass".into(),
            density_g_cm3: 8.50,
        },
    ]
}

/// Built-in upload policy for model files.
fn default_upload_policy() -> UploadPolicy {
    UploadPolicy {
        max_size_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        allowed_extensions: [".step", ".iges", ".sldprt", ".prt", ".dwg", ".x_t"]
            .into_iter()
            .map(str::to_owned)
            .collect(),
    }
}

/// Built-in accepted media types for drawing uploads.
fn default_drawing_media_types() -> Vec<String> {
    ["image/jpeg", "image/png", "image/jpg", "application/pdf"]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_the_full_material_catalog() {
        let config = AppConfig::default();
        let ids: Vec<&str> = config
            .materials()
            .iter()
            .map(|material| material.id.as_str())
            .collect();
        assert_eq!(ids, ["aluminum", "steel", "abs", "brass"]);
        assert_eq!(config.material("steel").unwrap().density_g_cm3, 7.85);
        assert!(config.material("titanium").is_none());
    }

    #[test]
    fn material_info_includes_density() {
        let config = AppConfig::default();
        assert_eq!(
            config.material("aluminum").unwrap().info(),
            "Aluminum (Density: 2.70 g/cm\u{b3})"
        );
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_sections() {
        let raw: RawConfig = serde_json::from_str(r#"{"poll_interval_ms": 500}"#).unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.materials().len(), 4);
        assert_eq!(config.upload().max_size_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn upload_extensions_are_lowercased() {
        let raw: RawConfig = serde_json::from_str(
            r#"{"upload": {"allowed_extensions": [".STEP", ".Iges"]}}"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);
        assert_eq!(config.upload().allowed_extensions, [".step", ".iges"]);
    }
}
