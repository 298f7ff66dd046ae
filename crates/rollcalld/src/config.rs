use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Daemon configuration: built-in defaults, then an optional TOML file,
/// then `ROLLCALL_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the person photos.
    pub photo_dir: PathBuf,
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
    /// V4L2 device path used for the camera image source.
    pub camera_device: String,
    /// Frames discarded before capture (camera AGC/AE stabilization).
    pub warmup_frames: usize,
    /// Frames examined for a non-dark capture.
    pub capture_attempts: usize,
    /// JPEG quality for stored photos (1–100).
    pub jpeg_quality: u8,
    /// Account whose enrolled face unlocks the gallery.
    pub auth_user: String,
    /// D-Bus method timeout for the biometric check.
    pub auth_timeout_secs: u64,
    /// Prompt logged alongside each unlock attempt.
    pub auth_reason: String,
}

/// On-disk form. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    photo_dir: Option<PathBuf>,
    db_path: Option<PathBuf>,
    camera_device: Option<String>,
    warmup_frames: Option<usize>,
    capture_attempts: Option<usize>,
    jpeg_quality: Option<u8>,
    auth_user: Option<String>,
    auth_timeout_secs: Option<u64>,
    auth_reason: Option<String>,
}

impl Config {
    /// Load the config file (if present) and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("ROLLCALL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_home().join("rollcall/config.toml"));

        let mut config = Self::defaults();
        if path.exists() {
            config.apply_file(&path)?;
            tracing::info!(path = %path.display(), "loaded config file");
        }
        config.apply_env();
        Ok(config)
    }

    /// Built-in defaults rooted at `$XDG_DATA_HOME/rollcall`.
    pub fn defaults() -> Self {
        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home().join(".local/share"))
            .join("rollcall");

        Self {
            photo_dir: data_dir.join("photos"),
            db_path: data_dir.join("people.db"),
            camera_device: "/dev/video0".to_string(),
            warmup_frames: 4,
            capture_attempts: 10,
            jpeg_quality: rollcall_core::DEFAULT_JPEG_QUALITY,
            auth_user: std::env::var("USER").unwrap_or_else(|_| "root".to_string()),
            auth_timeout_secs: 15,
            auth_reason: rollcall_core::DEFAULT_REASON.to_string(),
        }
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: FileConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        self.merge(file);
        Ok(())
    }

    fn merge(&mut self, file: FileConfig) {
        if let Some(v) = file.photo_dir {
            self.photo_dir = v;
        }
        if let Some(v) = file.db_path {
            self.db_path = v;
        }
        if let Some(v) = file.camera_device {
            self.camera_device = v;
        }
        if let Some(v) = file.warmup_frames {
            self.warmup_frames = v;
        }
        if let Some(v) = file.capture_attempts {
            self.capture_attempts = v;
        }
        if let Some(v) = file.jpeg_quality {
            self.jpeg_quality = v;
        }
        if let Some(v) = file.auth_user {
            self.auth_user = v;
        }
        if let Some(v) = file.auth_timeout_secs {
            self.auth_timeout_secs = v;
        }
        if let Some(v) = file.auth_reason {
            self.auth_reason = v;
        }
    }

    fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Apply `ROLLCALL_*` overrides from `var`. Unparsable numbers are ignored.
    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("ROLLCALL_PHOTO_DIR") {
            self.photo_dir = PathBuf::from(v);
        }
        if let Some(v) = var("ROLLCALL_DB_PATH") {
            self.db_path = PathBuf::from(v);
        }
        if let Some(v) = var("ROLLCALL_CAMERA_DEVICE") {
            self.camera_device = v;
        }
        if let Some(v) = var("ROLLCALL_AUTH_USER") {
            self.auth_user = v;
        }
        if let Some(v) = var("ROLLCALL_AUTH_REASON") {
            self.auth_reason = v;
        }
        if let Some(v) = parse_var(&var, "ROLLCALL_WARMUP_FRAMES") {
            self.warmup_frames = v;
        }
        if let Some(v) = parse_var(&var, "ROLLCALL_CAPTURE_ATTEMPTS") {
            self.capture_attempts = v;
        }
        if let Some(v) = parse_var(&var, "ROLLCALL_JPEG_QUALITY") {
            self.jpeg_quality = v;
        }
        if let Some(v) = parse_var(&var, "ROLLCALL_AUTH_TIMEOUT_SECS") {
            self.auth_timeout_secs = v;
        }
    }
}

fn parse_var<T: std::str::FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    var(key).and_then(|v| v.parse().ok())
}

fn home() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string()))
}

fn config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home().join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::defaults();
        assert_eq!(config.jpeg_quality, 80);
        assert_eq!(config.auth_reason, "Identify yourself!");
        assert!(config.photo_dir.ends_with("rollcall/photos"));
        assert!(config.db_path.ends_with("rollcall/people.db"));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "photo_dir = \"/srv/photos\"\ncamera_device = \"/dev/video4\"\njpeg_quality = 95\n",
        )
        .unwrap();

        let mut config = Config::defaults();
        config.apply_file(&path).unwrap();
        assert_eq!(config.photo_dir, PathBuf::from("/srv/photos"));
        assert_eq!(config.camera_device, "/dev/video4");
        assert_eq!(config.jpeg_quality, 95);
        assert_eq!(config.warmup_frames, 4);
    }

    #[test]
    fn test_file_rejects_unknown_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "jpeg_qualty = 95\n").unwrap();

        let mut config = Config::defaults();
        assert!(matches!(
            config.apply_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_vars_override_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "photo_dir = \"/srv/photos\"\njpeg_quality = 95\n").unwrap();

        let vars: HashMap<&str, &str> = [
            ("ROLLCALL_PHOTO_DIR", "/run/photos"),
            ("ROLLCALL_JPEG_QUALITY", "70"),
            ("ROLLCALL_WARMUP_FRAMES", "many"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::defaults();
        config.apply_file(&path).unwrap();
        config.apply_vars(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.photo_dir, PathBuf::from("/run/photos"));
        assert_eq!(config.jpeg_quality, 70);
        // Unparsable value keeps what was there.
        assert_eq!(config.warmup_frames, 4);
    }

    #[test]
    fn test_load_precedence_defaults_file_env() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("rollcall.toml");
        std::fs::write(
            &path,
            "photo_dir = \"/srv/photos\"\ncamera_device = \"/dev/video4\"\njpeg_quality = 95\n",
        )
        .unwrap();

        // Only this test reads these keys.
        std::env::set_var("ROLLCALL_CONFIG", &path);
        std::env::set_var("ROLLCALL_PHOTO_DIR", "/run/photos");
        std::env::set_var("ROLLCALL_JPEG_QUALITY", "60");
        let config = Config::load();
        for key in ["ROLLCALL_CONFIG", "ROLLCALL_PHOTO_DIR", "ROLLCALL_JPEG_QUALITY"] {
            std::env::remove_var(key);
        }
        let config = config.unwrap();

        assert_eq!(config.photo_dir, PathBuf::from("/run/photos"));
        assert_eq!(config.jpeg_quality, 60);
        assert_eq!(config.camera_device, "/dev/video4");
        assert_eq!(config.capture_attempts, 10);
    }
}
