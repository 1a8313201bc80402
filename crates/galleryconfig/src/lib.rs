use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Marker used by hosts to flag stand-in slides that should never be shown first.
pub const PLACEHOLDER_MARKER: &str = "placeholder";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GalleryConfig {
    pub version: u32,
    #[serde(default)]
    pub default_image: Option<String>,
    #[serde(default = "default_show_controls")]
    pub show_controls: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub transition: TransitionSettings,
    #[serde(default)]
    pub autoplay: Option<AutoplaySettings>,
    #[serde(default)]
    pub intro: IntroSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransitionSettings {
    #[serde(
        default = "default_transition_duration",
        deserialize_with = "deserialize_duration"
    )]
    pub duration: Duration,
    #[serde(default)]
    pub easing: EasingSetting,
    #[serde(default)]
    pub effect: EffectSetting,
    #[serde(default = "default_distortion")]
    pub distortion: f32,
    /// Fragment shader file used when `effect = "custom"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shader: Option<PathBuf>,
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            duration: default_transition_duration(),
            easing: EasingSetting::default(),
            effect: EffectSetting::default(),
            distortion: default_distortion(),
            shader: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EasingSetting {
    Linear,
    Smoothstep,
    EaseInOut,
    #[default]
    EaseInOutCubic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EffectSetting {
    #[default]
    FisheyeBlend,
    FisheyeCut,
    FisheyeSpin,
    PolarWarp,
    Sphere,
    Custom,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AutoplaySettings {
    #[serde(deserialize_with = "deserialize_duration")]
    pub interval: Duration,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IntroSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub images: Vec<String>,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            version: 1,
            default_image: None,
            show_controls: default_show_controls(),
            images: Vec::new(),
            transition: TransitionSettings::default(),
            autoplay: None,
            intro: IntroSettings::default(),
        }
    }
}

fn default_show_controls() -> bool {
    true
}

fn default_transition_duration() -> Duration {
    Duration::from_millis(1200)
}

fn default_distortion() -> f32 {
    0.8
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_duration_opt(deserializer)
        .map(|d| d.unwrap_or_else(default_transition_duration))
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl GalleryConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: GalleryConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&contents)?;
        config.resolve_relative_paths(path.parent().unwrap_or_else(|| Path::new(".")));
        Ok(config)
    }

    /// Autoplay interval, if autoplay is configured.
    pub fn autoplay_interval(&self) -> Option<Duration> {
        self.autoplay.as_ref().map(|autoplay| autoplay.interval)
    }

    /// Images the intro plays through; falls back to the main list.
    pub fn intro_images(&self) -> &[String] {
        if self.intro.images.is_empty() {
            &self.images
        } else {
            &self.intro.images
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.transition.duration.is_zero() {
            return Err(ConfigError::Invalid(
                "transition.duration must be greater than zero".into(),
            ));
        }

        let distortion = self.transition.distortion;
        if !distortion.is_finite() || distortion < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "transition.distortion must be a finite value >= 0 (got {distortion})"
            )));
        }

        match (self.transition.effect, &self.transition.shader) {
            (EffectSetting::Custom, None) => {
                return Err(ConfigError::Invalid(
                    "transition.effect = \"custom\" requires transition.shader".into(),
                ));
            }
            (effect, Some(_)) if effect != EffectSetting::Custom => {
                return Err(ConfigError::Invalid(
                    "transition.shader is only used with effect = \"custom\"".into(),
                ));
            }
            _ => {}
        }

        if let Some(autoplay) = &self.autoplay {
            if autoplay.interval.is_zero() {
                return Err(ConfigError::Invalid(
                    "autoplay.interval must be greater than zero".into(),
                ));
            }
        }

        for url in self.images.iter().chain(self.intro.images.iter()) {
            if url.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "image list contains an empty entry".into(),
                ));
            }
        }

        if let Some(default_image) = &self.default_image {
            if default_image.trim().is_empty() {
                return Err(ConfigError::Invalid("default_image may not be empty".into()));
            }
        }

        Ok(())
    }

    /// Rewrites relative file entries so they resolve against `base`.
    pub fn resolve_relative_paths(&mut self, base: &Path) {
        let resolve = |entry: &mut String| {
            if is_relative_path(entry) {
                *entry = base.join(entry.as_str()).to_string_lossy().into_owned();
            }
        };
        self.images.iter_mut().for_each(resolve);
        self.intro.images.iter_mut().for_each(resolve);
        if let Some(default_image) = self.default_image.as_mut() {
            resolve(default_image);
        }
        if let Some(shader) = self.transition.shader.as_mut() {
            if shader.is_relative() {
                *shader = base.join(&*shader);
            }
        }
    }
}

fn is_relative_path(entry: &str) -> bool {
    if entry.contains("://") {
        return false;
    }
    Path::new(entry).is_relative()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1
default_image = "images/fallback.jpg"
show_controls = false
images = ["images/placeholder-1.jpg", "images/a.jpg", "https://example.com/b.jpg"]

[transition]
duration = "1.5s"
easing = "smoothstep"
effect = "polar-warp"
distortion = 0.6

[autoplay]
interval = "6s"

[intro]
enabled = true
"#;

    #[test]
    fn parses_sample_config() {
        let config = GalleryConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.version, 1);
        assert!(!config.show_controls);
        assert_eq!(config.images.len(), 3);
        assert_eq!(config.transition.duration, Duration::from_millis(1500));
        assert_eq!(config.transition.easing, EasingSetting::Smoothstep);
        assert_eq!(config.transition.effect, EffectSetting::PolarWarp);
        assert!((config.transition.distortion - 0.6).abs() < f32::EPSILON);
        assert_eq!(
            config.autoplay.as_ref().map(|a| a.interval),
            Some(Duration::from_secs(6))
        );
        assert!(config.intro.enabled);
        assert_eq!(config.intro_images(), config.images.as_slice());
    }

    #[test]
    fn applies_defaults_for_missing_sections() {
        let config = GalleryConfig::from_toml_str("version = 1\n").unwrap();
        assert!(config.show_controls);
        assert_eq!(config.transition.duration, Duration::from_millis(1200));
        assert_eq!(config.transition.easing, EasingSetting::EaseInOutCubic);
        assert_eq!(config.transition.effect, EffectSetting::FisheyeBlend);
        assert!((config.transition.distortion - 0.8).abs() < f32::EPSILON);
        assert!(config.autoplay.is_none());
        assert!(!config.intro.enabled);
    }

    #[test]
    fn autoplay_interval_follows_the_table() {
        let mut config = GalleryConfig::default();
        assert_eq!(config.autoplay_interval(), None);
        config.autoplay = Some(AutoplaySettings {
            interval: Duration::from_secs(4),
        });
        assert_eq!(config.autoplay_interval(), Some(Duration::from_secs(4)));
    }

    #[test]
    fn rejects_unknown_version() {
        let err = GalleryConfig::from_toml_str("version = 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_duration() {
        let err = GalleryConfig::from_toml_str(
            r#"
version = 1
[transition]
duration = 0
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_custom_effect_without_shader() {
        let err = GalleryConfig::from_toml_str(
            r#"
version = 1
[transition]
effect = "custom"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_empty_image_entry() {
        let err = GalleryConfig::from_toml_str("version = 1\nimages = [\"a.jpg\", \" \"]\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_effect() {
        let err = GalleryConfig::from_toml_str(
            r#"
version = 1
[transition]
effect = "wobble"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_resolves_relative_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
version = 1
images = ["photos/a.jpg", "https://example.com/b.jpg", "/abs/c.jpg"]
[transition]
effect = "custom"
shader = "shaders/mine.frag"
"#,
        )
        .unwrap();

        let config = GalleryConfig::load(&path).unwrap();
        assert_eq!(
            Path::new(&config.images[0]),
            dir.path().join("photos/a.jpg")
        );
        assert_eq!(config.images[1], "https://example.com/b.jpg");
        assert_eq!(config.images[2], "/abs/c.jpg");
        assert_eq!(
            config.transition.shader.as_deref(),
            Some(dir.path().join("shaders/mine.frag").as_path())
        );
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = GalleryConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
