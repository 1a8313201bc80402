use std::fs;

use anyhow::{bail, Context, Result};
use gallery::{Easing, Effect, GalleryOptions, TransitionConfig, WindowOptions};
use galleryconfig::{AutoplaySettings, EasingSetting, EffectSetting, GalleryConfig};
use tracing::{debug, info};

use crate::cli::Args;
use crate::paths::AppPaths;

const DEFAULT_SURFACE_SIZE: (u32, u32) = (1280, 720);

/// Finds the config: `--config`, then the user config file, then defaults.
pub fn load_config(args: &Args, paths: &AppPaths) -> Result<GalleryConfig> {
    if let Some(path) = args.config.as_ref() {
        let config = GalleryConfig::load(path)
            .with_context(|| format!("failed to load gallery config at {}", path.display()))?;
        info!(path = %path.display(), images = config.images.len(), "loaded gallery config");
        return Ok(config);
    }

    let user_file = paths.config_file();
    if user_file.is_file() {
        let config = GalleryConfig::load(&user_file).with_context(|| {
            format!("failed to load gallery config at {}", user_file.display())
        })?;
        info!(path = %user_file.display(), images = config.images.len(), "loaded gallery config");
        return Ok(config);
    }

    debug!(path = %user_file.display(), "no gallery config found; using defaults");
    Ok(GalleryConfig::default())
}

/// Applies command-line flags on top of the config and re-validates it.
pub fn apply_overrides(mut config: GalleryConfig, args: &Args) -> Result<GalleryConfig> {
    if !args.images.is_empty() {
        config.images = args.images.clone();
    }
    if let Some(default_image) = args.default_image.as_ref() {
        config.default_image = Some(default_image.clone());
    }
    if let Some(effect) = args.effect {
        config.transition.effect = effect;
        if effect != EffectSetting::Custom {
            config.transition.shader = None;
        }
    }
    if let Some(shader) = args.shader.as_ref() {
        config.transition.shader = Some(shader.clone());
        if args.effect.is_none() {
            config.transition.effect = EffectSetting::Custom;
        }
    }
    if let Some(duration) = args.duration {
        config.transition.duration = duration;
    }
    if let Some(easing) = args.easing {
        config.transition.easing = easing;
    }
    if let Some(distortion) = args.distortion {
        config.transition.distortion = distortion;
    }
    if args.no_controls {
        config.show_controls = false;
    }
    if args.intro {
        config.intro.enabled = true;
    }
    if let Some(interval) = args.autoplay {
        config.autoplay = Some(AutoplaySettings { interval });
    }

    config.validate().context("invalid gallery settings")?;
    Ok(config)
}

pub fn map_easing(easing: EasingSetting) -> Easing {
    match easing {
        EasingSetting::Linear => Easing::Linear,
        EasingSetting::Smoothstep => Easing::Smoothstep,
        EasingSetting::EaseInOut => Easing::EaseInOut,
        EasingSetting::EaseInOutCubic => Easing::EaseInOutCubic,
    }
}

pub fn resolve_effect(config: &GalleryConfig) -> Result<Effect> {
    let effect = match config.transition.effect {
        EffectSetting::FisheyeBlend => Effect::FisheyeBlend,
        EffectSetting::FisheyeCut => Effect::FisheyeCut,
        EffectSetting::FisheyeSpin => Effect::FisheyeSpin,
        EffectSetting::PolarWarp => Effect::PolarWarp,
        EffectSetting::Sphere => Effect::Sphere,
        EffectSetting::Custom => {
            let Some(path) = config.transition.shader.as_ref() else {
                bail!("custom effect requires a shader file");
            };
            let body = fs::read_to_string(path)
                .with_context(|| format!("failed to read shader at {}", path.display()))?;
            info!(path = %path.display(), "loaded custom effect");
            Effect::Custom { body }
        }
    };
    Ok(effect)
}

/// Builds the preview window settings for a validated config.
pub fn window_options(config: &GalleryConfig, size: Option<&str>) -> Result<WindowOptions> {
    let size = size
        .map(parse_surface_size)
        .transpose()?
        .unwrap_or(DEFAULT_SURFACE_SIZE);
    let intro = if config.intro.enabled {
        config.intro_images().to_vec()
    } else {
        Vec::new()
    };

    Ok(WindowOptions {
        title: "Orbview".to_string(),
        size,
        show_controls: config.show_controls,
        gallery: GalleryOptions {
            effect: resolve_effect(config)?,
            transition: TransitionConfig {
                duration: config.transition.duration,
                easing: map_easing(config.transition.easing),
            },
            distortion: config.transition.distortion,
            intro,
        },
    })
}

pub fn parse_surface_size(spec: &str) -> Result<(u32, u32)> {
    let trimmed = spec.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| anyhow::anyhow!("expected WxH format, e.g. 1280x720"))?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid width in size specification"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid height in size specification"))?;

    if width == 0 || height == 0 {
        anyhow::bail!("surface dimensions must be greater than zero");
    }

    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_surface_sizes() {
        assert_eq!(parse_surface_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_surface_size(" 800 X 600 ").unwrap(), (800, 600));
        assert_eq!(parse_surface_size("640×480").unwrap(), (640, 480));
        assert!(parse_surface_size("0x10").is_err());
        assert!(parse_surface_size("wide").is_err());
    }

    #[test]
    fn explicit_config_path_is_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gallery.toml");
        fs::write(&path, "version = 1\nimages = [\"a.jpg\"]\n").unwrap();
        let args = Args {
            config: Some(path),
            ..Args::default()
        };
        let paths = AppPaths::from_raw(dir.path().join("unused"));

        let config = load_config(&args, &paths).unwrap();

        assert_eq!(config.images, vec![dir.path().join("a.jpg").to_string_lossy().into_owned()]);
    }

    #[test]
    fn user_config_file_is_discovered() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            "version = 1\nshow_controls = false\nimages = [\"https://example.com/a.jpg\"]\n",
        )
        .unwrap();
        let paths = AppPaths::from_raw(dir.path().to_path_buf());

        let config = load_config(&Args::default(), &paths).unwrap();

        assert!(!config.show_controls);
        assert_eq!(config.images, vec!["https://example.com/a.jpg".to_string()]);
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let paths = AppPaths::from_raw(dir.path().join("absent"));
        let config = load_config(&Args::default(), &paths).unwrap();
        assert!(config.images.is_empty());
        assert!(config.show_controls);
    }

    #[test]
    fn flags_override_config_values() {
        let args = Args {
            images: vec!["x.png".into(), "y.png".into()],
            duration: Some(Duration::from_millis(500)),
            no_controls: true,
            intro: true,
            autoplay: Some(Duration::from_secs(3)),
            effect: Some(EffectSetting::Sphere),
            ..Args::default()
        };
        let config = apply_overrides(GalleryConfig::default(), &args).unwrap();

        assert_eq!(config.images, vec!["x.png".to_string(), "y.png".to_string()]);
        assert_eq!(config.transition.duration, Duration::from_millis(500));
        assert_eq!(config.transition.effect, EffectSetting::Sphere);
        assert!(!config.show_controls);
        assert!(config.intro.enabled);
        assert_eq!(
            config.autoplay.map(|autoplay| autoplay.interval),
            Some(Duration::from_secs(3))
        );
    }

    #[test]
    fn shader_flag_selects_the_custom_effect() {
        let dir = TempDir::new().unwrap();
        let shader = dir.path().join("effect.frag");
        fs::write(&shader, "void main() { outColor = vec4(1.0); }\n").unwrap();
        let args = Args {
            shader: Some(shader),
            ..Args::default()
        };
        let config = apply_overrides(GalleryConfig::default(), &args).unwrap();
        assert_eq!(config.transition.effect, EffectSetting::Custom);

        let effect = resolve_effect(&config).unwrap();
        assert!(matches!(effect, Effect::Custom { ref body } if body.contains("outColor")));
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let args = Args {
            distortion: Some(-1.0),
            ..Args::default()
        };
        assert!(apply_overrides(GalleryConfig::default(), &args).is_err());
    }

    #[test]
    fn window_options_carry_intro_and_easing() {
        let mut config = GalleryConfig::default();
        config.images = vec!["a.jpg".into(), "b.jpg".into()];
        config.intro.enabled = true;
        config.transition.easing = EasingSetting::Linear;

        let options = window_options(&config, Some("640x480")).unwrap();

        assert_eq!(options.size, (640, 480));
        assert_eq!(options.gallery.intro, config.images);
        assert_eq!(options.gallery.transition.easing, Easing::Linear);
        assert_eq!(options.gallery.effect, Effect::FisheyeBlend);
    }
}
