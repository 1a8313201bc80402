use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use galleryconfig::{EasingSetting, EffectSetting};

#[derive(Parser, Debug, Default)]
#[command(
    name = "orbview",
    author,
    version,
    about = "Fisheye image gallery with animated transitions",
    arg_required_else_help = false
)]
pub struct Args {
    /// Images to show (file paths or http(s) URLs); replaces the configured list.
    #[arg(value_name = "IMAGE")]
    pub images: Vec<String>,

    /// Gallery config file; defaults to `config.toml` in the user config directory.
    #[arg(long, value_name = "PATH", env = "ORBVIEW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Image shown when the list is empty.
    #[arg(long, value_name = "IMAGE")]
    pub default_image: Option<String>,

    /// Transition effect: fisheye-blend, fisheye-cut, fisheye-spin, polar-warp, sphere or custom.
    #[arg(long, value_name = "EFFECT", value_parser = parse_effect)]
    pub effect: Option<EffectSetting>,

    /// Fragment body for `--effect custom`.
    #[arg(long, value_name = "PATH")]
    pub shader: Option<PathBuf>,

    /// Transition length (e.g. `1.2s`, `800ms`).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Transition easing: linear, smoothstep, ease-in-out or ease-in-out-cubic.
    #[arg(long, value_name = "EASING", value_parser = parse_easing)]
    pub easing: Option<EasingSetting>,

    /// Fisheye distortion level.
    #[arg(long, value_name = "LEVEL")]
    pub distortion: Option<f32>,

    /// Window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Disable keyboard and mouse-button navigation.
    #[arg(long)]
    pub no_controls: bool,

    /// Spin through every image before the first slide.
    #[arg(long)]
    pub intro: bool,

    /// Advance automatically after this long without navigation.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub autoplay: Option<Duration>,
}

pub fn parse() -> Args {
    Args::parse()
}

pub fn parse_effect(value: &str) -> Result<EffectSetting, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("effect must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "fisheye-blend" | "fisheye" | "blend" => Ok(EffectSetting::FisheyeBlend),
        "fisheye-cut" | "cut" => Ok(EffectSetting::FisheyeCut),
        "fisheye-spin" | "spin" => Ok(EffectSetting::FisheyeSpin),
        "polar-warp" | "warp" => Ok(EffectSetting::PolarWarp),
        "sphere" => Ok(EffectSetting::Sphere),
        "custom" => Ok(EffectSetting::Custom),
        other => Err(format!(
            "unknown effect '{other}'; expected fisheye-blend, fisheye-cut, fisheye-spin, polar-warp, sphere, or custom"
        )),
    }
}

pub fn parse_easing(value: &str) -> Result<EasingSetting, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("easing must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase().replace('_', "-");
    match normalized.as_str() {
        "linear" => Ok(EasingSetting::Linear),
        "smoothstep" => Ok(EasingSetting::Smoothstep),
        "ease-in-out" | "quad" => Ok(EasingSetting::EaseInOut),
        "ease-in-out-cubic" | "cubic" => Ok(EasingSetting::EaseInOutCubic),
        other => Err(format!(
            "unknown easing '{other}'; expected linear, smoothstep, ease-in-out, or ease-in-out-cubic"
        )),
    }
}

pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let duration = humantime::parse_duration(value.trim())
        .map_err(|err| format!("invalid duration '{value}': {err}"))?;
    if duration.is_zero() {
        return Err("duration must be greater than zero".to_string());
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_effect_aliases() {
        assert_eq!(parse_effect("Sphere").unwrap(), EffectSetting::Sphere);
        assert_eq!(parse_effect(" warp ").unwrap(), EffectSetting::PolarWarp);
        assert!(parse_effect("wobble").is_err());
        assert!(parse_effect("").is_err());
    }

    #[test]
    fn parses_easing_names() {
        assert_eq!(parse_easing("ease_in_out").unwrap(), EasingSetting::EaseInOut);
        assert_eq!(parse_easing("cubic").unwrap(), EasingSetting::EaseInOutCubic);
        assert!(parse_easing("bounce").is_err());
    }

    #[test]
    fn durations_must_be_positive() {
        assert_eq!(parse_duration("800ms").unwrap(), Duration::from_millis(800));
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn positional_images_and_flags() {
        let args = Args::try_parse_from([
            "orbview",
            "a.jpg",
            "https://example.com/b.png",
            "--effect",
            "cut",
            "--no-controls",
            "--autoplay",
            "5s",
        ])
        .unwrap();
        assert_eq!(args.images.len(), 2);
        assert_eq!(args.effect, Some(EffectSetting::FisheyeCut));
        assert!(args.no_controls);
        assert_eq!(args.autoplay, Some(Duration::from_secs(5)));
    }
}
