use std::time::Instant;

use anyhow::Result;
use gallery::{run_window, ImageCache};
use tracing_subscriber::EnvFilter;

use crate::bootstrap::{apply_overrides, load_config, window_options};
use crate::cli::Args;
use crate::paths::AppPaths;
use crate::source::CarouselSource;

pub fn run(args: Args) -> Result<()> {
    initialise_tracing();

    let paths = AppPaths::discover()?;
    tracing::debug!(config = %paths.config_dir().display(), "resolved orbview paths");

    let config = load_config(&args, &paths)?;
    let config = apply_overrides(config, &args)?;
    let options = window_options(&config, args.size.as_deref())?;
    let source = CarouselSource::from_config(&config, Instant::now());

    tracing::info!(
        images = source.slide_count(),
        effect = options.gallery.effect.name(),
        duration_ms = config.transition.duration.as_millis() as u64,
        intro = !options.gallery.intro.is_empty(),
        autoplay = config.autoplay.is_some(),
        "starting orbview"
    );

    run_window(options, ImageCache::new(), source)
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
