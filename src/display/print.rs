use anyhow::Result;
use std::io::{stdout, Write};
use std::time::Duration;
use tracing::info;

use super::Session;
use crate::audio::FftSource;
use crate::config::Config;
use crate::renderer::text::TextRenderer;
use crate::renderer::{BarFrame, Normalization, Renderer};
use crate::spectrum::{Frame, LineSpectrum};

pub async fn run(config: Config) -> Result<()> {
    let mut session = Session::start(&config)?;
    let mut renderer =
        TextRenderer::new(stdout().lock(), config.display.numeric, config.display.columns);

    let mut interval = tokio::time::interval(Duration::from_secs_f64(
        1.0 / config.display.fps.max(1) as f64,
    ));
    let mut printed = 0;

    while printed < config.display.frames {
        interval.tick().await;
        let spectrum = &mut session.spectrum;
        if print_fresh_frame(spectrum, &mut session.source, &mut renderer, &config, printed)? {
            printed += 1;
        }
    }
    renderer.into_inner().flush()?;

    info!("Printed {} frames", printed);
    Ok(())
}

/// Runs one tick and prints the bars if they came from fresh data.
/// Returns whether a line was printed.
fn print_fresh_frame<W: Write>(
    spectrum: &mut LineSpectrum,
    source: &mut dyn FftSource,
    renderer: &mut TextRenderer<W>,
    config: &Config,
    index: usize,
) -> Result<bool> {
    let size = renderer.surface_size()?;
    if !matches!(spectrum.tick(source, size), Frame::Fresh(_)) {
        return Ok(false);
    }
    let Some(geometry) = spectrum.geometry() else {
        return Ok(false);
    };

    let status = format!("{:>5}", index);
    let strategy = spectrum.config().scaling_strategy();
    renderer.render(&BarFrame {
        points: spectrum.points(),
        geometry,
        normalization: Normalization::new(strategy, config.display.sensitivity),
        status: &status,
    })?;
    Ok(true)
}
