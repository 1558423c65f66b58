use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::stdout;
use std::time::Duration;
use tracing::{debug, info};

use super::Session;
use crate::config::Config;
use crate::renderer::terminal::TerminalRenderer;
use crate::renderer::{BarFrame, Normalization, Renderer};
use crate::spectrum::frequency::{bin_width, index_to_frequency};
use crate::spectrum::{ConfigError, Frame, LineSpectrum};

const MIN_BARS: usize = 1;
const MAX_BARS: usize = 512;

pub async fn run(config: Config) -> Result<()> {
    // Validate and start before touching the terminal so errors print normally
    let mut session = Session::start(&config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut renderer =
        TerminalRenderer::new(terminal, config.display.style, config.display.color_scheme);
    let result = run_app(&mut renderer, &mut session, &config);

    // Restore terminal
    disable_raw_mode()?;
    let terminal = renderer.terminal_mut();
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Quit,
    NextStyle,
    NextColors,
    NextScaling,
    ToggleLogAxis,
    ToggleAverage,
    MoreBars,
    FewerBars,
    LowerMaxFrequency,
    RaiseMaxFrequency,
    NarrowerSpacing,
    WiderSpacing,
    None,
}

fn action_for(key: KeyEvent) -> Action {
    match key {
        KeyEvent {
            code: KeyCode::Char('q'),
            ..
        }
        | KeyEvent {
            code: KeyCode::Esc, ..
        }
        | KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            ..
        } => Action::Quit,
        KeyEvent {
            code: KeyCode::Char('s'),
            ..
        } => Action::NextStyle,
        KeyEvent {
            code: KeyCode::Char('c'),
            ..
        } => Action::NextColors,
        KeyEvent {
            code: KeyCode::Char('x'),
            ..
        } => Action::NextScaling,
        KeyEvent {
            code: KeyCode::Char('l'),
            ..
        } => Action::ToggleLogAxis,
        KeyEvent {
            code: KeyCode::Char('a'),
            ..
        } => Action::ToggleAverage,
        KeyEvent {
            code: KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Up,
            ..
        } => Action::MoreBars,
        KeyEvent {
            code: KeyCode::Char('-') | KeyCode::Down,
            ..
        } => Action::FewerBars,
        KeyEvent {
            code: KeyCode::Char('['),
            ..
        } => Action::LowerMaxFrequency,
        KeyEvent {
            code: KeyCode::Char(']'),
            ..
        } => Action::RaiseMaxFrequency,
        KeyEvent {
            code: KeyCode::Char('<') | KeyCode::Char(','),
            ..
        } => Action::NarrowerSpacing,
        KeyEvent {
            code: KeyCode::Char('>') | KeyCode::Char('.'),
            ..
        } => Action::WiderSpacing,
        _ => Action::None,
    }
}

/// Applies a configuration action to the spectrum.
fn apply(spectrum: &mut LineSpectrum, action: Action) -> Result<(), ConfigError> {
    let config = spectrum.config();
    match action {
        Action::NextScaling => {
            let next = config.scaling_strategy().next();
            spectrum.set_scaling_strategy(next);
        }
        Action::ToggleLogAxis => {
            let enabled = !config.use_logarithmic_x_axis();
            spectrum.set_logarithmic_x_axis(enabled)?;
        }
        Action::ToggleAverage => {
            let enabled = !config.use_average();
            spectrum.set_use_average(enabled);
        }
        Action::MoreBars => {
            let bars = (config.bar_count() * 2).min(MAX_BARS);
            spectrum.set_bar_count(bars)?;
        }
        Action::FewerBars => {
            let bars = (config.bar_count() / 2).max(MIN_BARS);
            spectrum.set_bar_count(bars)?;
        }
        Action::LowerMaxFrequency => {
            let (min, max) = (config.minimum_frequency(), config.maximum_frequency());
            spectrum.set_frequency_range(min, max / 2.0)?;
        }
        Action::RaiseMaxFrequency => {
            let (min, max) = (config.minimum_frequency(), config.maximum_frequency());
            spectrum.set_frequency_range(min, (max * 2.0).min(config.nyquist()))?;
        }
        Action::NarrowerSpacing => {
            let spacing = spectrum.bar_spacing() - 1.0;
            spectrum.set_bar_spacing(spacing)?;
        }
        Action::WiderSpacing => {
            let spacing = spectrum.bar_spacing() + 1.0;
            spectrum.set_bar_spacing(spacing)?;
        }
        _ => {}
    }
    Ok(())
}

/// Frequencies actually covered by the bars, from the outer bin edges.
fn band_label(spectrum: &LineSpectrum) -> Option<String> {
    let config = spectrum.config();
    let (fft_size, sample_rate) = (config.fft_size(), config.sample_rate());
    let ranges = spectrum.mapping()?.ranges();
    let (first, last) = (ranges.first()?, ranges.last()?);

    Some(format!(
        "{}-{} Hz @{:.1} Hz/bin",
        index_to_frequency(first.from, fft_size, sample_rate),
        index_to_frequency(last.to, fft_size, sample_rate),
        bin_width(fft_size, sample_rate)
    ))
}

fn status_line(
    spectrum: &LineSpectrum,
    renderer: &TerminalRenderer,
    notice: Option<&str>,
) -> String {
    let config = spectrum.config();
    let mut status = format!(
        " [s]tyle: {} | [c]olor: {:?} | [x] scale: {:?} | [l]og: {} | [a]vg: {} \
         | [+/-] bars: {} | [[/]] freq: {} | [</>] gap: {} | [q]uit ",
        renderer.style.name(),
        renderer.color_scheme,
        config.scaling_strategy(),
        config.use_logarithmic_x_axis(),
        config.use_average(),
        config.bar_count(),
        band_label(spectrum).unwrap_or_default(),
        spectrum.bar_spacing()
    );
    if let Some(notice) = notice {
        status.push_str("| ");
        status.push_str(notice);
    }
    status
}

fn run_app(renderer: &mut TerminalRenderer, session: &mut Session, config: &Config) -> Result<()> {
    let target_fps = Duration::from_secs_f64(1.0 / config.display.fps.max(1) as f64);
    let sensitivity = config.display.sensitivity;
    let mut notice: Option<String> = None;

    loop {
        let size = renderer.surface_size()?;
        let tick = session.spectrum.tick(&mut session.source, size);
        let ready = !matches!(tick, Frame::NotReady);

        if ready {
            if let Some(geometry) = session.spectrum.geometry() {
                let status = status_line(&session.spectrum, renderer, notice.as_deref());
                let strategy = session.spectrum.config().scaling_strategy();
                let frame = BarFrame {
                    points: session.spectrum.points(),
                    geometry,
                    normalization: Normalization::new(strategy, sensitivity),
                    status: &status,
                };
                renderer.render(&frame)?;
            }
        }

        // Handle input
        if event::poll(target_fps)? {
            if let Event::Key(key) = event::read()? {
                match action_for(key) {
                    Action::Quit => break,
                    Action::NextStyle => renderer.style = renderer.style.next(),
                    Action::NextColors => renderer.color_scheme = renderer.color_scheme.next(),
                    Action::None => {}
                    action => match apply(&mut session.spectrum, action) {
                        Ok(()) => notice = None,
                        Err(e) => {
                            debug!("Rejected {:?}: {}", action, e);
                            notice = Some(e.to_string());
                        }
                    },
                }
            }
        }
    }

    info!("Terminal display stopped");
    Ok(())
}
