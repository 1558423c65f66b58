use anyhow::Result;
use ratatui::buffer::Buffer;
use ratatui::prelude::*;
use std::io::Stdout;

use super::{BarFrame, BarStyle, Renderer};
use crate::color::ColorScheme;
use crate::spectrum::SurfaceSize;

/// Rows reserved above the bars for the status line.
const STATUS_ROWS: u16 = 1;

/// Draws bars as colored block cells in the terminal.
pub struct TerminalRenderer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub style: BarStyle,
    pub color_scheme: ColorScheme,
}

impl TerminalRenderer {
    pub fn new(
        terminal: Terminal<CrosstermBackend<Stdout>>,
        style: BarStyle,
        color_scheme: ColorScheme,
    ) -> Self {
        Self {
            terminal,
            style,
            color_scheme,
        }
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<CrosstermBackend<Stdout>> {
        &mut self.terminal
    }
}

impl Renderer for TerminalRenderer {
    fn surface_size(&self) -> Result<SurfaceSize> {
        let size = self.terminal.size()?;
        Ok(SurfaceSize::new(
            size.width as f64,
            size.height.saturating_sub(STATUS_ROWS) as f64,
        ))
    }

    fn render(&mut self, frame: &BarFrame) -> Result<()> {
        let style = self.style;
        let color_scheme = self.color_scheme;

        self.terminal.draw(|f| {
            let area = f.area();

            // Clear with reset background for terminal transparency support
            let block = ratatui::widgets::Block::default().style(Style::default().bg(Color::Reset));
            f.render_widget(block, area);

            let status_area = Rect::new(area.x, area.y, area.width, STATUS_ROWS.min(area.height));
            let bars_area = Rect::new(
                area.x,
                area.y + status_area.height,
                area.width,
                area.height - status_area.height,
            );

            draw_status(f.buffer_mut(), status_area, frame.status);
            draw_bars(f.buffer_mut(), bars_area, frame, style, color_scheme);
        })?;
        Ok(())
    }
}

fn draw_status(buffer: &mut Buffer, area: Rect, status: &str) {
    if area.height == 0 {
        return;
    }
    for (i, ch) in status.chars().take(area.width as usize).enumerate() {
        if let Some(cell) = buffer.cell_mut((area.x + i as u16, area.y)) {
            cell.set_char(ch);
            cell.set_fg(Color::DarkGray);
        }
    }
}

/// Draws `frame`'s bars into `area` of `buffer`.
pub fn draw_bars(
    buffer: &mut Buffer,
    area: Rect,
    frame: &BarFrame,
    style: BarStyle,
    color_scheme: ColorScheme,
) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let geometry = frame.geometry;
    let bar_columns = (geometry.bar_width.floor() as u16).max(1);
    let bar_count = geometry.bar_count.max(1);

    for point in frame.points {
        let level = frame.normalization.level(point.value);
        let x_start = area.x + geometry.x_start(point.bar_index).floor() as u16;
        let position = point.bar_index as f32 / bar_count as f32;

        let (base_y, cells_up, cells_down) = match style {
            BarStyle::Classic => {
                let cells = (level * area.height as f32).round() as u16;
                (area.y + area.height - 1, cells.min(area.height), 0)
            }
            BarStyle::Mirrored => {
                let half = area.height / 2;
                let cells = (level * half as f32).round() as u16;
                (area.y + half, cells.min(half + 1), cells.min(area.height - half - 1))
            }
        };

        for offset in 0..cells_up {
            let height = offset as f32 / area.height as f32;
            let color = color_scheme.bar_color(position, height);
            fill_row(buffer, area, x_start, bar_columns, base_y - offset, color);
        }
        for offset in 1..=cells_down {
            let height = offset as f32 / area.height as f32;
            let color = color_scheme.bar_color(position, height);
            fill_row(buffer, area, x_start, bar_columns, base_y + offset, color);
        }
    }
}

fn fill_row(
    buffer: &mut Buffer,
    area: Rect,
    x_start: u16,
    columns: u16,
    y: u16,
    (r, g, b): (u8, u8, u8),
) {
    if y < area.y || y >= area.y + area.height {
        return;
    }
    for x in x_start..x_start.saturating_add(columns) {
        if x >= area.x + area.width {
            break;
        }
        if let Some(cell) = buffer.cell_mut((x, y)) {
            cell.set_char('█');
            cell.set_fg(Color::Rgb(r, g, b));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::Normalization;
    use crate::spectrum::{BarGeometry, ScalingStrategy, SpectrumPoint};

    fn column_height(buffer: &Buffer, x: u16, area: Rect) -> usize {
        (area.y..area.y + area.height)
            .filter(|&y| buffer[(x, y)].symbol() == "█")
            .count()
    }

    fn points(values: &[f32]) -> Vec<SpectrumPoint> {
        values
            .iter()
            .enumerate()
            .map(|(bar_index, &value)| SpectrumPoint { bar_index, value })
            .collect()
    }

    #[test]
    fn classic_bars_grow_from_bottom() {
        let area = Rect::new(0, 0, 13, 10);
        let mut buffer = Buffer::empty(area);
        let geometry = BarGeometry::new(13.0, 4, 1.0);
        let points = points(&[0.0, 0.5, 1.0, 2.0]);
        let frame = BarFrame {
            points: &points,
            geometry: &geometry,
            normalization: Normalization::new(ScalingStrategy::Linear, 1.0),
            status: "",
        };

        draw_bars(&mut buffer, area, &frame, BarStyle::Classic, ColorScheme::Green);

        // bar width 2, bars start at columns 1, 4, 7, 10
        assert_eq!(column_height(&buffer, 1, area), 0);
        assert_eq!(column_height(&buffer, 4, area), 5);
        assert_eq!(column_height(&buffer, 5, area), 5);
        assert_eq!(column_height(&buffer, 7, area), 10);
        assert_eq!(column_height(&buffer, 10, area), 10);
        assert_eq!(column_height(&buffer, 0, area), 0);
        assert_eq!(buffer[(4, 9)].symbol(), "█");
        assert_eq!(buffer[(4, 4)].symbol(), " ");
    }

    #[test]
    fn mirrored_bars_straddle_centre() {
        let area = Rect::new(0, 0, 4, 10);
        let mut buffer = Buffer::empty(area);
        let geometry = BarGeometry::new(4.0, 1, 1.0);
        let points = points(&[0.4]);
        let frame = BarFrame {
            points: &points,
            geometry: &geometry,
            normalization: Normalization::new(ScalingStrategy::Linear, 1.0),
            status: "",
        };

        draw_bars(&mut buffer, area, &frame, BarStyle::Mirrored, ColorScheme::Rainbow);

        // level 0.4 of half height 5 = 2 cells each way around row 5
        assert_eq!(column_height(&buffer, 1, area), 4);
        assert_eq!(buffer[(1, 5)].symbol(), "█");
        assert_eq!(buffer[(1, 3)].symbol(), " ");
        assert_eq!(buffer[(1, 7)].symbol(), "█");
    }

    #[test]
    fn status_is_clipped_to_width() {
        let area = Rect::new(0, 0, 5, 1);
        let mut buffer = Buffer::empty(area);
        draw_status(&mut buffer, area, "bars: 64");
        assert_eq!(buffer[(0, 0)].symbol(), "b");
        assert_eq!(buffer[(4, 0)].symbol(), ":");
    }
}
