use anyhow::Result;
use std::io::Write;

use super::{BarFrame, Renderer};
use crate::spectrum::SurfaceSize;

/// Eighth-block glyphs, empty to full.
const LEVELS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Writes one line per frame: a block glyph per bar, or the raw values.
pub struct TextRenderer<W: Write> {
    out: W,
    numeric: bool,
    columns: u16,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W, numeric: bool, columns: u16) -> Self {
        Self {
            out,
            numeric,
            columns,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn surface_size(&self) -> Result<SurfaceSize> {
        Ok(SurfaceSize::new(self.columns as f64, 1.0))
    }

    fn render(&mut self, frame: &BarFrame) -> Result<()> {
        let line: String = if self.numeric {
            frame
                .points
                .iter()
                .map(|p| format!("{:.3}", p.value))
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            frame
                .points
                .iter()
                .map(|p| {
                    let level = frame.normalization.level(p.value);
                    LEVELS[(level * (LEVELS.len() - 1) as f32).round() as usize]
                })
                .collect()
        };

        if frame.status.is_empty() {
            writeln!(self.out, "{}", line)?;
        } else {
            writeln!(self.out, "{} |{}|", frame.status, line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::Normalization;
    use crate::spectrum::{BarGeometry, ScalingStrategy, SpectrumPoint};

    fn render(numeric: bool, values: &[f32], status: &str) -> String {
        let points: Vec<SpectrumPoint> = values
            .iter()
            .enumerate()
            .map(|(bar_index, &value)| SpectrumPoint { bar_index, value })
            .collect();
        let geometry = BarGeometry::new(values.len() as f64, values.len(), 0.0);
        let frame = BarFrame {
            points: &points,
            geometry: &geometry,
            normalization: Normalization::new(ScalingStrategy::Linear, 1.0),
            status,
        };

        let mut renderer = TextRenderer::new(Vec::new(), numeric, 80);
        renderer.render(&frame).unwrap();
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn glyph_per_bar() {
        assert_eq!(render(false, &[0.0, 0.5, 1.0, 4.0], ""), " ▄██\n");
    }

    #[test]
    fn surface_is_one_row() {
        let renderer = TextRenderer::new(Vec::new(), false, 120);
        assert_eq!(renderer.surface_size().unwrap(), SurfaceSize::new(120.0, 1.0));
    }

    #[test]
    fn numeric_values_with_status() {
        assert_eq!(render(true, &[0.25, 1.0], "#1"), "#1 |0.250 1.000|\n");
    }
}
