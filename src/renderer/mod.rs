//! Bar renderers.
//!
//! Every renderer consumes the same bar sequence from the aggregator; the
//! visual arrangement (classic, mirrored) is a renderer option, not a
//! separate analysis path.

pub mod terminal;
pub mod text;

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::spectrum::{BarGeometry, ScalingStrategy, SpectrumPoint, SurfaceSize};

/// Layout of the bars on the surface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BarStyle {
    /// Vertical bars growing up from the bottom edge
    #[default]
    Classic,
    /// Bars growing both ways from the vertical centre
    Mirrored,
}

impl BarStyle {
    pub fn name(&self) -> &'static str {
        match self {
            BarStyle::Classic => "Classic",
            BarStyle::Mirrored => "Mirrored",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            BarStyle::Classic => BarStyle::Mirrored,
            BarStyle::Mirrored => BarStyle::Classic,
        }
    }
}

/// Maps bar values onto the 0..1 range a renderer fills.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub full_scale: f32,
    pub sensitivity: f32,
}

impl Normalization {
    pub fn new(strategy: ScalingStrategy, sensitivity: f32) -> Self {
        Self {
            full_scale: strategy.full_scale(),
            sensitivity,
        }
    }

    pub fn level(&self, value: f32) -> f32 {
        if self.full_scale <= 0.0 {
            return 0.0;
        }
        (value * self.sensitivity / self.full_scale).clamp(0.0, 1.0)
    }
}

/// Everything a renderer needs to draw one frame.
pub struct BarFrame<'a> {
    pub points: &'a [SpectrumPoint],
    pub geometry: &'a BarGeometry,
    pub normalization: Normalization,
    /// One-line status text, for renderers that show one
    pub status: &'a str,
}

pub trait Renderer {
    /// Current drawable area, in the renderer's own units.
    fn surface_size(&self) -> Result<SurfaceSize>;

    fn render(&mut self, frame: &BarFrame) -> Result<()>;
}
