//! Chart Style Module
//! Explicit styling passed into every chart function.

use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

/// Colors and sizes shared by the chart functions.
///
/// Style is plain data handed to each call rather than process-wide state,
/// so two charts in the same run can be rendered with different palettes.
/// Deserializable from JSON for the pipeline binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartStyle {
    /// Palette cycled through by series index, as RGB triples.
    pub colors: Vec<[u8; 3]>,
    pub title_font_size: u32,
    pub label_font_size: u32,
    /// Output bitmap size in pixels (width, height).
    pub figure_size: (u32, u32),
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            // steelblue, coral, firebrick
            colors: vec![[70, 130, 180], [255, 127, 80], [178, 34, 34]],
            title_font_size: 28,
            label_font_size: 15,
            figure_size: (960, 640),
        }
    }
}

impl ChartStyle {
    /// Palette color for a series index, cycling past the end.
    pub fn color(&self, index: usize) -> RGBColor {
        let [r, g, b] = if self.colors.is_empty() {
            [70, 130, 180]
        } else {
            self.colors[index % self.colors.len()]
        };
        RGBColor(r, g, b)
    }
}
