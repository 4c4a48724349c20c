use serde::{Deserialize, Serialize};

/// Line height factor used by the interchange format for its default font families.
pub const DEFAULT_LINE_HEIGHT: f64 = 1.25;
/// Average glyph advance relative to the font size.
pub const DEFAULT_CHAR_WIDTH: f64 = 0.6;
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_family: Option<String>,
    pub font_size: f64,
    pub line_height: Option<f64>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: None,
            font_size: DEFAULT_FONT_SIZE,
            line_height: None,
        }
    }
}

impl TextStyle {
    pub fn with_font_size(font_size: f64) -> Self {
        Self {
            font_size,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub line_count: usize,
    /// Line height as a multiple of the font size.
    pub line_height: f64,
}

pub trait TextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics;
}

/// Closed-form text metrics: `max_chars * size * 0.6` by `lines * size * 1.25`.
///
/// This stands in for a browser layout engine. It is deterministic and font-agnostic, which is
/// what the scene pipeline needs; it does not try to match any particular font renderer.
#[derive(Debug, Clone)]
pub struct DeterministicTextMeasurer {
    pub char_width_factor: f64,
    pub line_height_factor: f64,
}

impl Default for DeterministicTextMeasurer {
    fn default() -> Self {
        Self {
            char_width_factor: DEFAULT_CHAR_WIDTH,
            line_height_factor: DEFAULT_LINE_HEIGHT,
        }
    }
}

impl DeterministicTextMeasurer {
    pub fn text_lines(text: &str) -> Vec<&str> {
        // `split` (not `lines`) so a trailing newline still counts as an (empty) line.
        text.split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect()
    }
}

impl TextMeasurer for DeterministicTextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let line_height_factor = match style.line_height {
            Some(v) if v.is_finite() && v > 0.0 => v,
            _ => self.line_height_factor,
        };

        let lines = Self::text_lines(text);
        let font_size = if style.font_size.is_finite() {
            style.font_size.max(0.0)
        } else {
            DEFAULT_FONT_SIZE
        };
        let max_chars = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);

        TextMetrics {
            width: max_chars as f64 * font_size * self.char_width_factor,
            height: lines.len() as f64 * font_size * line_height_factor,
            line_count: lines.len(),
            line_height: line_height_factor,
        }
    }
}
