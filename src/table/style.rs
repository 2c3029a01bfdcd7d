use serde::Deserialize;
use serde::Serialize;

/// Visual style attached to a table, a row, a header or a single cell.
/// Purely cosmetic: layout decisions never look at it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleInfo {
    /// Font family name
    pub font_name: Option<String>,
    /// Font size in points
    pub font_size: Option<f64>,
    /// Font color as `RRGGBB`, `#RRGGBB` or `AARRGGBB`
    pub font_color: Option<String>,
    /// Solid background fill color, same notation as `font_color`
    pub background_color: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl StyleInfo {
    /// Returns true if the style carries no attribute at all.
    pub fn is_empty(&self) -> bool {
        self == &StyleInfo::default()
    }
}
