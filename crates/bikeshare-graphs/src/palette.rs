//! Chart colors and sizes derived from the styling configuration.

use crate::types::ColorRole;
use bikeshare_config::StylingConfig;
use plotters::style::RGBColor;

/// Parse a `#RRGGBB` color, falling back to black.
pub fn parse_color(color_str: &str) -> RGBColor {
    if let Some(hex) = color_str.strip_prefix('#') {
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return RGBColor(r, g, b);
            }
        }
    }
    RGBColor(0, 0, 0)
}

/// Hex string of a color, as written into SVG and HTML.
pub fn to_hex(color: RGBColor) -> String {
    format!("#{:02x}{:02x}{:02x}", color.0, color.1, color.2)
}

/// Ordered categorical palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<RGBColor>,
}

impl Palette {
    /// Builds a palette from hex strings. An empty list yields a single
    /// black entry so lookups never fail.
    pub fn from_hex<S: AsRef<str>>(colors: &[S]) -> Self {
        let mut colors: Vec<RGBColor> = colors.iter().map(|c| parse_color(c.as_ref())).collect();
        if colors.is_empty() {
            colors.push(RGBColor(0, 0, 0));
        }
        Self { colors }
    }

    /// Number of colors.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false; a palette holds at least one color.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color of the `index`-th category, cycling through the palette.
    pub fn categorical(&self, index: usize) -> RGBColor {
        self.colors[index % self.colors.len()]
    }

    /// Single-series color.
    pub fn primary(&self) -> RGBColor {
        self.colors[0]
    }

    /// Casual/registered comparison pair.
    pub fn compare(&self) -> (RGBColor, RGBColor) {
        (self.categorical(1), self.categorical(2))
    }

    /// Color for a series role; `index` picks the category for
    /// [`ColorRole::Categorical`].
    pub fn resolve(&self, role: ColorRole, index: usize) -> RGBColor {
        match role {
            ColorRole::Categorical => self.categorical(index),
            ColorRole::Primary => self.primary(),
            ColorRole::CompareFirst => self.compare().0,
            ColorRole::CompareSecond => self.compare().1,
        }
    }
}

/// Everything the renderer needs besides the data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartStyle {
    /// Series colors
    pub palette: Palette,
    /// Chart background
    pub background: RGBColor,
    /// Grid and axis lines
    pub grid: RGBColor,
    /// Labels and captions
    pub text: RGBColor,
    /// Font family for all chart text
    pub font_family: String,
    /// Regular chart width
    pub width: u32,
    /// Chart height
    pub height: u32,
    /// Full-row chart width
    pub wide_width: u32,
}

impl ChartStyle {
    /// Pixel size of a chart.
    pub const fn size(&self, wide: bool) -> (u32, u32) {
        if wide {
            (self.wide_width, self.height)
        } else {
            (self.width, self.height)
        }
    }
}

impl From<&StylingConfig> for ChartStyle {
    fn from(config: &StylingConfig) -> Self {
        Self {
            palette: Palette::from_hex(&config.palette),
            background: parse_color(&config.background_color),
            grid: parse_color(&config.grid_color),
            text: parse_color(&config.text_color),
            font_family: config.font_family.clone(),
            width: config.chart_width,
            height: config.chart_height,
            wide_width: config.wide_chart_width,
        }
    }
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self::from(&StylingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#0e1117"), RGBColor(14, 17, 23));
        assert_eq!(parse_color("#FFFFFF"), RGBColor(255, 255, 255));
        assert_eq!(parse_color("invalid"), RGBColor(0, 0, 0));
        assert_eq!(to_hex(RGBColor(14, 17, 23)), "#0e1117");
    }

    #[test]
    fn test_roles() {
        let palette = Palette::from_hex(&["#000001", "#000002", "#000003"]);
        assert_eq!(palette.primary(), RGBColor(0, 0, 1));
        assert_eq!(palette.resolve(ColorRole::CompareFirst, 9), RGBColor(0, 0, 2));
        assert_eq!(palette.resolve(ColorRole::CompareSecond, 0), RGBColor(0, 0, 3));
        assert_eq!(palette.resolve(ColorRole::Categorical, 4), RGBColor(0, 0, 2));
    }

    #[test]
    fn test_empty_palette_has_fallback() {
        let palette = Palette::from_hex::<&str>(&[]);
        assert_eq!(palette.len(), 1);
        assert_eq!(palette.compare(), (RGBColor(0, 0, 0), RGBColor(0, 0, 0)));
    }

    #[test]
    fn test_style_from_config() {
        let style = ChartStyle::default();
        assert_eq!(style.background, RGBColor(14, 17, 23));
        assert_eq!(style.size(false), (600, 400));
        assert_eq!(style.size(true), (1200, 400));
    }
}
