//! Bar chart rendering for a [`FrequencyResult`].
//!
//! The chart is drawn as SVG with plotters, one bar per concept in result
//! order. For PNG output the SVG is rasterized with resvg using the fonts
//! named in [`ChartConfig`]; glyphs missing from every loaded font are left
//! blank rather than failing the render.

use crate::analysis::FrequencyResult;
use crate::config::ChartConfig;
use crate::error::{Error, Result};
use plotters::prelude::*;
use plotters::style::FontTransform;
use resvg::{tiny_skia, usvg};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, instrument};

/// Image format of a rendered chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    #[default]
    Png,
    Svg,
}

impl ChartFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ChartFormat::Png => "png",
            ChartFormat::Svg => "svg",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ChartFormat::Png => "image/png",
            ChartFormat::Svg => "image/svg+xml",
        }
    }

    /// Guess the format from a file name, falling back to `default`.
    pub fn from_path(path: &str, default: ChartFormat) -> ChartFormat {
        let lower = path.to_lowercase();
        if lower.ends_with(".svg") {
            ChartFormat::Svg
        } else if lower.ends_with(".png") {
            ChartFormat::Png
        } else {
            default
        }
    }
}

impl fmt::Display for ChartFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Parse a `#RRGGBB` colour.
pub fn parse_hex_color(hex: &str) -> Result<RGBColor> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(Error::Config(format!("invalid colour '{hex}'")));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map_err(|_| Error::Config(format!("invalid colour '{hex}'")))
    };
    Ok(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

/// Renders frequency results with fixed appearance settings.
///
/// Built once per process; fonts are loaded at construction.
pub struct ChartRenderer {
    config: ChartConfig,
    bar_color: RGBColor,
    title_color: RGBColor,
    svg_options: usvg::Options<'static>,
}

impl fmt::Debug for ChartRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartRenderer")
            .field("format", &self.config.format)
            .field("size", &(self.config.width, self.config.height))
            .field("font_family", &self.config.font_family)
            .finish()
    }
}

impl ChartRenderer {
    #[instrument(level = "info", skip_all, fields(format = %config.format))]
    pub fn new(config: &ChartConfig) -> Result<Self> {
        let bar_color = parse_hex_color(&config.bar_color)?;
        let title_color = parse_hex_color(&config.title_color)?;

        let mut svg_options = usvg::Options::default();
        svg_options.font_family = config.font_family.clone();
        if config.format == ChartFormat::Png {
            let fontdb = svg_options.fontdb_mut();
            fontdb.load_system_fonts();
            for path in &config.font_files {
                fontdb
                    .load_font_file(path)
                    .map_err(|e| Error::Render(format!("font {}: {e}", path.display())))?;
            }
            info!(faces = fontdb.len(), "Loaded chart fonts");
        }

        Ok(Self {
            config: config.clone(),
            bar_color,
            title_color,
            svg_options,
        })
    }

    pub fn format(&self) -> ChartFormat {
        self.config.format
    }

    /// Render `results` in the configured format.
    #[instrument(level = "info", skip_all, fields(bars = results.len(), format = %self.config.format))]
    pub fn render(&self, results: &FrequencyResult) -> Result<Vec<u8>> {
        let svg = self.render_svg(results)?;
        let bytes = match self.config.format {
            ChartFormat::Svg => svg.into_bytes(),
            ChartFormat::Png => self.rasterize(&svg)?,
        };
        debug!(bytes = bytes.len(), "Rendered chart");
        Ok(bytes)
    }

    /// Render `results` as an SVG document.
    pub fn render_svg(&self, results: &FrequencyResult) -> Result<String> {
        let mut svg = String::new();
        self.draw(results, &mut svg)
            .map_err(|e| Error::Render(e.to_string()))?;
        Ok(svg)
    }

    fn draw(
        &self,
        results: &FrequencyResult,
        out: &mut String,
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = SVGBackend::with_string(out, (self.config.width, self.config.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let labels: Vec<&str> = results.concepts().collect();
        let bars = labels.len().max(1);
        let peak = results.max_count().max(1);
        let y_top = peak + (peak / 10).max(1);
        let family = self.config.font_family.as_str();

        let mut chart = ChartBuilder::on(&root)
            .caption(
                &self.config.title,
                (family, 32).into_font().color(&self.title_color),
            )
            .margin(24)
            .x_label_area_size(140)
            .y_label_area_size(70)
            .build_cartesian_2d((0..bars).into_segmented(), 0u64..y_top)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(bars)
            .x_label_formatter(&|value: &SegmentValue<usize>| match value {
                SegmentValue::CenterOf(i) => labels.get(*i).map(|s| s.to_string()).unwrap_or_default(),
                _ => String::new(),
            })
            .x_label_style((family, 18).into_font().transform(FontTransform::Rotate90))
            .y_label_style((family, 16))
            .x_desc(self.config.x_label.as_str())
            .y_desc(self.config.y_label.as_str())
            .axis_desc_style((family, 20))
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(self.bar_color.filled())
                .margin(12)
                .data(results.iter().enumerate().map(|(i, (_, count))| (i, count))),
        )?;

        root.present()?;
        Ok(())
    }

    fn rasterize(&self, svg: &str) -> Result<Vec<u8>> {
        let tree = usvg::Tree::from_str(svg, &self.svg_options)
            .map_err(|e| Error::Render(e.to_string()))?;
        let size = tree.size().to_int_size();
        let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
            .ok_or_else(|| Error::Render("chart has an empty canvas".to_string()))?;
        pixmap.fill(tiny_skia::Color::WHITE);
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
        pixmap
            .encode_png()
            .map_err(|e| Error::Render(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FrequencyResult {
        [("数字化", 4u64), ("人工智能", 9u64), ("SaaS", 0u64)]
            .into_iter()
            .collect()
    }

    fn renderer(format: ChartFormat) -> ChartRenderer {
        let config = ChartConfig {
            format,
            width: 640,
            height: 400,
            ..ChartConfig::default()
        };
        ChartRenderer::new(&config).unwrap()
    }

    #[test]
    fn test_parse_hex_color() {
        let c = parse_hex_color("#0052FF").unwrap();
        assert_eq!((c.0, c.1, c.2), (0x00, 0x52, 0xFF));
        assert!(parse_hex_color("#12345").is_err());
        assert!(parse_hex_color("#zzzzzz").is_err());
    }

    #[test]
    fn test_svg_contains_every_label_in_order() {
        let svg = renderer(ChartFormat::Svg).render_svg(&sample()).unwrap();
        assert!(svg.contains("<svg"));
        let a = svg.find("数字化").unwrap();
        let b = svg.find("人工智能").unwrap();
        let c = svg.find("SaaS").unwrap();
        assert!(a < b && b < c);
        assert!(svg.contains("科技趋势关键词频率分析"));
    }

    #[test]
    fn test_png_render_produces_png_bytes() {
        let bytes = renderer(ChartFormat::Png).render(&sample()).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_empty_result_still_renders() {
        let bytes = renderer(ChartFormat::Svg)
            .render(&FrequencyResult::default())
            .unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_missing_font_file_is_a_render_error() {
        let config = ChartConfig {
            font_files: vec!["/nonexistent/font.ttf".into()],
            ..ChartConfig::default()
        };
        assert!(matches!(ChartRenderer::new(&config), Err(Error::Render(_))));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ChartFormat::from_path("report.SVG", ChartFormat::Png), ChartFormat::Svg);
        assert_eq!(ChartFormat::from_path("report.png", ChartFormat::Svg), ChartFormat::Png);
        assert_eq!(ChartFormat::from_path("report", ChartFormat::Svg), ChartFormat::Svg);
        assert_eq!(ChartFormat::Png.content_type(), "image/png");
    }
}
