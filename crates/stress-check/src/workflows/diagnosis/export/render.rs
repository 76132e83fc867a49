use std::f64::consts::PI;
use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ExportError;
use crate::workflows::diagnosis::report::{
    OrganizationPanel, RadarChartView, ReportView, RiskBand, RADAR_DOMAIN,
};

const PADDING: u32 = 24;
const BANNER_HEIGHT: u32 = 90;
const ROW_HEIGHT: u32 = 28;
const RADAR_CELL: u32 = 320;
const RADAR_RADIUS: f64 = 110.0;
const CONTROLS_HEIGHT: u32 = 56;
const BAR_AREA_HEIGHT: u32 = 240;
const RISK_MAP_SIZE: u32 = 260;
const BADGE_HEIGHT: u32 = 36;
const DEFAULT_VIEWPORT_HEIGHT: u32 = 720;
const FONT: &str = "font-family=\"sans-serif\"";

pub const SVG_CONTENT_TYPE: &str = "image/svg+xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    Primary,
    Organization,
}

impl RegionKind {
    /// Capture order; the primary region always leads.
    pub const fn ordered() -> [Self; 2] {
        [Self::Primary, Self::Organization]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Primary => "Individual Result",
            Self::Organization => "Organization Analysis",
        }
    }
}

/// Layout switches applied only when rendering for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOverrides {
    pub hide_interactive_controls: bool,
    pub fixed_width_px: u32,
    pub expand_scroll_areas: bool,
}

impl Default for ExportOverrides {
    fn default() -> Self {
        Self {
            hide_interactive_controls: true,
            fixed_width_px: 1000,
            expand_scroll_areas: true,
        }
    }
}

/// Which path a region is rendered for. The live view and the export each
/// get their own render; neither modifies the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderProfile {
    Interactive {
        viewport_width_px: u32,
        viewport_height_px: u32,
    },
    Export(ExportOverrides),
}

impl RenderProfile {
    pub fn export() -> Self {
        Self::Export(ExportOverrides::default())
    }

    fn width_px(&self) -> u32 {
        let width = match self {
            Self::Interactive {
                viewport_width_px, ..
            } => *viewport_width_px,
            Self::Export(overrides) => overrides.fixed_width_px,
        };
        width.max(RADAR_CELL + 2 * PADDING)
    }

    fn shows_controls(&self) -> bool {
        match self {
            Self::Interactive { .. } => true,
            Self::Export(overrides) => !overrides.hide_interactive_controls,
        }
    }

    fn scroll_height(&self) -> Option<u32> {
        match self {
            Self::Interactive {
                viewport_height_px, ..
            } => Some(*viewport_height_px),
            Self::Export(overrides) if overrides.expand_scroll_areas => None,
            Self::Export(_) => Some(DEFAULT_VIEWPORT_HEIGHT),
        }
    }
}

/// One rendered region, sized in CSS pixels and rasterized at `scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedPage {
    pub region: RegionKind,
    pub width_px: u32,
    pub height_px: u32,
    pub scale: f32,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl CapturedPage {
    pub fn raster_width(&self) -> f64 {
        f64::from(self.width_px) * f64::from(self.scale)
    }

    pub fn raster_height(&self) -> f64 {
        f64::from(self.height_px) * f64::from(self.scale)
    }

    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

pub trait RegionRenderer: Send + Sync {
    fn render(
        &self,
        report: &ReportView,
        region: RegionKind,
        profile: &RenderProfile,
    ) -> Result<CapturedPage, ExportError>;
}

/// Draws report regions as standalone SVG documents.
#[derive(Debug, Clone, Copy)]
pub struct SvgRegionRenderer {
    scale: f32,
}

impl Default for SvgRegionRenderer {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl SvgRegionRenderer {
    pub fn new(scale: f32) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        Self { scale }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }
}

impl RegionRenderer for SvgRegionRenderer {
    fn render(
        &self,
        report: &ReportView,
        region: RegionKind,
        profile: &RenderProfile,
    ) -> Result<CapturedPage, ExportError> {
        let width = profile.width_px();
        let drawn = match region {
            RegionKind::Primary => draw_primary(report, profile, width),
            RegionKind::Organization => {
                let panel = report
                    .organization
                    .as_ref()
                    .ok_or(ExportError::MissingRegion(region))?;
                draw_organization(panel, profile, width)
            }
        };
        let (body, height) = drawn.map_err(|err| ExportError::Capture {
            region,
            reason: err.to_string(),
        })?;

        let document = finish_document(&body, width, height, self.scale).map_err(|err| {
            ExportError::Capture {
                region,
                reason: err.to_string(),
            }
        })?;
        debug!(region = region.label(), width, height, "region rendered");

        Ok(CapturedPage {
            region,
            width_px: width,
            height_px: height,
            scale: self.scale,
            content_type: SVG_CONTENT_TYPE,
            bytes: document.into_bytes(),
        })
    }
}

fn finish_document(body: &str, width: u32, height: u32, scale: f32) -> Result<String, fmt::Error> {
    let mut svg = String::with_capacity(body.len() + 256);
    write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{:.0}\" height=\"{:.0}\" viewBox=\"0 0 {width} {height}\">",
        f64::from(width) * f64::from(scale),
        f64::from(height) * f64::from(scale),
    )?;
    write!(
        svg,
        "<rect x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" fill=\"#ffffff\"/>"
    )?;
    svg.push_str(body);
    svg.push_str("</svg>");
    Ok(svg)
}

fn draw_primary(
    report: &ReportView,
    profile: &RenderProfile,
    width: u32,
) -> Result<(String, u32), fmt::Error> {
    let mut out = String::new();
    let inner = width - 2 * PADDING;
    let mut y = PADDING;

    let (fill, ink) = if report.high_stress {
        ("#f8d7da", "#721c24")
    } else {
        ("#d4edda", "#155724")
    };
    write!(
        out,
        "<g class=\"banner\"><rect x=\"{PADDING}\" y=\"{y}\" width=\"{inner}\" height=\"{BANNER_HEIGHT}\" rx=\"8\" fill=\"{fill}\"/>"
    )?;
    text(&mut out, f64::from(width) / 2.0, f64::from(y + 36), 22, "middle", ink, report.headline)?;
    text(&mut out, f64::from(width) / 2.0, f64::from(y + 66), 14, "middle", ink, report.message)?;
    out.push_str("</g>");
    y += BANNER_HEIGHT + PADDING;

    out.push_str("<g class=\"summary\">");
    text(&mut out, f64::from(PADDING), f64::from(y + 20), 18, "start", "#212529", "Summary Scores")?;
    y += 32;
    for entry in &report.summary {
        let line = format!("{}: {}", entry.label, entry.score);
        text(&mut out, f64::from(PADDING), f64::from(y + 20), 14, "start", "#212529", &line)?;
        y += ROW_HEIGHT;
    }
    out.push_str("</g>");
    y += PADDING;

    let columns = (inner / RADAR_CELL).max(1);
    let rows = (report.radar_charts.len() as u32).div_ceil(columns);
    let grid_height = rows * RADAR_CELL;
    let visible = match profile.scroll_height() {
        Some(limit) if grid_height > limit => {
            write!(
                out,
                "<defs><clipPath id=\"radar-scroll\"><rect x=\"0\" y=\"{y}\" width=\"{width}\" height=\"{limit}\"/></clipPath></defs><g class=\"radar-grid\" clip-path=\"url(#radar-scroll)\">"
            )?;
            limit
        }
        _ => {
            out.push_str("<g class=\"radar-grid\">");
            grid_height
        }
    };
    let offset = PADDING + (inner - columns * RADAR_CELL) / 2;
    for (idx, chart) in report.radar_charts.iter().enumerate() {
        let idx = idx as u32;
        let cell_x = offset + (idx % columns) * RADAR_CELL;
        let cell_y = y + (idx / columns) * RADAR_CELL;
        draw_radar(&mut out, chart, f64::from(cell_x), f64::from(cell_y))?;
    }
    out.push_str("</g>");
    y += visible;

    if profile.shows_controls() {
        draw_controls(&mut out, width, y)?;
        y += CONTROLS_HEIGHT;
    }

    Ok((out, y + PADDING))
}

fn draw_radar(out: &mut String, chart: &RadarChartView, cell_x: f64, cell_y: f64) -> fmt::Result {
    let (domain_min, domain_max) = RADAR_DOMAIN;
    let cx = cell_x + f64::from(RADAR_CELL) / 2.0;
    let cy = cell_y + f64::from(RADAR_CELL) / 2.0 + 12.0;
    let count = chart.axes.len();

    write!(out, "<g class=\"radar\" data-chart=\"{}\">", escape_xml(&chart.label))?;
    text(out, cx, cell_y + 20.0, 16, "middle", "#212529", &chart.label)?;

    if count > 0 {
        let angle = |idx: usize| -PI / 2.0 + (idx as f64) * 2.0 * PI / (count as f64);
        let point = |idx: usize, radius: f64| {
            let a = angle(idx);
            (cx + radius * a.cos(), cy + radius * a.sin())
        };

        let ring: Vec<String> = (0..count)
            .map(|idx| {
                let (x, y) = point(idx, RADAR_RADIUS);
                format!("{x:.2},{y:.2}")
            })
            .collect();
        write!(
            out,
            "<polygon points=\"{}\" fill=\"none\" stroke=\"#ced4da\"/>",
            ring.join(" ")
        )?;

        let span = domain_max - domain_min;
        let shape: Vec<String> = chart
            .axes
            .iter()
            .enumerate()
            .map(|(idx, axis)| {
                let fraction = ((axis.score.clamp(domain_min, domain_max) - domain_min) / span)
                    .clamp(0.0, 1.0);
                let (x, y) = point(idx, RADAR_RADIUS * fraction);
                format!("{x:.2},{y:.2}")
            })
            .collect();
        write!(
            out,
            "<polygon points=\"{}\" fill=\"#8884d8\" fill-opacity=\"0.6\" stroke=\"#8884d8\"/>",
            shape.join(" ")
        )?;

        for (idx, axis) in chart.axes.iter().enumerate() {
            let (lx, ly) = point(idx, RADAR_RADIUS + 18.0);
            write!(
                out,
                "<text x=\"{lx:.2}\" y=\"{ly:.2}\" font-size=\"10\" text-anchor=\"middle\" {FONT} data-axis=\"{idx}\" data-label=\"{}\" data-score=\"{}\">{}</text>",
                escape_xml(&axis.label),
                axis.score,
                escape_xml(&axis.label),
            )?;
        }
    }

    out.push_str("</g>");
    Ok(())
}

fn draw_controls(out: &mut String, width: u32, y: u32) -> fmt::Result {
    let center = width / 2;
    out.push_str("<g class=\"controls\">");
    for (offset, label) in [(-140_i32, "Restart"), (20, "Save as PDF")] {
        let x = center as i32 + offset;
        write!(
            out,
            "<rect x=\"{x}\" y=\"{}\" width=\"120\" height=\"36\" rx=\"5\" fill=\"#007bff\"/>",
            y + 10
        )?;
        text(out, f64::from(x + 60), f64::from(y + 33), 14, "middle", "#ffffff", label)?;
    }
    out.push_str("</g>");
    Ok(())
}

fn draw_organization(
    panel: &OrganizationPanel,
    profile: &RenderProfile,
    width: u32,
) -> Result<(String, u32), fmt::Error> {
    let mut out = String::new();
    let inner = width - 2 * PADDING;
    let mut y = PADDING;

    let title = format!(
        "{} ({} respondents)",
        RegionKind::Organization.label(),
        panel.respondents
    );
    text(&mut out, f64::from(width) / 2.0, f64::from(y + 24), 22, "middle", "#212529", &title)?;
    y += 48;

    let area_top = f64::from(y);
    let area_height = f64::from(BAR_AREA_HEIGHT);
    let bottom = area_top + area_height;
    out.push_str("<g class=\"bars\">");
    for stripe in &panel.stripes {
        let top = bottom - stripe.to * area_height;
        let height = (stripe.to - stripe.from) * area_height;
        write!(
            out,
            "<rect class=\"stripe\" x=\"{PADDING}\" y=\"{top:.2}\" width=\"{inner}\" height=\"{height:.2}\" fill=\"{}\" data-grade=\"{}\"/>",
            stripe.color,
            stripe.grade.label(),
        )?;
    }
    let slot = f64::from(inner) / panel.bars.len().max(1) as f64;
    for (idx, bar) in panel.bars.iter().enumerate() {
        let bar_width = slot * 0.5;
        let x = f64::from(PADDING) + slot * idx as f64 + (slot - bar_width) / 2.0;
        let height = bar.height * area_height;
        write!(
            out,
            "<rect class=\"bar\" x=\"{x:.2}\" y=\"{:.2}\" width=\"{bar_width:.2}\" height=\"{height:.2}\" fill=\"#495057\" data-key=\"{}\" data-height=\"{}\"/>",
            bottom - height,
            bar.key,
            bar.height,
        )?;
        let caption = format!("{:.1} ({})", bar.raw, bar.grade_label);
        text(&mut out, x + bar_width / 2.0, bottom - height - 6.0, 12, "middle", "#212529", &caption)?;
        text(&mut out, x + bar_width / 2.0, bottom + 18.0, 12, "middle", "#212529", bar.label)?;
    }
    out.push_str("</g>");
    y += BAR_AREA_HEIGHT + 32 + PADDING;

    let side_by_side = inner >= 2 * RISK_MAP_SIZE + PADDING;
    let map_block = if side_by_side {
        RISK_MAP_SIZE + 40
    } else {
        (RISK_MAP_SIZE + 40) * panel.risk_maps.len() as u32
    };
    out.push_str("<g class=\"risk-maps\">");
    for (idx, map) in panel.risk_maps.iter().enumerate() {
        let idx = idx as u32;
        let (left, top) = if side_by_side {
            let gap = (inner - 2 * RISK_MAP_SIZE) / 3;
            (PADDING + gap + idx * (RISK_MAP_SIZE + gap), y)
        } else {
            ((width - RISK_MAP_SIZE) / 2, y + idx * (RISK_MAP_SIZE + 40))
        };
        let size = f64::from(RISK_MAP_SIZE);
        let (left, top) = (f64::from(left), f64::from(top) + 20.0);
        text(&mut out, left + size / 2.0, top - 6.0, 14, "middle", "#212529", map.label)?;
        write!(
            out,
            "<rect x=\"{left:.2}\" y=\"{top:.2}\" width=\"{size:.2}\" height=\"{size:.2}\" fill=\"url(#risk-gradient)\" stroke=\"#adb5bd\"/>"
        )?;
        text(&mut out, left + size / 2.0, top + size + 16.0, 11, "middle", "#495057", map.x_label)?;
        text(&mut out, left - 4.0, top + size / 2.0, 11, "end", "#495057", map.y_label)?;
        write!(
            out,
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"6\" fill=\"#dc3545\" data-x=\"{}\" data-y=\"{}\"/>",
            left + map.point.x * size,
            top + map.point.y * size,
            map.point.x,
            map.point.y,
        )?;
    }
    out.push_str("</g>");
    out.insert_str(
        0,
        &format!(
            "<defs><linearGradient id=\"risk-gradient\" x1=\"0\" y1=\"1\" x2=\"1\" y2=\"0\"><stop offset=\"0\" stop-color=\"{}\" stop-opacity=\"0.25\"/><stop offset=\"1\" stop-color=\"{}\" stop-opacity=\"0.35\"/></linearGradient></defs>",
            RiskBand::Normal.color(),
            RiskBand::High.color(),
        ),
    );
    y += map_block + PADDING;

    out.push_str("<g class=\"risk-badges\">");
    for badge in &panel.risk_badges {
        write!(
            out,
            "<rect x=\"{PADDING}\" y=\"{y}\" width=\"{inner}\" height=\"{}\" rx=\"6\" fill=\"{}\" data-band=\"{}\"/>",
            BADGE_HEIGHT - 6,
            badge.color,
            badge.band_label,
        )?;
        let line = format!("{}: {} ({})", badge.label, badge.display, badge.band_label);
        text(&mut out, f64::from(PADDING + 12), f64::from(y + 20), 14, "start", "#212529", &line)?;
        y += BADGE_HEIGHT;
    }
    out.push_str("</g>");

    if profile.shows_controls() {
        draw_controls(&mut out, width, y)?;
        y += CONTROLS_HEIGHT;
    }

    Ok((out, y + PADDING))
}

fn text(
    out: &mut String,
    x: f64,
    y: f64,
    size: u32,
    anchor: &str,
    color: &str,
    content: &str,
) -> fmt::Result {
    write!(
        out,
        "<text x=\"{x:.2}\" y=\"{y:.2}\" font-size=\"{size}\" text-anchor=\"{anchor}\" fill=\"{color}\" {FONT}>{}</text>",
        escape_xml(content)
    )
}

pub(crate) fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
