use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{info, warn};

use super::encoder::{DocumentEncoder, PrintHtmlEncoder};
use super::layout::{PageGeometry, PlacedPage};
use super::render::{
    CapturedPage, ExportOverrides, RegionKind, RegionRenderer, RenderProfile, SvgRegionRenderer,
};
use super::ExportError;
use crate::workflows::diagnosis::report::ReportView;

const FILE_STEM: &str = "stress-diagnosis";

/// The finished document. Built per request and handed to the caller; the
/// composer keeps nothing.
#[derive(Debug, Clone, Serialize)]
pub struct ExportArtifact {
    pub file_name: String,
    pub content_type: &'static str,
    pub pages: Vec<RegionKind>,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

pub struct ExportComposer {
    renderer: Box<dyn RegionRenderer>,
    encoder: Box<dyn DocumentEncoder>,
    geometry: PageGeometry,
    overrides: ExportOverrides,
}

impl std::fmt::Debug for ExportComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportComposer")
            .field("geometry", &self.geometry)
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

impl ExportComposer {
    pub fn new(renderer: Box<dyn RegionRenderer>, encoder: Box<dyn DocumentEncoder>) -> Self {
        Self {
            renderer,
            encoder,
            geometry: PageGeometry::a4(),
            overrides: ExportOverrides::default(),
        }
    }

    /// SVG captures at `scale`, wrapped in a printable A4 HTML document.
    pub fn standard(scale: f32) -> Self {
        Self::new(
            Box::new(SvgRegionRenderer::new(scale)),
            Box::new(PrintHtmlEncoder::default()),
        )
    }

    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_overrides(mut self, overrides: ExportOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Renders a region for on-screen display: controls shown, scroll areas
    /// clipped to the viewport. Nothing here feeds the exported document.
    pub fn render_live(
        &self,
        report: &ReportView,
        region: RegionKind,
        viewport_width_px: u32,
        viewport_height_px: u32,
    ) -> Result<CapturedPage, ExportError> {
        self.renderer.render(
            report,
            region,
            &RenderProfile::Interactive {
                viewport_width_px,
                viewport_height_px,
            },
        )
    }

    pub fn capture_region(
        &self,
        report: &ReportView,
        region: RegionKind,
        overrides: ExportOverrides,
    ) -> Result<CapturedPage, ExportError> {
        self.renderer
            .render(report, region, &RenderProfile::Export(overrides))
    }

    /// Pages keep the order they are given in.
    pub fn compose_document(&self, pages: Vec<CapturedPage>) -> Result<Vec<u8>, ExportError> {
        if pages.is_empty() {
            return Err(ExportError::NoPages);
        }
        let placed: Vec<PlacedPage> = pages
            .into_iter()
            .map(|page| PlacedPage::place(page, &self.geometry))
            .collect();
        self.encoder.encode(&placed, &self.geometry)
    }

    /// Regions the report can fill, primary first.
    pub fn regions_for(report: &ReportView) -> Vec<RegionKind> {
        RegionKind::ordered()
            .into_iter()
            .filter(|region| match region {
                RegionKind::Primary => true,
                RegionKind::Organization => report.organization.is_some(),
            })
            .collect()
    }

    pub fn file_name(&self, now: NaiveDateTime) -> String {
        format!(
            "{FILE_STEM}-{}.{}",
            now.format("%Y%m%d-%H%M%S"),
            self.encoder.extension()
        )
    }

    pub fn export(
        &self,
        report: &ReportView,
        now: NaiveDateTime,
    ) -> Result<ExportArtifact, ExportError> {
        let regions = Self::regions_for(report);
        let pages = regions
            .iter()
            .map(|region| self.capture_region(report, *region, self.overrides))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| {
                warn!(error = %err, "region capture failed");
                err
            })?;

        let bytes = self.compose_document(pages)?;
        let file_name = self.file_name(now);
        info!(
            file_name = %file_name,
            pages = regions.len(),
            bytes = bytes.len(),
            "export composed"
        );

        Ok(ExportArtifact {
            file_name,
            content_type: self.encoder.content_type(),
            pages: regions,
            bytes,
        })
    }
}
