use std::fmt::Write as _;

use super::layout::{PageGeometry, PlacedPage};
use super::render::escape_xml;
use super::ExportError;

/// Turns ordered, placed pages into a single document blob.
pub trait DocumentEncoder: Send + Sync {
    fn content_type(&self) -> &'static str;

    fn extension(&self) -> &'static str;

    fn encode(&self, pages: &[PlacedPage], geometry: &PageGeometry)
        -> Result<Vec<u8>, ExportError>;
}

/// Print-ready HTML: one sheet per page, sized with CSS `@page`, captures
/// embedded inline and absolutely positioned in millimetres.
#[derive(Debug, Clone, Default)]
pub struct PrintHtmlEncoder {
    title: Option<String>,
}

impl PrintHtmlEncoder {
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
        }
    }

    fn write_document(
        &self,
        pages: &[PlacedPage],
        geometry: &PageGeometry,
    ) -> Result<String, std::fmt::Error> {
        let title = self.title.as_deref().unwrap_or("Stress Diagnosis");
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">");
        writeln!(html, "<title>{}</title>", escape_xml(title))?;
        writeln!(
            html,
            "<style>@page {{ size: {w}mm {h}mm; margin: 0; }} body {{ margin: 0; }} \
             .sheet {{ position: relative; width: {w}mm; height: {h}mm; overflow: hidden; page-break-after: always; }} \
             .sheet:last-child {{ page-break-after: auto; }} \
             .capture {{ position: absolute; }} .capture svg {{ width: 100%; height: 100%; }}</style>",
            w = geometry.width_mm,
            h = geometry.height_mm,
        )?;
        html.push_str("</head><body>\n");

        for (idx, placed) in pages.iter().enumerate() {
            let svg = placed.page.as_text().ok_or(std::fmt::Error)?;
            let placement = &placed.placement;
            writeln!(
                html,
                "<section class=\"sheet\" data-page=\"{}\" data-region=\"{}\"><div class=\"capture\" style=\"left: {:.2}mm; top: {:.2}mm; width: {:.2}mm; height: {:.2}mm;\">{}</div></section>",
                idx + 1,
                placed.page.region.label(),
                placement.x_mm,
                placement.y_mm,
                placement.width_mm,
                placement.height_mm,
                svg,
            )?;
        }

        html.push_str("</body></html>\n");
        Ok(html)
    }
}

impl DocumentEncoder for PrintHtmlEncoder {
    fn content_type(&self) -> &'static str {
        "text/html; charset=utf-8"
    }

    fn extension(&self) -> &'static str {
        "html"
    }

    fn encode(
        &self,
        pages: &[PlacedPage],
        geometry: &PageGeometry,
    ) -> Result<Vec<u8>, ExportError> {
        if pages.is_empty() {
            return Err(ExportError::NoPages);
        }
        self.write_document(pages, geometry)
            .map(String::into_bytes)
            .map_err(|_| ExportError::Encode("captured page is not embeddable text".to_owned()))
    }
}
