//! Paginated export of a held result. Regions are re-rendered with an export
//! profile, placed on fixed-size sheets, and encoded into one document.

mod composer;
mod encoder;
mod layout;
mod render;

pub use composer::{ExportArtifact, ExportComposer};
pub use encoder::{DocumentEncoder, PrintHtmlEncoder};
pub use layout::{PageGeometry, PlacedPage, Placement};
pub use render::{
    CapturedPage, ExportOverrides, RegionKind, RegionRenderer, RenderProfile, SvgRegionRenderer,
    SVG_CONTENT_TYPE,
};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("unable to capture {} region: {reason}", .region.label())]
    Capture { region: RegionKind, reason: String },
    #[error("{} region has nothing to show", .0.label())]
    MissingRegion(RegionKind),
    #[error("no pages to compose")]
    NoPages,
    #[error("unable to encode document: {0}")]
    Encode(String),
}
