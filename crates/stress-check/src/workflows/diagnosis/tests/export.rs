use super::common::*;
use crate::workflows::diagnosis::export::{
    ExportComposer, ExportError, ExportOverrides, PrintHtmlEncoder, RegionKind, RegionRenderer,
    RenderProfile, SvgRegionRenderer,
};
use crate::workflows::diagnosis::report::{compose_report, ReportView};

fn recording_composer() -> (ExportComposer, RecordingEncoder) {
    let encoder = RecordingEncoder::default();
    let composer = ExportComposer::new(
        Box::new(SvgRegionRenderer::new(2.0)),
        Box::new(encoder.clone()),
    );
    (composer, encoder)
}

fn report_with_many_charts(count: usize) -> ReportView {
    let mut result = sample_result(false);
    let chart = result.charts[0].clone();
    result.charts = std::iter::repeat(chart).take(count).collect();
    compose_report(&result)
}

#[test]
fn export_without_organization_is_a_single_page() {
    let (composer, encoder) = recording_composer();
    let report = compose_report(&sample_result(false));

    let artifact = composer.export(&report, export_time()).expect("exports");
    assert_eq!(artifact.pages, vec![RegionKind::Primary]);
    assert_eq!(*encoder.seen.lock().expect("encoder lock"), vec![RegionKind::Primary]);
}

#[test]
fn export_with_organization_puts_primary_first() {
    let (composer, encoder) = recording_composer();
    let report = compose_report(&sample_result(true));

    let artifact = composer.export(&report, export_time()).expect("exports");
    assert_eq!(
        artifact.pages,
        vec![RegionKind::Primary, RegionKind::Organization]
    );
    assert_eq!(
        *encoder.seen.lock().expect("encoder lock"),
        vec![RegionKind::Primary, RegionKind::Organization]
    );
    assert_eq!(
        String::from_utf8(artifact.bytes).expect("utf8"),
        "Individual Result\nOrganization Analysis"
    );
}

#[test]
fn artifact_name_is_timestamp_qualified() {
    let composer = ExportComposer::standard(2.0);
    let report = compose_report(&sample_result(false));

    let artifact = composer.export(&report, export_time()).expect("exports");
    assert_eq!(artifact.file_name, "stress-diagnosis-20250314-092653.html");
    assert_eq!(artifact.content_type, "text/html; charset=utf-8");
}

#[test]
fn print_document_has_one_sheet_per_page() {
    let composer = ExportComposer::standard(2.0);
    let report = compose_report(&sample_result(true));

    let artifact = composer.export(&report, export_time()).expect("exports");
    let html = String::from_utf8(artifact.bytes).expect("utf8");
    assert!(html.contains("@page { size: 210mm 297mm; margin: 0; }"));
    assert_eq!(html.matches("<section class=\"sheet\"").count(), 2);
    let primary = html.find("data-region=\"Individual Result\"").expect("primary sheet");
    let organization = html
        .find("data-region=\"Organization Analysis\"")
        .expect("organization sheet");
    assert!(primary < organization);
}

#[test]
fn capture_failure_surfaces_as_export_error() {
    let composer = ExportComposer::new(Box::new(BrokenRenderer), Box::new(PrintHtmlEncoder::default()));
    let report = compose_report(&sample_result(false));

    assert!(matches!(
        composer.export(&report, export_time()),
        Err(ExportError::Capture { region: RegionKind::Primary, .. })
    ));
}

#[test]
fn composing_nothing_is_an_error() {
    let composer = ExportComposer::standard(1.0);
    assert!(matches!(
        composer.compose_document(Vec::new()),
        Err(ExportError::NoPages)
    ));
}

#[test]
fn organization_region_requires_organization_data() {
    let report = compose_report(&sample_result(false));
    assert!(matches!(
        SvgRegionRenderer::default().render(&report, RegionKind::Organization, &RenderProfile::export()),
        Err(ExportError::MissingRegion(RegionKind::Organization))
    ));
}

#[test]
fn export_profile_hides_controls_that_the_interactive_view_keeps() {
    let report = compose_report(&sample_result(false));
    let renderer = SvgRegionRenderer::new(1.0);

    let interactive = renderer
        .render(
            &report,
            RegionKind::Primary,
            &RenderProfile::Interactive {
                viewport_width_px: 800,
                viewport_height_px: 2000,
            },
        )
        .expect("interactive render");
    let exported = renderer
        .render(&report, RegionKind::Primary, &RenderProfile::export())
        .expect("export render");

    assert!(interactive.as_text().expect("svg").contains("class=\"controls\""));
    assert!(!exported.as_text().expect("svg").contains("class=\"controls\""));
    assert_eq!(exported.width_px, ExportOverrides::default().fixed_width_px);
}

#[test]
fn export_expands_scroll_areas_to_full_content() {
    let report = report_with_many_charts(12);
    let renderer = SvgRegionRenderer::new(1.0);
    let viewport = RenderProfile::Interactive {
        viewport_width_px: 1000,
        viewport_height_px: 400,
    };

    let interactive = renderer
        .render(&report, RegionKind::Primary, &viewport)
        .expect("interactive render");
    let exported = renderer
        .render(&report, RegionKind::Primary, &RenderProfile::export())
        .expect("export render");

    assert!(interactive.as_text().expect("svg").contains("clip-path"));
    assert!(!exported.as_text().expect("svg").contains("clip-path"));
    assert!(exported.height_px > interactive.height_px);
}

#[test]
fn pages_are_rasterized_at_the_fixed_scale() {
    let report = compose_report(&sample_result(false));
    let page = SvgRegionRenderer::new(2.0)
        .render(&report, RegionKind::Primary, &RenderProfile::export())
        .expect("renders");

    assert_eq!(page.raster_width(), f64::from(page.width_px) * 2.0);
    let svg = page.as_text().expect("svg");
    assert!(svg.starts_with(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\"",
        page.width_px * 2
    )));
}

#[test]
fn rendering_escapes_markup_in_labels() {
    let mut result = sample_result(false);
    result.charts[0].axes[0].label = "Load <peak> & \"rush\"".to_string();
    let report = compose_report(&result);

    let page = SvgRegionRenderer::new(1.0)
        .render(&report, RegionKind::Primary, &RenderProfile::export())
        .expect("renders");
    let svg = page.as_text().expect("svg");
    assert!(svg.contains("Load &lt;peak&gt; &amp; &quot;rush&quot;"));
    assert!(!svg.contains("<peak>"));
}
