use super::render::CapturedPage;

/// Target sheet in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin_mm: f64,
}

impl PageGeometry {
    pub const fn a4() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_mm: 10.0,
        }
    }

    /// Largest box with the capture's aspect ratio that fits inside the
    /// margins, centred on the sheet.
    pub fn fit(&self, width: f64, height: f64) -> Placement {
        let avail_w = (self.width_mm - 2.0 * self.margin_mm).max(0.0);
        let avail_h = (self.height_mm - 2.0 * self.margin_mm).max(0.0);
        if !(width > 0.0 && height > 0.0) {
            return Placement {
                x_mm: self.width_mm / 2.0,
                y_mm: self.height_mm / 2.0,
                width_mm: 0.0,
                height_mm: 0.0,
            };
        }

        let ratio = (avail_w / width).min(avail_h / height);
        let width_mm = width * ratio;
        let height_mm = height * ratio;
        Placement {
            x_mm: (self.width_mm - width_mm) / 2.0,
            y_mm: (self.height_mm - height_mm) / 2.0,
            width_mm,
            height_mm,
        }
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x_mm: f64,
    pub y_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedPage {
    pub page: CapturedPage,
    pub placement: Placement,
}

impl PlacedPage {
    pub fn place(page: CapturedPage, geometry: &PageGeometry) -> Self {
        let placement = geometry.fit(page.raster_width(), page.raster_height());
        Self { page, placement }
    }
}
