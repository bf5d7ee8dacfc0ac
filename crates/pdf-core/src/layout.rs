//! Page geometry and the vertical cursor used for pagination

/// Fixed page size and margins, in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub top_margin: f64,
    pub bottom_margin: f64,
    pub left_margin: f64,
    pub right_margin: f64,
}

impl PageGeometry {
    /// A4 portrait (595 x 842) with the margins used for resumes
    pub fn a4() -> Self {
        Self {
            width: 595.0,
            height: 842.0,
            top_margin: 40.0,
            bottom_margin: 60.0,
            left_margin: 50.0,
            right_margin: 50.0,
        }
    }

    /// US Letter portrait (612 x 792)
    pub fn letter() -> Self {
        Self {
            width: 612.0,
            height: 792.0,
            top_margin: 42.0,
            bottom_margin: 72.0,
            left_margin: 72.0,
            right_margin: 72.0,
        }
    }

    /// Y of the first line on a fresh page
    pub fn content_top(&self) -> f64 {
        self.height - self.top_margin
    }

    /// Usable width between the side margins
    pub fn content_width(&self) -> f64 {
        self.width - self.left_margin - self.right_margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

/// Vertical cursor over a sequence of pages
///
/// `y` is in PDF coordinates (origin bottom-left) and marks the top of the
/// next line. Pages are counted from 1.
#[derive(Debug, Clone)]
pub struct PageCursor {
    geometry: PageGeometry,
    page: usize,
    y: f64,
}

impl PageCursor {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            page: 1,
            y: geometry.content_top(),
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Current page number (1-indexed)
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Make room for a line of height `h`
    ///
    /// Starts a new page when the line's bottom would fall below the bottom
    /// margin. Returns true if a page break happened.
    pub fn ensure_space(&mut self, h: f64) -> bool {
        if self.y - h < self.geometry.bottom_margin {
            self.page += 1;
            self.y = self.geometry.content_top();
            log::debug!("page break: now on page {}", self.page);
            true
        } else {
            false
        }
    }

    /// Move the cursor down by `h` after drawing
    pub fn advance(&mut self, h: f64) {
        self.y -= h;
    }

    /// Move the cursor down without drawing (gaps between sections)
    ///
    /// Never triggers a page break by itself; the next `ensure_space` does.
    pub fn move_cursor(&mut self, gap: f64) {
        self.y -= gap;
    }

    /// Reserve a line: `ensure_space` then return the position to draw at
    ///
    /// Returns `(page, top_y)`; the caller draws within `[top_y - h, top_y]`
    /// and the cursor is advanced past the line.
    pub fn place_line(&mut self, h: f64) -> (usize, f64) {
        self.ensure_space(h);
        let top = self.y;
        self.advance(h);
        (self.page, top)
    }
}
