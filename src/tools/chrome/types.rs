use serde::{Deserialize, Serialize};

/// One client rectangle of an element, clipped to the viewport, in logical
/// page pixels.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct VisibleRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

impl VisibleRect {
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
            width: right - left,
            height: bottom - top,
        }
    }

    /// Ordered edges, non-empty, and fully inside the viewport.
    pub fn is_within(&self, viewport: &Viewport) -> bool {
        let finite = [self.left, self.top, self.right, self.bottom]
            .iter()
            .all(|v| v.is_finite());
        finite
            && self.left >= 0.0
            && self.top >= 0.0
            && self.left <= self.right
            && self.top <= self.bottom
            && self.right <= viewport.width
            && self.bottom <= viewport.height
            && self.width > 0.0
            && self.height > 0.0
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::from_edges(
            self.left * factor,
            self.top * factor,
            self.right * factor,
            self.bottom * factor,
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Visible geometry of one DOM node at extraction time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PageElement {
    pub tag: String,
    pub rects: Vec<VisibleRect>,
    #[serde(default)]
    pub link: Option<String>,
}

/// Everything one collector pass returns, in document order.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CollectedPage {
    pub viewport: Viewport,
    pub elements: Vec<PageElement>,
}
