//! Layer - A single compositable layer

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

/// A single layer in the compositor
#[derive(Debug)]
pub struct Layer {
    /// Z-order (higher = in front)
    pub z_index: i32,
    /// Position and size on screen
    pub bounds: Rect,
    /// Whether the layer is drawn at all
    pub visible: bool,
    /// Opaque layers hide everything below them, blank cells included
    pub opaque: bool,
    /// The layer's render buffer, in origin coordinates
    pub buffer: Buffer,
}

impl Layer {
    /// Create a new, visible, see-through layer
    #[must_use]
    pub fn new(bounds: Rect, z_index: i32) -> Self {
        Self {
            z_index,
            bounds,
            visible: true,
            opaque: false,
            buffer: Buffer::empty(Self::local_area(bounds)),
        }
    }

    /// Move and resize; the buffer is recreated only when the size changes
    pub fn set_bounds(&mut self, bounds: Rect) {
        if (bounds.width, bounds.height) != (self.bounds.width, self.bounds.height) {
            self.buffer = Buffer::empty(Self::local_area(bounds));
        }
        self.bounds = bounds;
    }

    fn local_area(bounds: Rect) -> Rect {
        Rect::new(0, 0, bounds.width, bounds.height)
    }
}
