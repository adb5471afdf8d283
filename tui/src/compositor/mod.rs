//! Layered Compositor
//!
//! Manages z-ordered layers for rendering. Each screen region draws into its
//! own buffer; the compositor stacks the visible layers into one output
//! buffer that is copied to the terminal in a single draw.
//!
//! Blank cells of a see-through layer let lower layers show; opaque layers
//! (notices) cover whatever is beneath them.

mod layer;

use std::collections::HashMap;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

pub use layer::Layer;

/// Unique identifier for a layer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayerId(u32);

/// The compositor manages all layers and composites them together
#[derive(Debug)]
pub struct Compositor {
    /// All layers by ID
    layers: HashMap<LayerId, Layer>,
    /// Layers sorted by z-index for rendering
    render_order: Vec<LayerId>,
    /// Next layer ID to assign
    next_id: u32,
    /// Output buffer (composited result)
    output: Buffer,
    /// Total area
    area: Rect,
}

impl Compositor {
    /// Create a new compositor for the given area
    #[must_use]
    pub fn new(area: Rect) -> Self {
        Self {
            layers: HashMap::new(),
            render_order: Vec::new(),
            next_id: 0,
            output: Buffer::empty(area),
            area,
        }
    }

    /// Create a new layer and return its ID
    pub fn create_layer(&mut self, bounds: Rect, z_index: i32) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;

        self.layers.insert(id, Layer::new(bounds, z_index));
        self.update_render_order();

        id
    }

    /// Get mutable access to a layer's buffer for rendering
    pub fn layer_buffer_mut(&mut self, id: LayerId) -> Option<&mut Buffer> {
        self.layers.get_mut(&id).map(|l| &mut l.buffer)
    }

    /// Move and resize a layer
    pub fn set_bounds(&mut self, id: LayerId, bounds: Rect) {
        if let Some(layer) = self.layers.get_mut(&id) {
            layer.set_bounds(bounds);
        }
    }

    /// Set layer visibility
    pub fn set_visible(&mut self, id: LayerId, visible: bool) {
        if let Some(layer) = self.layers.get_mut(&id) {
            layer.visible = visible;
        }
    }

    /// Make a layer cover everything beneath it
    pub fn set_opaque(&mut self, id: LayerId, opaque: bool) {
        if let Some(layer) = self.layers.get_mut(&id) {
            layer.opaque = opaque;
        }
    }

    /// Resize the entire compositor
    pub fn resize(&mut self, area: Rect) {
        self.area = area;
        self.output = Buffer::empty(area);
    }

    /// Current output area
    #[must_use]
    pub fn area(&self) -> Rect {
        self.area
    }

    /// Composite all visible layers into the output buffer
    pub fn composite(&mut self) -> &Buffer {
        self.output.reset();

        // Back to front.
        for id in &self.render_order {
            if let Some(layer) = self.layers.get(id) {
                if layer.visible {
                    Self::blit_layer(&mut self.output, self.area, layer);
                }
            }
        }

        &self.output
    }

    fn blit_layer(output: &mut Buffer, area: Rect, layer: &Layer) {
        let lb = layer.bounds;

        for ly in 0..lb.height.min(layer.buffer.area.height) {
            for lx in 0..lb.width.min(layer.buffer.area.width) {
                let dst_x = lb.x.saturating_add(lx);
                let dst_y = lb.y.saturating_add(ly);
                if dst_x >= area.width || dst_y >= area.height {
                    continue;
                }

                let src_cell = &layer.buffer[(lx, ly)];
                if layer.opaque || src_cell.symbol() != " " {
                    output[(dst_x, dst_y)] = src_cell.clone();
                }
            }
        }
    }

    fn update_render_order(&mut self) {
        self.render_order = self.layers.keys().copied().collect();
        let layers = &self.layers;
        self.render_order
            .sort_by_key(|id| (layers.get(id).map_or(0, |l| l.z_index), id.0));
    }
}
