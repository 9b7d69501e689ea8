// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canvas configuration.

use crate::geometry::Grid;
use crate::node::NodeLayout;
use crate::router::Router;
use serde::{Deserialize, Serialize};

/// Default side of a grid cell in pixels
pub const DEFAULT_CELL_SIZE: f32 = 24.0;

/// Canvas settings. Everything geometric is derived from the cell size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Canvas width in pixels
    pub width: f32,
    /// Canvas height in pixels
    pub height: f32,
    /// Side of one grid cell
    pub cell_size: f32,
    /// Visible connector stroke width
    pub stroke_width: f32,
    /// Overlay (hit-test) stroke width as a multiple of the visible stroke
    pub overlay_stroke_factor: f32,
    /// Node body width in cells
    pub body_width_cells: f32,
    /// Minimum node body height in cells
    pub min_body_height_cells: f32,
    /// Width of a port label box relative to the body width
    pub port_label_ratio: f32,
    /// Viewport scroll step during drag, in cells
    pub auto_scroll_cells: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CELL_SIZE * 100.0,
            height: DEFAULT_CELL_SIZE * 60.0,
            cell_size: DEFAULT_CELL_SIZE,
            stroke_width: 1.0,
            overlay_stroke_factor: 13.0,
            body_width_cells: 8.0,
            min_body_height_cells: 4.0,
            port_label_ratio: 0.4,
            auto_scroll_cells: 1.0,
        }
    }
}

impl CanvasConfig {
    /// Create a config for a canvas of the given pixel size
    pub fn with_size(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// How far ports stick out of the node body
    pub fn port_overhang(&self) -> f32 {
        self.cell_size / 2.0
    }

    /// Grid derived from this config
    pub fn grid(&self) -> Grid {
        Grid {
            cell_size: self.cell_size,
            width: self.width,
            height: self.height,
            port_overhang: self.port_overhang(),
        }
    }

    /// Node geometry derived from this config
    pub fn node_layout(&self) -> NodeLayout {
        let body_width = self.cell_size * self.body_width_cells;
        NodeLayout {
            cell_size: self.cell_size,
            body_width,
            min_body_height: self.cell_size * self.min_body_height_cells,
            port_overhang: self.port_overhang(),
            port_width: self.port_overhang() + body_width * self.port_label_ratio,
        }
    }

    /// Connector router derived from this config
    pub fn router(&self) -> Router {
        Router {
            cell_size: self.cell_size,
            stroke_width: self.stroke_width,
            overlay_width: self.stroke_width * self.overlay_stroke_factor,
        }
    }

    /// How far the viewport scrolls per drag step, and how close to an edge a node
    /// must come to trigger it
    pub fn auto_scroll_step(&self) -> f32 {
        self.cell_size * self.auto_scroll_cells
    }

    /// Serialize to RON
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Deserialize from RON; missing fields take their defaults
    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }
}
