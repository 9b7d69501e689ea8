// SPDX-License-Identifier: MIT OR Apache-2.0
//! egui rendering and input for a [`Canvas`].
//!
//! The view only reads canvas state and calls the canvas's public API. It draws:
//! - Dot grid
//! - Node bodies with a title row
//! - Ports with their labels
//! - Routed connectors, flattened to polylines
//! - The placement marker and the unfinished connector

use crate::canvas::{Canvas, CanvasKey, HitTarget, InteractionMode};
use crate::emphasis::Emphasis;
use crate::geometry::{Point, Rect, Size};
use crate::node::Node;
use crate::port::PortDirection;
use crate::router::RoutedPath;
use egui::{Color32, Pos2, Shape, Stroke, Vec2};

const NODE_ROUNDING: f32 = 4.0;
const DOT_RADIUS: f32 = 1.0;
const ANCHOR_RADIUS: f32 = 3.0;
const MARKER_DASH: f32 = 6.0;

/// Colors used by [`CanvasView`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasPalette {
    /// Canvas background
    pub background: Color32,
    /// Grid dots
    pub grid: Color32,
    /// Node body fill
    pub node_fill: Color32,
    /// Node outline and title separator
    pub node_outline: Color32,
    /// Port box fill
    pub port_fill: Color32,
    /// Connector stroke
    pub connector: Color32,
    /// Text
    pub text: Color32,
    /// Hover highlight
    pub highlight: Color32,
    /// Selection
    pub selection: Color32,
}

impl Default for CanvasPalette {
    fn default() -> Self {
        Self {
            background: Color32::from_rgb(32, 32, 36),
            grid: Color32::from_rgba_unmultiplied(90, 90, 90, 140),
            node_fill: Color32::from_rgb(45, 45, 48),
            node_outline: Color32::from_gray(90),
            port_fill: Color32::from_rgb(60, 64, 72),
            connector: Color32::from_gray(170),
            text: Color32::from_gray(220),
            highlight: Color32::from_rgb(230, 180, 80),
            selection: Color32::from_rgb(100, 150, 255),
        }
    }
}

impl CanvasPalette {
    fn emphasized(&self, emphasis: Emphasis, normal: Color32) -> Color32 {
        match emphasis {
            Emphasis::Normal => normal,
            Emphasis::Highlighted => self.highlight,
            Emphasis::Selected => self.selection,
        }
    }
}

/// Maps between canvas coordinates and screen positions
#[derive(Debug, Clone, Copy, PartialEq)]
struct Transform {
    origin: Pos2,
    scroll: Point,
}

impl Transform {
    fn to_screen(self, point: Point) -> Pos2 {
        Pos2::new(
            self.origin.x + point.x - self.scroll.x,
            self.origin.y + point.y - self.scroll.y,
        )
    }

    fn to_canvas(self, pos: Pos2) -> Point {
        Point::new(
            pos.x - self.origin.x + self.scroll.x,
            pos.y - self.origin.y + self.scroll.y,
        )
    }

    fn rect_to_screen(self, rect: Rect) -> egui::Rect {
        egui::Rect::from_min_size(
            self.to_screen(rect.min),
            Vec2::new(rect.size.width, rect.size.height),
        )
    }

    fn path_to_screen(self, path: &RoutedPath) -> Vec<Pos2> {
        path.flatten().into_iter().map(|p| self.to_screen(p)).collect()
    }
}

/// Draws a [`Canvas`] into an egui `Ui` and feeds it pointer and keyboard input
#[derive(Debug, Clone)]
pub struct CanvasView {
    /// Colors
    pub palette: CanvasPalette,
    /// Whether to draw the dot grid
    pub show_grid: bool,
}

impl CanvasView {
    /// Create a view with the default palette and the grid visible
    pub fn new() -> Self {
        Self {
            palette: CanvasPalette::default(),
            show_grid: true,
        }
    }

    /// Handle input for this frame, settle finished callbacks and draw the canvas
    pub fn show(&mut self, ui: &mut egui::Ui, canvas: &mut Canvas) -> egui::Response {
        let rect = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
        canvas.set_viewport_size(Size::new(rect.width(), rect.height()));

        self.handle_input(ui, &response, rect, canvas);
        if canvas.pump() > 0 || canvas.pending_notifications() > 0 {
            ui.ctx().request_repaint();
        }

        let painter = ui.painter_at(rect);
        let transform = Transform {
            origin: rect.min,
            scroll: canvas.viewport().scroll,
        };
        painter.rect_filled(rect, 0.0, self.palette.background);
        if self.show_grid {
            self.draw_grid(&painter, canvas, transform);
        }
        self.draw_connectors(&painter, canvas, transform);
        for node in canvas.graph().nodes() {
            self.draw_node(&painter, node, transform);
        }
        self.draw_mode(&painter, canvas, transform);

        response
    }

    fn handle_input(
        &self,
        ui: &egui::Ui,
        response: &egui::Response,
        rect: egui::Rect,
        canvas: &mut Canvas,
    ) {
        let scroll_delta = ui.input(|i| i.smooth_scroll_delta);
        if response.hovered() && scroll_delta != Vec2::ZERO {
            let scroll = canvas.viewport().scroll;
            canvas.scroll_to(scroll.translate(-scroll_delta.x, -scroll_delta.y));
        }

        let transform = Transform {
            origin: rect.min,
            scroll: canvas.viewport().scroll,
        };

        let target = match response.hover_pos() {
            Some(pos) => {
                let point = transform.to_canvas(pos);
                canvas.pointer_moved(point);
                Some(canvas.hit_test(point))
            }
            None => None,
        };
        canvas.hover(target.clone());

        if response.drag_started() {
            let origin = ui.input(|i| i.pointer.press_origin());
            if let Some(HitTarget::Node(id)) = origin.map(|pos| canvas.hit_test(transform.to_canvas(pos))) {
                canvas.begin_drag(id);
            }
        }
        if response.dragged() && canvas.mode().is_dragging() {
            let delta = response.drag_delta();
            canvas.drag_by(delta.x, delta.y);
        }
        if response.drag_stopped() {
            canvas.end_drag();
        }

        if let Some(target) = target {
            if response.double_clicked() {
                canvas.double_click(target);
            } else if response.clicked() {
                canvas.click(target);
            }
        }
        if response.clicked_elsewhere() {
            canvas.blur();
        }

        if canvas.is_focused() {
            let keys: Vec<CanvasKey> = ui.input(|i| {
                [
                    (egui::Key::Escape, CanvasKey::Escape),
                    (egui::Key::Delete, CanvasKey::Delete),
                    (egui::Key::Backspace, CanvasKey::Backspace),
                ]
                .into_iter()
                .filter(|(key, _)| i.key_pressed(*key))
                .map(|(_, key)| key)
                .collect()
            });
            for key in keys {
                canvas.handle_key(key);
            }
        }
    }

    fn draw_grid(&self, painter: &egui::Painter, canvas: &Canvas, transform: Transform) {
        let cell = canvas.grid().cell_size;
        let view = canvas.viewport().rect();
        let first_x = (view.left() / cell).ceil() * cell;
        let first_y = (view.top() / cell).ceil() * cell;

        let mut y = first_y;
        while y <= view.bottom().min(canvas.config().height) {
            let mut x = first_x;
            while x <= view.right().min(canvas.config().width) {
                painter.circle_filled(transform.to_screen(Point::new(x, y)), DOT_RADIUS, self.palette.grid);
                x += cell;
            }
            y += cell;
        }
    }

    fn draw_connectors(&self, painter: &egui::Painter, canvas: &Canvas, transform: Transform) {
        for connector in canvas.graph().connectors() {
            let path = connector.path();
            let color = self.palette.emphasized(connector.emphasis(), self.palette.connector);
            let width = match connector.emphasis() {
                Emphasis::Normal => path.stroke_width,
                Emphasis::Highlighted | Emphasis::Selected => path.stroke_width * 2.0,
            };
            painter.add(Shape::line(
                transform.path_to_screen(&path.main),
                Stroke::new(width, color),
            ));
        }
    }

    fn draw_node(&self, painter: &egui::Painter, node: &Node, transform: Transform) {
        let layout = node.layout();
        let body = transform.rect_to_screen(node.body());
        let outline = self.palette.emphasized(node.emphasis(), self.palette.node_outline);
        let fill = if node.is_ready() {
            self.palette.node_fill
        } else {
            self.palette.node_fill.gamma_multiply(0.5)
        };

        painter.rect_filled(body, NODE_ROUNDING, fill);
        painter.rect_stroke(body, NODE_ROUNDING, Stroke::new(1.0, outline));

        // Title row
        let title_bottom = body.top() + layout.cell_size * 1.5;
        painter.text(
            Pos2::new(body.center().x, body.top() + layout.cell_size * 0.75),
            egui::Align2::CENTER_CENTER,
            &node.title,
            egui::FontId::proportional(layout.cell_size * 0.5),
            self.palette.text,
        );
        painter.line_segment(
            [Pos2::new(body.left(), title_bottom), Pos2::new(body.right(), title_bottom)],
            Stroke::new(1.0, self.palette.node_outline),
        );

        for port in node.ports() {
            let rect = transform.rect_to_screen(node.port_rect(port));
            let color = self.palette.emphasized(port.emphasis(), self.palette.node_outline);
            painter.rect_filled(rect, NODE_ROUNDING / 2.0, self.palette.port_fill);
            painter.rect_stroke(rect, NODE_ROUNDING / 2.0, Stroke::new(1.0, color));

            let (anchor, label_pos, align) = match port.direction {
                PortDirection::Input => (
                    rect.left_center(),
                    rect.left_center() + Vec2::new(layout.port_overhang * 1.5, 0.0),
                    egui::Align2::LEFT_CENTER,
                ),
                PortDirection::Output => (
                    rect.right_center(),
                    rect.right_center() - Vec2::new(layout.port_overhang * 1.5, 0.0),
                    egui::Align2::RIGHT_CENTER,
                ),
            };
            painter.circle_filled(anchor, ANCHOR_RADIUS, color);
            painter.text(
                label_pos,
                align,
                &port.name,
                egui::FontId::proportional(layout.cell_size * 0.45),
                self.palette.text,
            );
        }
    }

    fn draw_mode(&self, painter: &egui::Painter, canvas: &Canvas, transform: Transform) {
        match canvas.mode() {
            InteractionMode::Placing { marker } => {
                let r = transform.rect_to_screen(*marker);
                let outline = [
                    r.left_top(),
                    r.right_top(),
                    r.right_bottom(),
                    r.left_bottom(),
                    r.left_top(),
                ];
                painter.extend(Shape::dashed_line(
                    &outline,
                    Stroke::new(1.0, self.palette.highlight),
                    MARKER_DASH,
                    MARKER_DASH,
                ));
            }
            InteractionMode::Connecting(pending) => {
                painter.add(Shape::line(
                    transform.path_to_screen(&pending.path.main),
                    Stroke::new(pending.path.stroke_width * 2.0, self.palette.selection),
                ));
            }
            InteractionMode::Idle | InteractionMode::Dragging(_) => {}
        }
    }
}

impl Default for CanvasView {
    fn default() -> Self {
        Self::new()
    }
}
