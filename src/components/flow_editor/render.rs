//! Frame rendering against an abstract immediate-mode painter.

use super::graph::{Block, PortDirection, PortRef};
use super::interaction::Interaction;
use super::state::{FlowEditor, Selection};
use super::types::{Point, Rect, Size};

const BACKGROUND: &str = "#1a1a2e";
const GRID_COLOR: &str = "rgba(255, 255, 255, 0.06)";
const CONNECTION_COLOR: &str = "rgba(100, 180, 255, 0.8)";
const CONNECTION_SELECTED: &str = "#ffd166";
const PREVIEW_COLOR: &str = "rgba(255, 255, 255, 0.7)";
const BLOCK_FILL: &str = "#24243a";
const BLOCK_BORDER: &str = "#3c3c5a";
const BLOCK_HOVER: &str = "#8ab4f8";
const BLOCK_SELECTED: &str = "#ffd166";
const INPUT_PORT: &str = "#4fc3f7";
const OUTPUT_PORT: &str = "#f78c6c";
const LABEL_FILL: &str = "rgba(0, 0, 0, 0.8)";
const TEXT_COLOR: &str = "#e6e6f0";

/// Port marker radius in screen pixels, independent of zoom.
pub const PORT_RADIUS: f64 = 5.0;
const ARROW_SIZE: f64 = 8.0;
const MIN_GRID_SPACING: f64 = 6.0;
const ACCENT_HEIGHT: f64 = 4.0;

/// Line style.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke<'a> {
	/// CSS colour.
	pub color: &'a str,
	/// Width in screen pixels.
	pub width: f64,
	/// Dash and gap lengths, `None` for a solid line.
	pub dash: Option<(f64, f64)>,
}

impl<'a> Stroke<'a> {
	/// Solid line.
	pub fn solid(color: &'a str, width: f64) -> Self {
		Self {
			color,
			width,
			dash: None,
		}
	}

	/// Dashed line.
	pub fn dashed(color: &'a str, width: f64, dash: f64, gap: f64) -> Self {
		Self {
			color,
			width,
			dash: Some((dash, gap)),
		}
	}
}

/// Cubic bezier in screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier {
	/// Start point.
	pub start: Point,
	/// First control point.
	pub c1: Point,
	/// Second control point.
	pub c2: Point,
	/// End point.
	pub end: Point,
}

impl CubicBezier {
	/// Point at parameter `t` in `[0, 1]`.
	pub fn point_at(&self, t: f64) -> Point {
		let u = 1.0 - t;
		self.start * (u * u * u)
			+ self.c1 * (3.0 * u * u * t)
			+ self.c2 * (3.0 * u * t * t)
			+ self.end * (t * t * t)
	}
}

/// Curve leaving `from` to the right and entering `to` from the left.
pub fn connection_curve(from: Point, to: Point) -> CubicBezier {
	let handle = ((to.x - from.x).abs() * 0.5).max(50.0);
	CubicBezier {
		start: from,
		c1: Point::new(from.x + handle, from.y),
		c2: Point::new(to.x - handle, to.y),
		end: to,
	}
}

/// Immediate-mode drawing surface in screen coordinates.
pub trait Painter {
	/// Fills the whole surface.
	fn clear(&mut self, size: Size, color: &str);
	/// Filled rectangle.
	fn fill_rect(&mut self, rect: Rect, color: &str);
	/// Rectangle outline.
	fn stroke_rect(&mut self, rect: Rect, stroke: Stroke<'_>);
	/// Straight segment.
	fn line(&mut self, from: Point, to: Point, stroke: Stroke<'_>);
	/// Cubic bezier.
	fn bezier(&mut self, curve: &CubicBezier, stroke: Stroke<'_>);
	/// Filled circle.
	fn fill_circle(&mut self, center: Point, radius: f64, color: &str);
	/// Filled closed polygon.
	fn fill_polygon(&mut self, points: &[Point], color: &str);
	/// Text with its baseline starting at `at`.
	fn text(&mut self, at: Point, text: &str, size: f64, color: &str);
}

/// Draws one frame: grid, connections, preview, blocks, ports, then the hovered port's label.
pub fn render(editor: &FlowEditor, painter: &mut impl Painter) {
	painter.clear(editor.screen_size(), BACKGROUND);
	if editor.config().show_grid {
		draw_grid(editor, painter);
	}
	draw_connections(editor, painter);
	draw_preview(editor, painter);
	draw_blocks(editor, painter);
	draw_ports(editor, painter);
	draw_port_label(editor, painter);
}

fn draw_grid(editor: &FlowEditor, painter: &mut impl Painter) {
	let viewport = editor.viewport();
	let mut step = editor.config().grid_size;
	if step <= 0.0 {
		return;
	}
	while step * viewport.zoom < MIN_GRID_SPACING {
		step *= 2.0;
	}
	let screen = editor.screen_size();
	let visible = viewport.visible_world(screen);
	let stroke = Stroke::solid(GRID_COLOR, 1.0);

	let mut x = (visible.origin.x / step).floor() * step;
	while x <= visible.right() {
		let sx = viewport.world_to_screen(Point::new(x, 0.0)).x;
		painter.line(Point::new(sx, 0.0), Point::new(sx, screen.height), stroke);
		x += step;
	}
	let mut y = (visible.origin.y / step).floor() * step;
	while y <= visible.bottom() {
		let sy = viewport.world_to_screen(Point::new(0.0, y)).y;
		painter.line(Point::new(0.0, sy), Point::new(screen.width, sy), stroke);
		y += step;
	}
}

fn draw_connections(editor: &FlowEditor, painter: &mut impl Painter) {
	let (graph, viewport) = (editor.graph(), editor.viewport());
	for connection in graph.connections() {
		let Some((from, to)) = graph.connection_endpoints(connection) else {
			continue;
		};
		let selected = editor.selection() == Selection::Connection(connection.id);
		let color = if selected {
			CONNECTION_SELECTED
		} else {
			CONNECTION_COLOR
		};
		let curve = connection_curve(viewport.world_to_screen(from), viewport.world_to_screen(to));
		painter.bezier(&curve, Stroke::solid(color, if selected { 3.0 } else { 2.0 }));
		draw_arrowhead(painter, &curve, color);
		if selected {
			painter.fill_circle(curve.point_at(0.5), 4.0, color);
		}
	}
}

fn draw_arrowhead(painter: &mut impl Painter, curve: &CubicBezier, color: &str) {
	let (dx, dy) = (curve.end.x - curve.c2.x, curve.end.y - curve.c2.y);
	let len = (dx * dx + dy * dy).sqrt();
	if len < 0.001 {
		return;
	}
	let (ux, uy) = (dx / len, dy / len);
	let tip = Point::new(curve.end.x - ux * PORT_RADIUS, curve.end.y - uy * PORT_RADIUS);
	let back = Point::new(tip.x - ux * ARROW_SIZE, tip.y - uy * ARROW_SIZE);
	let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);
	painter.fill_polygon(
		&[
			tip,
			Point::new(back.x + px, back.y + py),
			Point::new(back.x - px, back.y - py),
		],
		color,
	);
}

fn draw_preview(editor: &FlowEditor, painter: &mut impl Painter) {
	let Interaction::ConnectingPort { origin, cursor } = *editor.interaction() else {
		return;
	};
	let viewport = editor.viewport();
	let Some(anchor) = editor.graph().port_position(origin) else {
		return;
	};
	let (anchor, cursor) = (viewport.world_to_screen(anchor), viewport.world_to_screen(cursor));
	let curve = match origin.direction {
		PortDirection::Output => connection_curve(anchor, cursor),
		PortDirection::Input => connection_curve(cursor, anchor),
	};
	painter.bezier(&curve, Stroke::dashed(PREVIEW_COLOR, 2.0, 8.0, 4.0));
}

fn draw_blocks(editor: &FlowEditor, painter: &mut impl Painter) {
	let (graph, viewport) = (editor.graph(), editor.viewport());
	let zoom = viewport.zoom;
	for block in graph.blocks() {
		let rect = viewport.rect_to_screen(&block.rect());
		painter.fill_rect(rect, BLOCK_FILL);

		let border = if editor.selection() == Selection::Block(block.id) {
			Stroke::solid(BLOCK_SELECTED, 2.0)
		} else if editor.hover().block == Some(block.id) {
			Stroke::solid(BLOCK_HOVER, 1.5)
		} else {
			Stroke::solid(BLOCK_BORDER, 1.0)
		};
		painter.stroke_rect(rect, border);

		let accent = graph
			.registry()
			.get(&block.type_key)
			.map(|t| t.category.color())
			.unwrap_or(BLOCK_BORDER);
		painter.fill_rect(
			Rect::new(rect.origin, Size::new(rect.size.width, ACCENT_HEIGHT * zoom)),
			accent,
		);
		painter.text(
			Point::new(rect.origin.x + 10.0 * zoom, rect.origin.y + 24.0 * zoom),
			&block_title(editor, block),
			13.0 * zoom,
			TEXT_COLOR,
		);
	}
}

fn block_title(editor: &FlowEditor, block: &Block) -> String {
	match editor.graph().registry().get(&block.type_key) {
		Some(t) => format!("{} {}", t.icon, t.name),
		None => block.type_key.clone(),
	}
}

fn draw_ports(editor: &FlowEditor, painter: &mut impl Painter) {
	let (graph, viewport) = (editor.graph(), editor.viewport());
	let hovered = editor.hover().port;
	for block in graph.blocks() {
		for (direction, color) in [
			(PortDirection::Input, INPUT_PORT),
			(PortDirection::Output, OUTPUT_PORT),
		] {
			for index in 0..block.ports(direction).len() {
				let Some(world) = block.port_position(direction, index) else {
					continue;
				};
				let port = PortRef {
					block: block.id,
					direction,
					index,
				};
				let radius = if hovered == Some(port) {
					PORT_RADIUS + 2.0
				} else {
					PORT_RADIUS
				};
				painter.fill_circle(viewport.world_to_screen(world), radius, color);
			}
		}
	}
}

fn draw_port_label(editor: &FlowEditor, painter: &mut impl Painter) {
	let Some(port) = editor.hover().port else {
		return;
	};
	let graph = editor.graph();
	let Some(block) = graph.block(port.block) else {
		return;
	};
	let (Some(spec), Some(world)) = (
		block.ports(port.direction).get(port.index),
		block.port_position(port.direction, port.index),
	) else {
		return;
	};
	let label = format!("{}: {}", spec.name, spec.data_type);
	let center = editor.viewport().world_to_screen(world);
	let size = Size::new(label.chars().count() as f64 * 7.0 + 12.0, 20.0);
	let x = match port.direction {
		PortDirection::Output => center.x + PORT_RADIUS + 6.0,
		PortDirection::Input => center.x - PORT_RADIUS - 6.0 - size.width,
	};
	let tag = Rect::new(Point::new(x, center.y - size.height / 2.0), size);
	painter.fill_rect(tag, LABEL_FILL);
	painter.text(
		Point::new(tag.origin.x + 6.0, tag.origin.y + 14.0),
		&label,
		12.0,
		TEXT_COLOR,
	);
}
