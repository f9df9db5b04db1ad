//! Scaled overview of the whole graph with the visible area outlined.

use super::render::{Painter, Stroke};
use super::state::FlowEditor;
use super::types::{Point, Rect, Size};

const MARGIN: f64 = 10.0;
const BACKGROUND: &str = "rgba(20, 20, 36, 0.9)";
const VIEWPORT_COLOR: &str = "rgba(255, 255, 255, 0.8)";

/// Uniform world -> minimap mapping that fits `bounds` inside the minimap with a margin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinimapProjection {
	scale: f64,
	offset: Point,
}

impl MinimapProjection {
	/// Chooses one scale for both axes and centres `bounds` in `size`.
	pub fn new(bounds: &Rect, size: Size, margin: f64) -> Self {
		let avail = Size::new(
			(size.width - 2.0 * margin).max(1.0),
			(size.height - 2.0 * margin).max(1.0),
		);
		let scale = (avail.width / bounds.size.width.max(1.0))
			.min(avail.height / bounds.size.height.max(1.0));
		let used = Size::new(bounds.size.width * scale, bounds.size.height * scale);
		let offset = Point::new(
			(size.width - used.width) / 2.0 - bounds.origin.x * scale,
			(size.height - used.height) / 2.0 - bounds.origin.y * scale,
		);
		Self { scale, offset }
	}

	/// Projection for the editor's current graph, or its visible area when the graph is empty.
	pub fn for_editor(editor: &FlowEditor) -> Self {
		let bounds = editor
			.graph()
			.bounds()
			.unwrap_or_else(|| editor.viewport().visible_world(editor.screen_size()));
		Self::new(&bounds, editor.config().minimap_size, MARGIN)
	}

	/// World units to minimap pixels.
	pub fn scale(&self) -> f64 {
		self.scale
	}

	/// World point to minimap pixels.
	pub fn project(&self, world: Point) -> Point {
		world * self.scale + self.offset
	}

	/// Minimap pixels to world point.
	pub fn unproject(&self, mini: Point) -> Point {
		(mini - self.offset) / self.scale
	}

	/// World rectangle to minimap pixels.
	pub fn project_rect(&self, rect: &Rect) -> Rect {
		Rect::new(
			self.project(rect.origin),
			Size::new(rect.size.width * self.scale, rect.size.height * self.scale),
		)
	}
}

/// Draws the minimap: background, one rectangle per block, then the viewport outline.
pub fn render_minimap(editor: &FlowEditor, painter: &mut impl Painter) {
	let size = editor.config().minimap_size;
	painter.clear(size, BACKGROUND);
	let projection = MinimapProjection::for_editor(editor);
	let registry = editor.graph().registry();
	for block in editor.graph().blocks() {
		let color = registry
			.get(&block.type_key)
			.map(|t| t.category.color())
			.unwrap_or(VIEWPORT_COLOR);
		painter.fill_rect(projection.project_rect(&block.rect()), color);
	}
	let visible = editor.viewport().visible_world(editor.screen_size());
	painter.stroke_rect(
		projection.project_rect(&visible),
		Stroke::solid(VIEWPORT_COLOR, 1.0),
	);
}

/// Centres the main viewport on the world point under a minimap click.
pub fn navigate_to(editor: &mut FlowEditor, mini: Point) {
	let world = MinimapProjection::for_editor(editor).unproject(mini);
	editor.center_on(world);
}
