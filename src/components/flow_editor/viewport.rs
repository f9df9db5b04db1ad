//! Screen <-> world mapping.
//!
//! `world_to_screen(p) = p * zoom + pan` and `screen_to_world(p) = (p - pan) / zoom`. Every hit test and
//! draw call goes through these two functions, so they must stay exact inverses.

use super::config::EditorConfig;
use super::types::{Point, Rect, Size};

/// Camera state. Not part of undo history.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
	/// Screen-space offset of the world origin.
	pub pan: Point,
	/// Scale factor, always within `[min_zoom, max_zoom]`.
	pub zoom: f64,
	min_zoom: f64,
	max_zoom: f64,
	zoom_step: f64,
}

impl Default for Viewport {
	fn default() -> Self {
		Self::new(&EditorConfig::default())
	}
}

impl Viewport {
	/// Identity camera (as close as the limits allow) with limits taken from `config`.
	pub fn new(config: &EditorConfig) -> Self {
		let config = config.sanitized();
		Self {
			pan: Point::ZERO,
			zoom: 1.0_f64.clamp(config.min_zoom, config.max_zoom),
			min_zoom: config.min_zoom,
			max_zoom: config.max_zoom,
			zoom_step: config.zoom_step,
		}
	}

	/// World point to screen pixels.
	pub fn world_to_screen(&self, p: Point) -> Point {
		p * self.zoom + self.pan
	}

	/// Screen pixels to world point.
	pub fn screen_to_world(&self, p: Point) -> Point {
		(p - self.pan) / self.zoom
	}

	/// World-space rectangle to screen space.
	pub fn rect_to_screen(&self, rect: &Rect) -> Rect {
		Rect::new(
			self.world_to_screen(rect.origin),
			Size::new(rect.size.width * self.zoom, rect.size.height * self.zoom),
		)
	}

	/// The part of the world visible on a canvas of `screen` size.
	pub fn visible_world(&self, screen: Size) -> Rect {
		Rect::from_corners(
			self.screen_to_world(Point::ZERO),
			self.screen_to_world(Point::new(screen.width, screen.height)),
		)
	}

	/// Additive pan in screen pixels.
	pub fn pan_by(&mut self, delta: Point) {
		self.pan = self.pan + delta;
	}

	/// Sets zoom (clamped) keeping the world point under `anchor` fixed on screen.
	pub fn zoom_about(&mut self, anchor: Point, zoom: f64) {
		if !zoom.is_finite() {
			return;
		}
		let world = self.screen_to_world(anchor);
		self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
		self.pan = anchor - world * self.zoom;
	}

	/// One multiplicative step in (`steps > 0`) or out about `anchor`.
	pub fn zoom_step_about(&mut self, anchor: Point, steps: i32) {
		self.zoom_about(anchor, self.zoom * self.zoom_step.powi(steps));
	}

	/// Back to identity.
	pub fn reset(&mut self) {
		self.pan = Point::ZERO;
		self.zoom = 1.0_f64.clamp(self.min_zoom, self.max_zoom);
	}

	/// Pans so `world` sits at the centre of a canvas of `screen` size.
	pub fn center_on(&mut self, world: Point, screen: Size) {
		let center = Point::new(screen.width / 2.0, screen.height / 2.0);
		self.pan = center - world * self.zoom;
	}

	/// Frames `bounds` inside `screen` with `margin` pixels on every side.
	pub fn fit(&mut self, bounds: &Rect, screen: Size, margin: f64) {
		let avail_w = (screen.width - 2.0 * margin).max(1.0);
		let avail_h = (screen.height - 2.0 * margin).max(1.0);
		let zoom = if bounds.size.width <= 0.0 || bounds.size.height <= 0.0 {
			1.0
		} else {
			(avail_w / bounds.size.width).min(avail_h / bounds.size.height)
		};
		self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
		self.center_on(bounds.center(), screen);
	}
}

/// Grid snapping. Identity when disabled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSnap {
	/// Spacing in world units.
	pub size: f64,
	/// Whether snapping is applied.
	pub enabled: bool,
}

impl GridSnap {
	/// Snapping settings taken from `config`.
	pub fn new(config: &EditorConfig) -> Self {
		Self {
			size: config.grid_size,
			enabled: config.snap_to_grid,
		}
	}

	/// Rounds each axis to the nearest grid multiple. Idempotent.
	pub fn snap(&self, p: Point) -> Point {
		if !self.enabled || !(self.size.is_finite() && self.size > 0.0) {
			return p;
		}
		Point::new(
			(p.x / self.size).round() * self.size,
			(p.y / self.size).round() * self.size,
		)
	}
}

impl Default for GridSnap {
	fn default() -> Self {
		Self::new(&EditorConfig::default())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const EPS: f64 = 1e-9;

	fn close(a: Point, b: Point) -> bool {
		(a.x - b.x).abs() < EPS * (1.0 + a.x.abs()) && (a.y - b.y).abs() < EPS * (1.0 + a.y.abs())
	}

	#[test]
	fn inverted_zoom_limits_do_not_panic() {
		let config: EditorConfig = serde_json::from_str(r#"{"minZoom": 5.0}"#).unwrap();
		let mut viewport = Viewport::new(&config);
		viewport.zoom_step_about(Point::new(100.0, 100.0), 1);
		viewport.zoom_step_about(Point::new(100.0, 100.0), -3);
		viewport.fit(&Rect::new(Point::ZERO, Size::new(10.0, 10.0)), Size::new(800.0, 600.0), 20.0);
		assert_eq!(viewport.zoom, 5.0);

		let nan = EditorConfig {
			min_zoom: f64::NAN,
			..EditorConfig::default()
		};
		let mut viewport = Viewport::new(&nan);
		viewport.zoom_about(Point::ZERO, f64::NAN);
		viewport.zoom_step_about(Point::ZERO, 2);
		assert!(viewport.zoom.is_finite());
	}

	#[test]
	fn screen_world_round_trip() {
		let mut viewport = Viewport::default();
		for &(pan, zoom) in &[
			(Point::new(0.0, 0.0), 1.0),
			(Point::new(-350.5, 120.25), 0.1),
			(Point::new(77.0, -9.0), 3.0),
			(Point::new(1e4, 1e4), 1.7),
		] {
			viewport.pan = pan;
			viewport.zoom = zoom;
			for &p in &[
				Point::new(0.0, 0.0),
				Point::new(13.3, -8.8),
				Point::new(-1e5, 2e5),
			] {
				assert!(close(viewport.screen_to_world(viewport.world_to_screen(p)), p));
				assert!(close(viewport.world_to_screen(viewport.screen_to_world(p)), p));
			}
		}
	}

	#[test]
	fn zoom_is_clamped_and_multiplicative() {
		let mut viewport = Viewport::default();
		viewport.zoom_step_about(Point::ZERO, 1);
		assert!((viewport.zoom - 1.2).abs() < EPS);
		viewport.zoom_step_about(Point::ZERO, -1);
		assert!((viewport.zoom - 1.0).abs() < EPS);
		viewport.zoom_step_about(Point::ZERO, 50);
		assert_eq!(viewport.zoom, 3.0);
		viewport.zoom_step_about(Point::ZERO, -100);
		assert_eq!(viewport.zoom, 0.1);
	}

	#[test]
	fn zoom_keeps_anchor_fixed() {
		let mut viewport = Viewport::default();
		viewport.pan = Point::new(40.0, -20.0);
		let anchor = Point::new(400.0, 300.0);
		let before = viewport.screen_to_world(anchor);
		viewport.zoom_step_about(anchor, 2);
		assert!(close(viewport.screen_to_world(anchor), before));
	}

	#[test]
	fn pan_is_additive() {
		let mut viewport = Viewport::default();
		viewport.pan_by(Point::new(10.0, 5.0));
		viewport.pan_by(Point::new(-3.0, 2.0));
		assert_eq!(viewport.pan, Point::new(7.0, 7.0));
	}

	#[test]
	fn snap_is_idempotent() {
		let snap = GridSnap::default();
		for &p in &[
			Point::new(0.0, 0.0),
			Point::new(9.99, 10.01),
			Point::new(-29.0, 31.0),
			Point::new(123456.7, -0.4),
		] {
			let once = snap.snap(p);
			assert_eq!(snap.snap(once), once);
			assert_eq!(once.x % 20.0, 0.0);
		}
	}

	#[test]
	fn disabled_snap_is_identity() {
		let snap = GridSnap {
			size: 20.0,
			enabled: false,
		};
		let p = Point::new(13.7, -2.2);
		assert_eq!(snap.snap(p), p);
	}

	#[test]
	fn fit_centres_bounds() {
		let mut viewport = Viewport::default();
		let bounds = Rect::new(Point::new(100.0, 100.0), Size::new(400.0, 200.0));
		let screen = Size::new(800.0, 600.0);
		viewport.fit(&bounds, screen, 40.0);
		let center = viewport.world_to_screen(bounds.center());
		assert!(close(center, Point::new(400.0, 300.0)));
		assert!((viewport.zoom - 1.8).abs() < EPS);
	}
}
