//! Geometry primitives shared by the model, the viewport and the renderer.

use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A 2D point or vector. Used for both world and screen coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	/// Horizontal component.
	pub x: f64,
	/// Vertical component.
	pub y: f64,
}

impl Point {
	/// The origin.
	pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

	/// Creates a point.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance to `other`.
	pub fn distance(self, other: Point) -> f64 {
		let (dx, dy) = (self.x - other.x, self.y - other.y);
		(dx * dx + dy * dy).sqrt()
	}
}

impl Add for Point {
	type Output = Point;

	fn add(self, rhs: Point) -> Point {
		Point::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl Sub for Point {
	type Output = Point;

	fn sub(self, rhs: Point) -> Point {
		Point::new(self.x - rhs.x, self.y - rhs.y)
	}
}

impl Mul<f64> for Point {
	type Output = Point;

	fn mul(self, rhs: f64) -> Point {
		Point::new(self.x * rhs, self.y * rhs)
	}
}

impl Div<f64> for Point {
	type Output = Point;

	fn div(self, rhs: f64) -> Point {
		Point::new(self.x / rhs, self.y / rhs)
	}
}

/// Width and height of a block or canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
	/// Horizontal extent.
	pub width: f64,
	/// Vertical extent.
	pub height: f64,
}

impl Size {
	/// Creates a size.
	pub const fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
	/// Top-left corner.
	pub origin: Point,
	/// Extent.
	pub size: Size,
}

impl Rect {
	/// Creates a rectangle from its top-left corner and size.
	pub const fn new(origin: Point, size: Size) -> Self {
		Self { origin, size }
	}

	/// Smallest rectangle spanning two corners, in any order.
	pub fn from_corners(a: Point, b: Point) -> Self {
		let origin = Point::new(a.x.min(b.x), a.y.min(b.y));
		Self::new(
			origin,
			Size::new((a.x - b.x).abs(), (a.y - b.y).abs()),
		)
	}

	/// Right edge.
	pub fn right(&self) -> f64 {
		self.origin.x + self.size.width
	}

	/// Bottom edge.
	pub fn bottom(&self) -> f64 {
		self.origin.y + self.size.height
	}

	/// Centre point.
	pub fn center(&self) -> Point {
		Point::new(
			self.origin.x + self.size.width / 2.0,
			self.origin.y + self.size.height / 2.0,
		)
	}

	/// Whether `p` lies inside or on the edge.
	pub fn contains(&self, p: Point) -> bool {
		p.x >= self.origin.x && p.x <= self.right() && p.y >= self.origin.y && p.y <= self.bottom()
	}

	/// Smallest rectangle containing both.
	pub fn union(&self, other: &Rect) -> Rect {
		Rect::from_corners(
			Point::new(
				self.origin.x.min(other.origin.x),
				self.origin.y.min(other.origin.y),
			),
			Point::new(self.right().max(other.right()), self.bottom().max(other.bottom())),
		)
	}
}
