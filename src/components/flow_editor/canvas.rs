//! `Painter` over a browser 2d canvas context.

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::render::{CubicBezier, Painter, Stroke};
use super::types::{Point, Rect, Size};

fn apply_stroke(ctx: &CanvasRenderingContext2d, stroke: Stroke<'_>) {
	ctx.set_stroke_style_str(stroke.color);
	ctx.set_line_width(stroke.width);
	let dash = match stroke.dash {
		Some((dash, gap)) => js_sys::Array::of2(&JsValue::from_f64(dash), &JsValue::from_f64(gap)),
		None => js_sys::Array::new(),
	};
	let _ = ctx.set_line_dash(&dash);
}

impl Painter for CanvasRenderingContext2d {
	fn clear(&mut self, size: Size, color: &str) {
		self.set_fill_style_str(color);
		CanvasRenderingContext2d::fill_rect(self, 0.0, 0.0, size.width, size.height);
	}

	fn fill_rect(&mut self, rect: Rect, color: &str) {
		self.set_fill_style_str(color);
		CanvasRenderingContext2d::fill_rect(
			self,
			rect.origin.x,
			rect.origin.y,
			rect.size.width,
			rect.size.height,
		);
	}

	fn stroke_rect(&mut self, rect: Rect, stroke: Stroke<'_>) {
		apply_stroke(self, stroke);
		CanvasRenderingContext2d::stroke_rect(
			self,
			rect.origin.x,
			rect.origin.y,
			rect.size.width,
			rect.size.height,
		);
	}

	fn line(&mut self, from: Point, to: Point, stroke: Stroke<'_>) {
		apply_stroke(self, stroke);
		self.begin_path();
		self.move_to(from.x, from.y);
		self.line_to(to.x, to.y);
		self.stroke();
	}

	fn bezier(&mut self, curve: &CubicBezier, stroke: Stroke<'_>) {
		apply_stroke(self, stroke);
		self.begin_path();
		self.move_to(curve.start.x, curve.start.y);
		self.bezier_curve_to(
			curve.c1.x,
			curve.c1.y,
			curve.c2.x,
			curve.c2.y,
			curve.end.x,
			curve.end.y,
		);
		self.stroke();
		let _ = self.set_line_dash(&js_sys::Array::new());
	}

	fn fill_circle(&mut self, center: Point, radius: f64, color: &str) {
		self.begin_path();
		let _ = self.arc(center.x, center.y, radius, 0.0, 2.0 * PI);
		self.set_fill_style_str(color);
		self.fill();
	}

	fn fill_polygon(&mut self, points: &[Point], color: &str) {
		let Some((first, rest)) = points.split_first() else {
			return;
		};
		self.set_fill_style_str(color);
		self.begin_path();
		self.move_to(first.x, first.y);
		for p in rest {
			self.line_to(p.x, p.y);
		}
		self.close_path();
		self.fill();
	}

	fn text(&mut self, at: Point, text: &str, size: f64, color: &str) {
		self.set_fill_style_str(color);
		self.set_font(&format!("{}px sans-serif", size.max(1.0)));
		let _ = self.fill_text(text, at.x, at.y);
	}
}
