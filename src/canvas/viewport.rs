//! Pan and zoom transform between screen pixels and canvas space.
//!
//! `screen = canvas * zoom + (x, y)`. Every pointer position that ends up in
//! the model (drops, node moves, hit tests) goes through
//! [`Viewport::screen_to_canvas`] first.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// Pan offset in screen pixels plus zoom factor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
	/// Horizontal pan, screen pixels.
	pub x: f64,
	/// Vertical pan, screen pixels.
	pub y: f64,
	/// 1.0 = 100%.
	pub zoom: f64,
}

impl Default for Viewport {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			zoom: 1.0,
		}
	}
}

impl Viewport {
	/// Replaces a zoom that is not a positive finite number with 1.0 and a
	/// non-finite offset with 0, so the transform stays invertible.
	pub fn sanitized(self) -> Self {
		let finite_or = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
		Self {
			x: finite_or(self.x, 0.0),
			y: finite_or(self.y, 0.0),
			zoom: if self.zoom.is_finite() && self.zoom > 0.0 {
				self.zoom
			} else {
				1.0
			},
		}
	}

	/// Canvas-space position of the screen point `p`.
	pub fn screen_to_canvas(&self, p: Point) -> Point {
		Point::new((p.x - self.x) / self.zoom, (p.y - self.y) / self.zoom)
	}

	/// Screen position of the canvas point `p`.
	pub fn canvas_to_screen(&self, p: Point) -> Point {
		Point::new(p.x * self.zoom + self.x, p.y * self.zoom + self.y)
	}

	/// Moves the view by a screen-space delta.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.x += dx;
		self.y += dy;
	}

	/// Multiplies the zoom by `factor` (clamped to `min..=max`) keeping the
	/// canvas point under `anchor` fixed on screen.
	pub fn zoom_at(&mut self, anchor: Point, factor: f64, min: f64, max: f64) {
		let new_zoom = (self.zoom * factor).clamp(min, max);
		let ratio = new_zoom / self.zoom;
		self.x = anchor.x - (anchor.x - self.x) * ratio;
		self.y = anchor.y - (anchor.y - self.y) * ratio;
		self.zoom = new_zoom;
	}

	/// Viewport that shows all of `bounds` centred in a `width` x `height`
	/// screen area with `padding` pixels to spare on each side.
	pub fn fit(bounds: Rect, width: f64, height: f64, padding: f64, min: f64, max: f64) -> Self {
		let avail_w = (width - 2.0 * padding).max(1.0);
		let avail_h = (height - 2.0 * padding).max(1.0);
		let zoom = if bounds.width <= 0.0 || bounds.height <= 0.0 {
			1.0
		} else {
			(avail_w / bounds.width).min(avail_h / bounds.height)
		}
		.clamp(min, max);
		let c = bounds.center();
		Self {
			x: width / 2.0 - c.x * zoom,
			y: height / 2.0 - c.y * zoom,
			zoom,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn close(a: Point, b: Point) -> bool {
		(a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
	}

	#[test]
	fn drop_point_is_untransformed() {
		let vp = Viewport {
			x: -20.0,
			y: -10.0,
			zoom: 1.5,
		};
		let p = vp.screen_to_canvas(Point::new(120.0, 40.0));
		assert!(close(p, Point::new(140.0 / 1.5, 50.0 / 1.5)));
		assert_ne!(p, Point::new(120.0, 40.0));
	}

	#[test]
	fn screen_and_canvas_are_inverse() {
		let vp = Viewport {
			x: 33.0,
			y: -7.5,
			zoom: 0.4,
		};
		let p = Point::new(12.5, 900.0);
		assert!(close(vp.screen_to_canvas(vp.canvas_to_screen(p)), p));
	}

	#[test]
	fn zoom_keeps_anchor_fixed_and_clamps() {
		let mut vp = Viewport::default();
		let anchor = Point::new(200.0, 100.0);
		let before = vp.screen_to_canvas(anchor);
		vp.zoom_at(anchor, 1.1, 0.1, 2.0);
		assert!(close(vp.screen_to_canvas(anchor), before));

		for _ in 0..50 {
			vp.zoom_at(anchor, 1.1, 0.1, 2.0);
		}
		assert_eq!(vp.zoom, 2.0);
		for _ in 0..100 {
			vp.zoom_at(anchor, 0.9, 0.1, 2.0);
		}
		assert_eq!(vp.zoom, 0.1);
	}

	#[test]
	fn sanitized_repairs_degenerate_zoom() {
		let vp = Viewport {
			x: f64::NAN,
			y: 5.0,
			zoom: 0.0,
		}
		.sanitized();
		assert_eq!(vp, Viewport { x: 0.0, y: 5.0, zoom: 1.0 });
		assert_eq!(
			Viewport { x: 1.0, y: 2.0, zoom: -3.0 }.sanitized().zoom,
			1.0
		);
		let p = vp.screen_to_canvas(Point::new(10.0, 10.0));
		assert!(p.x.is_finite() && p.y.is_finite());
		let ok = Viewport { x: 3.0, y: 4.0, zoom: 0.5 };
		assert_eq!(ok.sanitized(), ok);
	}

	#[test]
	fn fit_centres_bounds() {
		let bounds = Rect::new(0.0, 0.0, 470.0, 70.0);
		let vp = Viewport::fit(bounds, 800.0, 600.0, 40.0, 0.1, 2.0);
		let centre = vp.canvas_to_screen(bounds.center());
		assert!(close(centre, Point::new(400.0, 300.0)));
		assert!(vp.zoom <= 2.0);
		assert!(vp.canvas_to_screen(Point::new(0.0, 0.0)).x >= 40.0 - 1e-9);
	}
}
