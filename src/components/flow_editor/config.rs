//! Editor tunables and storage keys.

use serde::{Deserialize, Serialize};

use super::types::Size;

/// localStorage key holding the list of saved flows.
pub const FLOWS_STORAGE_KEY: &str = "flowEditor.flows";
/// localStorage key holding the single autosave record.
pub const AUTOSAVE_STORAGE_KEY: &str = "flowEditor.autosave";
/// Reserved record id for autosaves.
pub const AUTOSAVE_FLOW_ID: &str = "autosave";

/// Tunables for one editor instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
	/// World units between grid lines and snap targets.
	pub grid_size: f64,
	/// Snap block positions to the grid.
	pub snap_to_grid: bool,
	/// Draw the background grid.
	pub show_grid: bool,
	/// Lower zoom bound.
	pub min_zoom: f64,
	/// Upper zoom bound.
	pub max_zoom: f64,
	/// Multiplicative factor per zoom step.
	pub zoom_step: f64,
	/// Port hit radius in screen pixels, independent of zoom.
	pub port_hit_radius: f64,
	/// Maximum retained history snapshots.
	pub history_capacity: usize,
	/// Autosave period.
	pub autosave_interval_ms: u32,
	/// Draw the minimap overlay.
	pub show_minimap: bool,
	/// Minimap canvas size in screen pixels.
	pub minimap_size: Size,
}

impl Default for EditorConfig {
	fn default() -> Self {
		Self {
			grid_size: 20.0,
			snap_to_grid: true,
			show_grid: true,
			min_zoom: 0.1,
			max_zoom: 3.0,
			zoom_step: 1.2,
			port_hit_radius: 10.0,
			history_capacity: 50,
			autosave_interval_ms: 30_000,
			show_minimap: true,
			minimap_size: Size::new(200.0, 140.0),
		}
	}
}

impl EditorConfig {
	/// Copy with every numeric field usable. Non-finite or non-positive values fall back to the defaults
	/// and the zoom bounds are put in order.
	pub fn sanitized(&self) -> Self {
		let defaults = Self::default();
		let positive = |value: f64, fallback: f64| {
			if value.is_finite() && value > 0.0 { value } else { fallback }
		};
		let min_zoom = positive(self.min_zoom, defaults.min_zoom);
		let max_zoom = positive(self.max_zoom, defaults.max_zoom).max(min_zoom);
		let zoom_step = if self.zoom_step.is_finite() && self.zoom_step > 1.0 {
			self.zoom_step
		} else {
			defaults.zoom_step
		};
		Self {
			grid_size: positive(self.grid_size, defaults.grid_size),
			min_zoom,
			max_zoom,
			zoom_step,
			port_hit_radius: positive(self.port_hit_radius, defaults.port_hit_radius),
			autosave_interval_ms: match self.autosave_interval_ms {
				0 => defaults.autosave_interval_ms,
				ms => ms,
			},
			minimap_size: Size::new(
				positive(self.minimap_size.width, defaults.minimap_size.width),
				positive(self.minimap_size.height, defaults.minimap_size.height),
			),
			..self.clone()
		}
	}
}
