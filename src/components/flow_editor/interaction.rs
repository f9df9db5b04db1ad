//! Pointer and keyboard state machine.
//!
//! `Idle` is the resting state. A pointer press starts at most one gesture; moves update it without
//! touching history; the release commits at most one snapshot. `Escape` abandons any gesture.

use log::debug;

use super::graph::{BlockId, PortRef};
use super::state::{FlowEditor, HoverState, Selection};
use super::types::Point;

/// Which mouse button was pressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
	/// Left button.
	Primary,
	/// Wheel button.
	Middle,
	/// Right button.
	Secondary,
}

impl PointerButton {
	/// Maps a DOM `MouseEvent.button` value.
	pub fn from_dom(button: i16) -> Self {
		match button {
			1 => PointerButton::Middle,
			2 => PointerButton::Secondary,
			_ => PointerButton::Primary,
		}
	}
}

/// Modifier keys held during an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
	/// Control.
	pub ctrl: bool,
	/// Shift.
	pub shift: bool,
	/// Alt / Option.
	pub alt: bool,
	/// Command / Windows key.
	pub meta: bool,
}

impl Modifiers {
	/// Ctrl on most platforms, Cmd on macOS.
	pub fn command(&self) -> bool {
		self.ctrl || self.meta
	}

	/// Held while dragging empty canvas to pan.
	pub fn pan(&self) -> bool {
		self.alt || self.shift
	}
}

/// A pointer event in canvas-relative screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerInput {
	/// Position relative to the canvas top-left corner.
	pub screen: Point,
	/// Button involved.
	pub button: PointerButton,
	/// Modifiers held.
	pub modifiers: Modifiers,
}

impl PointerInput {
	/// Primary-button event without modifiers.
	pub fn primary(x: f64, y: f64) -> Self {
		Self {
			screen: Point::new(x, y),
			button: PointerButton::Primary,
			modifiers: Modifiers::default(),
		}
	}
}

/// What the host should do after a key press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
	/// Not an editor shortcut; let the browser handle it.
	Ignored,
	/// Handled internally.
	Handled,
	/// `Ctrl+S`: the host should call `save_current` with the current time.
	SaveRequested,
	/// `Ctrl+K`: the host should open the quick-add search.
	OpenQuickAdd,
}

/// Active gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Interaction {
	/// No gesture in progress.
	#[default]
	Idle,
	/// A block follows the pointer.
	DraggingBlock {
		/// Block being dragged.
		block: BlockId,
		/// Pointer position minus block origin at grab time, in world units.
		grab_offset: Point,
		/// Block position when the drag started.
		origin: Point,
	},
	/// The camera follows the pointer.
	PanningCanvas {
		/// Pointer position at press time.
		anchor: Point,
		/// Pan at press time.
		anchor_pan: Point,
	},
	/// A connection is being drawn from a port.
	ConnectingPort {
		/// Port the drag started from; its direction decides the connection roles.
		origin: PortRef,
		/// Dangling end of the preview curve, in world coordinates.
		cursor: Point,
	},
}

impl FlowEditor {
	/// Starts a gesture. Presses during an active gesture are ignored.
	pub fn pointer_down(&mut self, input: PointerInput) {
		if self.interaction != Interaction::Idle {
			return;
		}
		let world = self.viewport.screen_to_world(input.screen);

		match input.button {
			PointerButton::Middle => self.start_pan(input.screen),
			PointerButton::Secondary => {}
			PointerButton::Primary => {
				if let Some(port) = self.port_at(input.screen) {
					self.interaction = Interaction::ConnectingPort {
						origin: port,
						cursor: world,
					};
				} else if let Some(id) = self.block_at(input.screen) {
					let Some(block) = self.graph.block(id) else {
						return;
					};
					self.interaction = Interaction::DraggingBlock {
						block: id,
						grab_offset: world - block.position,
						origin: block.position,
					};
					self.selection = Selection::Block(id);
					self.touch();
				} else if input.modifiers.pan() {
					self.start_pan(input.screen);
				} else if let Some(id) = self.connection_at(input.screen) {
					self.selection = Selection::Connection(id);
					self.touch();
				} else if self.selection != Selection::None {
					self.selection = Selection::None;
					self.touch();
				}
			}
		}
	}

	fn start_pan(&mut self, screen: Point) {
		self.interaction = Interaction::PanningCanvas {
			anchor: screen,
			anchor_pan: self.viewport.pan,
		};
	}

	/// Updates the active gesture, or hover tracking when idle.
	pub fn pointer_move(&mut self, input: PointerInput) {
		let world = self.viewport.screen_to_world(input.screen);

		match self.interaction {
			Interaction::Idle => {
				let hover = HoverState {
					port: self.port_at(input.screen),
					block: self.block_at(input.screen),
				};
				self.set_hover(hover);
			}
			Interaction::DraggingBlock {
				block, grab_offset, ..
			} => {
				// Live move; committed once on release.
				if self.graph.move_block(block, world - grab_offset).is_err() {
					self.interaction = Interaction::Idle;
				}
			}
			Interaction::PanningCanvas { anchor, anchor_pan } => {
				self.viewport.pan = anchor_pan + (input.screen - anchor);
			}
			Interaction::ConnectingPort { origin, .. } => {
				self.interaction = Interaction::ConnectingPort {
					origin,
					cursor: world,
				};
				let target = self.port_at_facing(input.screen, origin.direction.opposite());
				self.set_hover(HoverState {
					port: target,
					block: None,
				});
			}
		}
	}

	/// Ends the active gesture, committing at most one snapshot.
	pub fn pointer_up(&mut self, input: PointerInput) {
		let interaction = std::mem::take(&mut self.interaction);
		match interaction {
			Interaction::Idle | Interaction::PanningCanvas { .. } => {}
			Interaction::DraggingBlock { block, origin, .. } => {
				let moved = self
					.graph
					.block(block)
					.is_some_and(|b| b.position != origin);
				if moved {
					self.commit("move block");
				}
			}
			Interaction::ConnectingPort { origin, .. } => {
				self.set_hover(HoverState::default());
				match self.port_at_facing(input.screen, origin.direction.opposite()) {
					Some(target) => {
						self.connect(origin, target);
					}
					None => debug!("Connection from {:?} dropped without a compatible port", origin),
				}
			}
		}
	}

	/// Pointer left the canvas: releases without a target.
	pub fn pointer_leave(&mut self) {
		if let Interaction::ConnectingPort { .. } = self.interaction {
			self.interaction = Interaction::Idle;
		} else {
			self.pointer_up(PointerInput::primary(f64::NAN, f64::NAN));
		}
		self.set_hover(HoverState::default());
	}

	/// Abandons the active gesture without committing. A dragged block returns to where it started.
	pub fn cancel_gesture(&mut self) {
		if let Interaction::DraggingBlock { block, origin, .. } = self.interaction {
			let _ = self.graph.move_block(block, origin);
		}
		self.interaction = Interaction::Idle;
	}

	/// Wheel input. Zooms about the canvas centre with Ctrl/Cmd held, otherwise scrolls the canvas.
	pub fn wheel(&mut self, delta: Point, modifiers: Modifiers) {
		if modifiers.command() {
			if delta.y != 0.0 {
				self.zoom_step(if delta.y < 0.0 { 1 } else { -1 });
			}
		} else {
			self.viewport.pan_by(delta * -1.0);
		}
	}

	/// Keyboard shortcuts. `key` is the DOM `KeyboardEvent.key` value.
	pub fn key_down(&mut self, key: &str, modifiers: Modifiers) -> KeyOutcome {
		if modifiers.command() {
			return match key.to_ascii_lowercase().as_str() {
				"z" if modifiers.shift => {
					self.redo();
					KeyOutcome::Handled
				}
				"z" => {
					self.undo();
					KeyOutcome::Handled
				}
				"y" => {
					self.redo();
					KeyOutcome::Handled
				}
				"s" => KeyOutcome::SaveRequested,
				"k" => KeyOutcome::OpenQuickAdd,
				_ => KeyOutcome::Ignored,
			};
		}
		match key {
			"Escape" => {
				self.cancel_gesture();
				self.selection = Selection::None;
				self.set_hover(HoverState::default());
				self.touch();
				KeyOutcome::Handled
			}
			"Delete" | "Backspace" => {
				if self.interaction == Interaction::Idle && self.delete_selection() {
					KeyOutcome::Handled
				} else {
					KeyOutcome::Ignored
				}
			}
			_ => KeyOutcome::Ignored,
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::components::flow_editor::config::EditorConfig;
	use crate::components::flow_editor::graph::PortDirection;
	use crate::components::flow_editor::persistence::{FlowStore, MemorySink};
	use crate::components::flow_editor::registry::BlockTypeRegistry;

	fn editor() -> FlowEditor {
		FlowEditor::new(
			BlockTypeRegistry::builtin(),
			FlowStore::new(Box::new(MemorySink::new())),
			EditorConfig::default(),
		)
	}

	fn port_screen(editor: &FlowEditor, port: PortRef) -> Point {
		let world = editor.graph().port_position(port).unwrap();
		editor.viewport().world_to_screen(world)
	}

	fn at(p: Point) -> PointerInput {
		PointerInput::primary(p.x, p.y)
	}

	#[test]
	fn drag_commits_once_on_release() {
		let mut editor = editor();
		let id = editor.add_block("transform", Point::new(100.0, 100.0)).unwrap();
		let history = editor.history().len();

		editor.pointer_down(PointerInput::primary(150.0, 110.0));
		assert!(matches!(editor.interaction(), Interaction::DraggingBlock { .. }));
		for step in 1..=5 {
			editor.pointer_move(PointerInput::primary(150.0 + step as f64 * 20.0, 110.0));
		}
		assert_eq!(editor.history().len(), history);
		editor.pointer_up(PointerInput::primary(250.0, 110.0));

		assert_eq!(editor.interaction(), &Interaction::Idle);
		assert_eq!(editor.history().len(), history + 1);
		assert_eq!(editor.graph().block(id).unwrap().position, Point::new(200.0, 100.0));
		assert_eq!(editor.selection(), Selection::Block(id));
	}

	#[test]
	fn click_without_moving_does_not_commit() {
		let mut editor = editor();
		editor.add_block("transform", Point::new(100.0, 100.0)).unwrap();
		let history = editor.history().len();
		editor.pointer_down(PointerInput::primary(150.0, 110.0));
		editor.pointer_move(PointerInput::primary(153.0, 112.0));
		editor.pointer_up(PointerInput::primary(153.0, 112.0));
		assert_eq!(editor.history().len(), history);
	}

	#[test]
	fn drag_keeps_grab_offset() {
		let mut editor = editor();
		let id = editor.add_block("transform", Point::new(100.0, 100.0)).unwrap();
		editor.pointer_down(PointerInput::primary(160.0, 120.0));
		editor.pointer_move(PointerInput::primary(160.0, 120.0));
		assert_eq!(editor.graph().block(id).unwrap().position, Point::new(100.0, 100.0));
	}

	#[test]
	fn pan_needs_modifier_and_skips_history() {
		let mut editor = editor();
		let history = editor.history().len();

		editor.pointer_down(PointerInput::primary(10.0, 10.0));
		editor.pointer_move(PointerInput::primary(50.0, 30.0));
		editor.pointer_up(PointerInput::primary(50.0, 30.0));
		assert_eq!(editor.viewport().pan, Point::ZERO);

		let mut input = PointerInput::primary(10.0, 10.0);
		input.modifiers.alt = true;
		editor.pointer_down(input);
		input.screen = Point::new(53.0, 27.0);
		editor.pointer_move(input);
		editor.pointer_up(input);
		assert_eq!(editor.viewport().pan, Point::new(43.0, 17.0));
		assert_eq!(editor.history().len(), history);
	}

	#[test]
	fn middle_button_pans() {
		let mut editor = editor();
		let mut input = PointerInput::primary(0.0, 0.0);
		input.button = PointerButton::Middle;
		editor.pointer_down(input);
		assert!(matches!(editor.interaction(), Interaction::PanningCanvas { .. }));
	}

	#[test]
	fn connecting_from_output_to_input() {
		let mut editor = editor();
		let a = editor.add_block("textInput", Point::new(100.0, 100.0)).unwrap();
		let b = editor.add_block("textOutput", Point::new(400.0, 100.0)).unwrap();
		let history = editor.history().len();

		editor.pointer_down(at(port_screen(&editor, PortRef::output(a, 0))));
		assert!(matches!(
			editor.interaction(),
			Interaction::ConnectingPort { origin, .. } if origin.direction == PortDirection::Output
		));
		editor.pointer_move(PointerInput::primary(300.0, 200.0));
		assert_eq!(editor.graph().connections().len(), 0);
		editor.pointer_up(at(port_screen(&editor, PortRef::input(b, 0))));

		assert_eq!(editor.graph().connections().len(), 1);
		assert_eq!(editor.history().len(), history + 1);
		let connection = &editor.graph().connections()[0];
		assert_eq!(connection.from.block_id, a);
		assert_eq!(connection.to.block_id, b);
	}

	#[test]
	fn connecting_backwards_from_input() {
		let mut editor = editor();
		let a = editor.add_block("textInput", Point::new(100.0, 100.0)).unwrap();
		let b = editor.add_block("textOutput", Point::new(400.0, 100.0)).unwrap();
		editor.pointer_down(at(port_screen(&editor, PortRef::input(b, 0))));
		editor.pointer_up(at(port_screen(&editor, PortRef::output(a, 0))));
		let connection = &editor.graph().connections()[0];
		assert_eq!(connection.from.block_id, a);
		assert_eq!(connection.to.block_id, b);
	}

	#[test]
	fn release_on_nothing_or_same_direction_is_discarded() {
		let mut editor = editor();
		let a = editor.add_block("transform", Point::new(100.0, 100.0)).unwrap();
		let b = editor.add_block("transform", Point::new(400.0, 100.0)).unwrap();
		let history = editor.history().len();

		editor.drain_notices();

		editor.pointer_down(at(port_screen(&editor, PortRef::output(a, 0))));
		editor.pointer_up(PointerInput::primary(900.0, 900.0));
		editor.pointer_down(at(port_screen(&editor, PortRef::output(a, 0))));
		editor.pointer_up(at(port_screen(&editor, PortRef::output(b, 0))));

		assert!(editor.graph().connections().is_empty());
		assert_eq!(editor.history().len(), history);
		assert_eq!(editor.interaction(), &Interaction::Idle);
		assert_eq!(editor.drain_notices(), vec![]);
	}

	#[test]
	fn clicking_a_port_is_silent() {
		let mut editor = editor();
		let a = editor.add_block("textInput", Point::new(100.0, 100.0)).unwrap();
		editor.drain_notices();
		let port = at(port_screen(&editor, PortRef::output(a, 0)));
		editor.pointer_down(port);
		editor.pointer_up(port);
		assert!(editor.graph().connections().is_empty());
		assert_eq!(editor.drain_notices(), vec![]);
	}

	#[test]
	fn release_finds_input_under_overlapping_output() {
		let mut editor = editor();
		// Side by side: A's output sits exactly on B's input, and A is on top.
		let b = editor.add_block("transform", Point::new(180.0, 0.0)).unwrap();
		let a = editor.add_block("textInput", Point::new(0.0, 0.0)).unwrap();
		let c = editor.add_block("textInput", Point::new(0.0, 300.0)).unwrap();
		let shared = port_screen(&editor, PortRef::input(b, 0));
		assert_eq!(shared, port_screen(&editor, PortRef::output(a, 0)));

		editor.pointer_down(at(port_screen(&editor, PortRef::output(c, 0))));
		editor.pointer_move(at(shared));
		assert_eq!(editor.hover().port, Some(PortRef::input(b, 0)));
		editor.pointer_up(at(shared));

		assert_eq!(editor.graph().connections().len(), 1);
		let connection = &editor.graph().connections()[0];
		assert_eq!(connection.from.block_id, c);
		assert_eq!(connection.to.block_id, b);
	}

	#[test]
	fn escape_cancels_everything() {
		let mut editor = editor();
		let id = editor.add_block("transform", Point::new(100.0, 100.0)).unwrap();
		let history = editor.history().len();
		editor.pointer_down(PointerInput::primary(150.0, 110.0));
		editor.pointer_move(PointerInput::primary(400.0, 300.0));
		assert_eq!(editor.key_down("Escape", Modifiers::default()), KeyOutcome::Handled);

		assert_eq!(editor.interaction(), &Interaction::Idle);
		assert_eq!(editor.selection(), Selection::None);
		assert_eq!(editor.graph().block(id).unwrap().position, Point::new(100.0, 100.0));
		assert_eq!(editor.history().len(), history);

		editor.pointer_down(at(port_screen(&editor, PortRef::output(id, 0))));
		editor.key_down("Escape", Modifiers::default());
		assert_eq!(editor.interaction(), &Interaction::Idle);
	}

	#[test]
	fn delete_key_removes_selected_block() {
		let mut editor = editor();
		let id = editor.add_block("transform", Point::new(100.0, 100.0)).unwrap();
		let history = editor.history().len();
		editor.pointer_down(PointerInput::primary(150.0, 110.0));
		editor.pointer_up(PointerInput::primary(150.0, 110.0));
		assert_eq!(editor.key_down("Delete", Modifiers::default()), KeyOutcome::Handled);
		assert!(editor.graph().block(id).is_none());
		assert_eq!(editor.history().len(), history + 1);
		assert_eq!(editor.key_down("Delete", Modifiers::default()), KeyOutcome::Ignored);
	}

	#[test]
	fn shortcuts_map_to_outcomes() {
		let mut editor = editor();
		let ctrl = Modifiers {
			ctrl: true,
			..Modifiers::default()
		};
		editor.add_block("transform", Point::ZERO).unwrap();
		assert_eq!(editor.key_down("z", ctrl), KeyOutcome::Handled);
		assert!(editor.graph().is_empty());
		assert_eq!(editor.key_down("y", ctrl), KeyOutcome::Handled);
		assert!(!editor.graph().is_empty());
		assert_eq!(editor.key_down("s", ctrl), KeyOutcome::SaveRequested);
		assert_eq!(editor.key_down("K", ctrl), KeyOutcome::OpenQuickAdd);
		assert_eq!(editor.key_down("a", Modifiers::default()), KeyOutcome::Ignored);
	}

	#[test]
	fn ctrl_wheel_zooms_about_center() {
		let mut editor = editor();
		editor.resize(800.0, 600.0);
		let center = editor.screen_center();
		let world = editor.viewport().screen_to_world(center);
		let ctrl = Modifiers {
			ctrl: true,
			..Modifiers::default()
		};
		editor.wheel(Point::new(0.0, -100.0), ctrl);
		assert!((editor.viewport().zoom - 1.2).abs() < 1e-9);
		let after = editor.viewport().screen_to_world(center);
		assert!(after.distance(world) < 1e-9);

		editor.wheel(Point::new(0.0, 40.0), Modifiers::default());
		assert!((editor.viewport().zoom - 1.2).abs() < 1e-9);
	}

	#[test]
	fn hover_tracks_ports_and_blocks() {
		let mut editor = editor();
		let id = editor.add_block("transform", Point::new(100.0, 100.0)).unwrap();
		editor.pointer_move(at(port_screen(&editor, PortRef::input(id, 0))));
		assert_eq!(editor.hover().port, Some(PortRef::input(id, 0)));
		editor.pointer_move(PointerInput::primary(150.0, 110.0));
		assert_eq!(editor.hover().block, Some(id));
		assert_eq!(editor.hover().port, None);
	}

	#[test]
	fn clicking_connection_handle_selects_it() {
		let mut editor = editor();
		let a = editor.add_block("textInput", Point::new(0.0, 0.0)).unwrap();
		let b = editor.add_block("textOutput", Point::new(400.0, 200.0)).unwrap();
		let id = editor.connect(PortRef::output(a, 0), PortRef::input(b, 0)).unwrap();
		let from = port_screen(&editor, PortRef::output(a, 0));
		let to = port_screen(&editor, PortRef::input(b, 0));
		let mid = Point::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0);

		editor.pointer_down(at(mid));
		editor.pointer_up(at(mid));
		assert_eq!(editor.selection(), Selection::Connection(id));
		assert_eq!(editor.key_down("Delete", Modifiers::default()), KeyOutcome::Handled);
		assert!(editor.graph().connections().is_empty());
	}
}
