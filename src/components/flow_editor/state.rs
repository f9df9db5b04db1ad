//! The editor aggregate: one graph, its camera and history, and every user-level edit operation.

use std::collections::VecDeque;
use std::rc::Rc;

use log::{debug, info, warn};

use super::config::EditorConfig;
use super::error::{GraphError, PersistenceError};
use super::graph::{BlockId, ConnectionId, Graph, GraphSnapshot, PortDirection, PortRef};
use super::history::History;
use super::interaction::Interaction;
use super::persistence::{FlowRecord, FlowStore};
use super::registry::{BlockTypeRegistry, ConfigValue};
use super::render::connection_curve;
use super::types::{Point, Size};
use super::viewport::{GridSnap, Viewport};

const MAX_NOTICES: usize = 5;
const CONNECTION_HANDLE_RADIUS: f64 = 8.0;
const FIT_MARGIN: f64 = 60.0;

/// What is currently selected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selection {
	/// Nothing.
	#[default]
	None,
	/// A block.
	Block(BlockId),
	/// A connection, picked via its midpoint handle.
	Connection(ConnectionId),
}

/// Hover tracking, for highlighting and port tooltips only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HoverState {
	/// Block under the pointer.
	pub block: Option<BlockId>,
	/// Port under the pointer.
	pub port: Option<PortRef>,
}

/// Severity of a status message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
	/// Confirmation.
	Info,
	/// Rejected user action.
	Warning,
	/// Failure the user should know about.
	Error,
}

/// A status message for the host's notification area.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
	/// Severity.
	pub level: NoticeLevel,
	/// Text.
	pub message: String,
}

/// Requested action for the external executor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionMode {
	/// Run the flow.
	Execute,
	/// Dry run.
	Test,
}

/// A validated, owned copy of the graph handed to an external executor.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionRequest {
	/// Requested mode.
	pub mode: ExecutionMode,
	/// Graph contents.
	pub graph: GraphSnapshot,
}

/// One editor instance: graph, camera, history, gesture state and persistence.
pub struct FlowEditor {
	config: EditorConfig,
	pub(super) graph: Graph,
	pub(super) viewport: Viewport,
	history: History<GraphSnapshot>,
	store: FlowStore,
	pub(super) interaction: Interaction,
	pub(super) selection: Selection,
	pub(super) hover: HoverState,
	screen: Size,
	flow_name: String,
	notices: VecDeque<Notice>,
	revision: u64,
}

impl FlowEditor {
	/// Creates an editor with an empty graph and a single history entry.
	pub fn new(registry: BlockTypeRegistry, store: FlowStore, config: EditorConfig) -> Self {
		let config = config.sanitized();
		let graph = Graph::new(Rc::new(registry), GridSnap::new(&config));
		let mut history = History::new(config.history_capacity);
		history.reset(graph.snapshot());
		info!(
			"Flow editor created with {} block type(s)",
			graph.registry().len()
		);
		Self {
			viewport: Viewport::new(&config),
			config,
			graph,
			history,
			store,
			interaction: Interaction::Idle,
			selection: Selection::None,
			hover: HoverState::default(),
			screen: Size::new(800.0, 600.0),
			flow_name: "Untitled flow".to_string(),
			notices: VecDeque::new(),
			revision: 0,
		}
	}

	/// Settings this editor was built with.
	pub fn config(&self) -> &EditorConfig {
		&self.config
	}

	/// The live graph.
	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	/// The camera.
	pub fn viewport(&self) -> &Viewport {
		&self.viewport
	}

	/// Undo history.
	pub fn history(&self) -> &History<GraphSnapshot> {
		&self.history
	}

	/// Current gesture.
	pub fn interaction(&self) -> &Interaction {
		&self.interaction
	}

	/// Current selection.
	pub fn selection(&self) -> Selection {
		self.selection
	}

	/// Current hover targets.
	pub fn hover(&self) -> HoverState {
		self.hover
	}

	/// Canvas size in screen pixels.
	pub fn screen_size(&self) -> Size {
		self.screen
	}

	/// Name used by `save_current`.
	pub fn flow_name(&self) -> &str {
		&self.flow_name
	}

	/// Renames the working flow.
	pub fn set_flow_name(&mut self, name: &str) {
		self.flow_name = name.to_string();
		self.touch();
	}

	/// Saved flows, newest first.
	pub fn saved_flows(&self) -> Vec<&FlowRecord> {
		self.store.flows()
	}

	/// Increases on every change a panel might display.
	pub fn revision(&self) -> u64 {
		self.revision
	}

	pub(super) fn touch(&mut self) {
		self.revision = self.revision.wrapping_add(1);
	}

	/// Updates the canvas size.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.screen = Size::new(width, height);
	}

	/// Screen centre of the canvas.
	pub fn screen_center(&self) -> Point {
		Point::new(self.screen.width / 2.0, self.screen.height / 2.0)
	}

	// === Notices ===

	pub(super) fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
		if self.notices.len() == MAX_NOTICES {
			self.notices.pop_front();
		}
		self.notices.push_back(Notice {
			level,
			message: message.into(),
		});
		self.touch();
	}

	/// Takes every pending notice.
	pub fn drain_notices(&mut self) -> Vec<Notice> {
		self.notices.drain(..).collect()
	}

	// === History ===

	/// Records the live graph as a new history entry.
	pub(super) fn commit(&mut self, what: &str) {
		self.history.push(self.graph.snapshot());
		debug!(
			"Committed '{}' ({}/{})",
			what,
			self.history.index() + 1,
			self.history.len()
		);
		self.touch();
	}

	/// Restores the previous snapshot. Returns whether anything changed.
	pub fn undo(&mut self) -> bool {
		self.cancel_gesture();
		match self.history.undo() {
			Some(snapshot) => {
				self.apply_snapshot(&snapshot);
				true
			}
			None => false,
		}
	}

	/// Re-applies the next snapshot. Returns whether anything changed.
	pub fn redo(&mut self) -> bool {
		self.cancel_gesture();
		match self.history.redo() {
			Some(snapshot) => {
				self.apply_snapshot(&snapshot);
				true
			}
			None => false,
		}
	}

	fn apply_snapshot(&mut self, snapshot: &GraphSnapshot) {
		self.graph.restore(snapshot);
		self.prune_selection();
		self.touch();
	}

	fn prune_selection(&mut self) {
		let keep = match self.selection {
			Selection::None => true,
			Selection::Block(id) => self.graph.block(id).is_some(),
			Selection::Connection(id) => self.graph.connection(id).is_some(),
		};
		if !keep {
			self.selection = Selection::None;
		}
		self.hover = HoverState::default();
	}

	// === Graph edits (each success commits exactly one snapshot) ===

	/// Adds a block at a world position.
	pub fn add_block(&mut self, type_key: &str, world: Point) -> Option<BlockId> {
		match self.graph.add_block(type_key, world) {
			Ok(id) => {
				self.selection = Selection::Block(id);
				self.commit("add block");
				Some(id)
			}
			Err(err) => {
				debug!("Add block ignored: {}", err);
				None
			}
		}
	}

	/// Adds a block under the centre of the canvas, offset so it is centred there.
	pub fn add_block_at_center(&mut self, type_key: &str) -> Option<BlockId> {
		let size = self.graph.registry().get(type_key)?.default_size();
		let center = self.viewport.screen_to_world(self.screen_center());
		let origin = center - Point::new(size.width / 2.0, size.height / 2.0);
		self.add_block(type_key, origin)
	}

	/// Moves a block programmatically.
	pub fn move_block(&mut self, id: BlockId, world: Point) -> bool {
		match self.graph.move_block(id, world) {
			Ok(true) => {
				self.commit("move block");
				true
			}
			Ok(false) => false,
			Err(err) => {
				debug!("Move ignored: {}", err);
				false
			}
		}
	}

	/// Deletes a block and its connections.
	pub fn delete_block(&mut self, id: BlockId) -> bool {
		match self.graph.delete_block(id) {
			Ok(_) => {
				self.prune_selection();
				self.commit("delete block");
				true
			}
			Err(err) => {
				debug!("Delete ignored: {}", err);
				false
			}
		}
	}

	/// Joins two ports; `origin` decides which side is the output.
	pub fn connect(&mut self, origin: PortRef, target: PortRef) -> Option<ConnectionId> {
		match self.graph.connect(origin, target) {
			Ok(id) => {
				self.commit("connect");
				Some(id)
			}
			Err(err) => {
				self.report_connect_error(&err);
				None
			}
		}
	}

	fn report_connect_error(&mut self, err: &GraphError) {
		debug!("Connection rejected: {}", err);
		match err {
			GraphError::SameDirection(_) | GraphError::DuplicateConnection { .. } => {
				self.notify(NoticeLevel::Warning, err.to_string())
			}
			_ => {}
		}
	}

	/// Removes a connection.
	pub fn disconnect(&mut self, id: ConnectionId) -> bool {
		if self.graph.disconnect(id).is_none() {
			return false;
		}
		self.prune_selection();
		self.commit("disconnect");
		true
	}

	/// Updates one existing setting of a block. Unknown blocks and keys are ignored.
	pub fn set_block_config(&mut self, id: BlockId, key: &str, value: ConfigValue) -> bool {
		if self.graph.block(id).and_then(|b| b.config.get(key)) == Some(&value) {
			return false;
		}
		match self.graph.set_config(id, key, value) {
			Ok(()) => {
				self.commit("set config");
				true
			}
			Err(err) => {
				debug!("Config change ignored: {}", err);
				false
			}
		}
	}

	/// Deletes whatever is selected.
	pub fn delete_selection(&mut self) -> bool {
		match self.selection {
			Selection::Block(id) => self.delete_block(id),
			Selection::Connection(id) => self.disconnect(id),
			Selection::None => false,
		}
	}

	/// Selects a block (or nothing).
	pub fn select_block(&mut self, id: Option<BlockId>) {
		self.selection = match id {
			Some(id) if self.graph.block(id).is_some() => Selection::Block(id),
			_ => Selection::None,
		};
		self.touch();
	}

	// === Flows ===

	/// Replaces the graph with an empty one and resets history.
	pub fn new_flow(&mut self) {
		self.cancel_gesture();
		self.graph.clear();
		self.history.reset(self.graph.snapshot());
		self.selection = Selection::None;
		self.hover = HoverState::default();
		self.flow_name = "Untitled flow".to_string();
		info!("Started a new flow");
		self.touch();
	}

	/// Saves the live graph under `name`. Storage failures become an error notice.
	pub fn save(&mut self, name: &str, timestamp: f64) -> Option<FlowRecord> {
		let name = match name.trim() {
			"" => self.flow_name.clone(),
			trimmed => trimmed.to_string(),
		};
		match self.store.save(&name, &self.graph.snapshot(), timestamp) {
			Ok(record) => {
				self.flow_name = record.name.clone();
				self.notify(NoticeLevel::Info, format!("Saved '{}'", record.name));
				Some(record)
			}
			Err(err) => {
				self.report_storage_error("Save", &err);
				None
			}
		}
	}

	/// Saves under the current flow name.
	pub fn save_current(&mut self, timestamp: f64) -> Option<FlowRecord> {
		let name = self.flow_name.clone();
		self.save(&name, timestamp)
	}

	/// Replaces the live graph with a saved flow and resets history to it.
	pub fn load(&mut self, flow_id: &str) -> bool {
		let Some(record) = self.store.get(flow_id).cloned() else {
			self.notify(NoticeLevel::Warning, format!("Flow '{flow_id}' not found"));
			return false;
		};
		self.load_record(&record)
	}

	/// Replaces the live graph with `record` unless it fails validation, which becomes an error notice.
	fn load_record(&mut self, record: &FlowRecord) -> bool {
		let snapshot = record.snapshot();
		if let Err(err) = snapshot.validate() {
			self.report_storage_error("Load", &PersistenceError::from(err));
			return false;
		}
		self.cancel_gesture();
		self.graph.restore(&snapshot);
		self.history.reset(self.graph.snapshot());
		self.selection = Selection::None;
		self.hover = HoverState::default();
		self.flow_name = record.name.clone();
		info!(
			"Loaded flow '{}' ({} blocks, {} connections)",
			record.name,
			record.blocks.len(),
			record.connections.len()
		);
		self.touch();
		true
	}

	/// Deletes a saved flow from storage.
	pub fn delete_saved(&mut self, flow_id: &str) -> bool {
		match self.store.delete(flow_id) {
			Ok(record) => {
				self.notify(NoticeLevel::Info, format!("Deleted '{}'", record.name));
				true
			}
			Err(err) => {
				self.report_storage_error("Delete", &err);
				false
			}
		}
	}

	/// Writes the autosave record when the graph is non-empty. Never touches history.
	pub fn autosave(&mut self, timestamp: f64) -> bool {
		let snapshot = self.graph.snapshot();
		match self.store.autosave(&snapshot, timestamp) {
			Ok(written) => written,
			Err(err) => {
				self.report_storage_error("Autosave", &err);
				false
			}
		}
	}

	/// Loads the autosave record, if any. Returns whether one was restored.
	pub fn restore_autosave(&mut self) -> bool {
		match self.store.read_autosave() {
			Ok(Some(record)) => self.load_record(&record),
			Ok(None) => false,
			Err(err) => {
				warn!("Autosave record unreadable: {}", err);
				false
			}
		}
	}

	/// Pretty JSON of a saved flow.
	pub fn export_flow(&mut self, flow_id: &str) -> Option<String> {
		match self.store.export_json(flow_id) {
			Ok(json) => Some(json),
			Err(err) => {
				self.report_storage_error("Export", &err);
				None
			}
		}
	}

	/// Adds a flow from exported JSON to the saved list.
	pub fn import_flow(&mut self, json: &str, timestamp: f64) -> Option<FlowRecord> {
		match self.store.import_json(json, timestamp) {
			Ok(record) => {
				self.notify(NoticeLevel::Info, format!("Imported '{}'", record.name));
				Some(record)
			}
			Err(err) => {
				self.report_storage_error("Import", &err);
				None
			}
		}
	}

	fn report_storage_error(&mut self, action: &str, err: &PersistenceError) {
		warn!("{} failed: {}", action, err);
		self.notify(NoticeLevel::Error, format!("{action} failed: {err}"));
	}

	/// Validated copy of the graph for the external executor.
	pub fn execution_request(&mut self, mode: ExecutionMode) -> Option<ExecutionRequest> {
		match self.graph.validate() {
			Ok(()) => Some(ExecutionRequest {
				mode,
				graph: self.graph.snapshot(),
			}),
			Err(err) => {
				self.notify(NoticeLevel::Error, format!("Flow is invalid: {err}"));
				None
			}
		}
	}

	// === Camera ===

	/// Zooms one step in or out about the canvas centre.
	pub fn zoom_step(&mut self, steps: i32) {
		let center = self.screen_center();
		self.viewport.zoom_step_about(center, steps);
		self.touch();
	}

	/// Identity camera.
	pub fn reset_view(&mut self) {
		self.viewport.reset();
		self.touch();
	}

	/// Frames every block; resets the camera on an empty graph.
	pub fn fit_to_content(&mut self) {
		match self.graph.bounds() {
			Some(bounds) => self.viewport.fit(&bounds, self.screen, FIT_MARGIN),
			None => self.viewport.reset(),
		}
		self.touch();
	}

	/// Centres the camera on a world point.
	pub fn center_on(&mut self, world: Point) {
		self.viewport.center_on(world, self.screen);
		self.touch();
	}

	// === Hit testing (screen space in, world space internally) ===

	/// Port within the hit radius of `screen`. Topmost block first; outputs before inputs.
	pub fn port_at(&self, screen: Point) -> Option<PortRef> {
		self.find_port(screen, &[PortDirection::Output, PortDirection::Input])
	}

	/// Like `port_at`, but only ports facing `direction`. Ports of other directions never shadow a match
	/// on a block underneath.
	pub fn port_at_facing(&self, screen: Point, direction: PortDirection) -> Option<PortRef> {
		self.find_port(screen, &[direction])
	}

	fn find_port(&self, screen: Point, directions: &[PortDirection]) -> Option<PortRef> {
		let radius = self.config.port_hit_radius;
		for block in self.graph.blocks().iter().rev() {
			for &direction in directions {
				let hit = (0..block.ports(direction).len()).find(|&index| {
					block
						.port_position(direction, index)
						.is_some_and(|p| self.viewport.world_to_screen(p).distance(screen) <= radius)
				});
				if let Some(index) = hit {
					return Some(PortRef {
						block: block.id,
						direction,
						index,
					});
				}
			}
		}
		None
	}

	/// Topmost block under `screen`.
	pub fn block_at(&self, screen: Point) -> Option<BlockId> {
		self.graph.block_at(self.viewport.screen_to_world(screen))
	}

	/// Connection whose midpoint handle is under `screen`.
	pub fn connection_at(&self, screen: Point) -> Option<ConnectionId> {
		self.graph
			.connections()
			.iter()
			.rev()
			.find(|c| {
				self.graph.connection_endpoints(c).is_some_and(|(from, to)| {
					let curve = connection_curve(
						self.viewport.world_to_screen(from),
						self.viewport.world_to_screen(to),
					);
					curve.point_at(0.5).distance(screen) <= CONNECTION_HANDLE_RADIUS
				})
			})
			.map(|c| c.id)
	}

	/// Updates hover targets. Hover never affects history or panels.
	pub fn set_hover(&mut self, hover: HoverState) {
		self.hover = hover;
	}
}
