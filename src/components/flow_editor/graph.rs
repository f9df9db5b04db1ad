//! Block and connection store.
//!
//! The graph is snapshot-agnostic: callers decide when a successful mutation is committed to history.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use log::debug;
use serde::{Deserialize, Serialize};

use super::error::GraphError;
use super::registry::{BlockTypeRegistry, ConfigMap, ConfigValue, HEADER_HEIGHT, PORT_SPACING, PortSpec};
use super::types::{Point, Rect, Size};
use super::viewport::GridSnap;

/// Identifies a block for the lifetime of an editor session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "block-{}", self.0)
	}
}

/// Identifies a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "conn-{}", self.0)
	}
}

/// Which side of a block a port sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PortDirection {
	/// Left edge, receives data.
	Input,
	/// Right edge, produces data.
	Output,
}

impl PortDirection {
	/// The direction a compatible partner port must have.
	pub fn opposite(self) -> Self {
		match self {
			PortDirection::Input => PortDirection::Output,
			PortDirection::Output => PortDirection::Input,
		}
	}
}

impl fmt::Display for PortDirection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			PortDirection::Input => "input",
			PortDirection::Output => "output",
		})
	}
}

/// A port on a specific block, with its direction made explicit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PortRef {
	/// Owning block.
	pub block: BlockId,
	/// Side of the block.
	pub direction: PortDirection,
	/// Position in that side's port list, 0 nearest the top edge.
	pub index: usize,
}

impl PortRef {
	/// Output port reference.
	pub fn output(block: BlockId, index: usize) -> Self {
		Self {
			block,
			direction: PortDirection::Output,
			index,
		}
	}

	/// Input port reference.
	pub fn input(block: BlockId, index: usize) -> Self {
		Self {
			block,
			direction: PortDirection::Input,
			index,
		}
	}

	fn end(self) -> ConnectionEnd {
		ConnectionEnd {
			block_id: self.block,
			port_index: self.index,
		}
	}
}

/// One endpoint of a persisted connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionEnd {
	/// Block the port belongs to.
	pub block_id: BlockId,
	/// Index into that block's outputs (for `from`) or inputs (for `to`).
	pub port_index: usize,
}

impl fmt::Display for ConnectionEnd {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.block_id, self.port_index)
	}
}

/// A placed node instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
	/// Immutable id.
	pub id: BlockId,
	/// Registry key this block was created from.
	pub type_key: String,
	/// Top-left corner in world coordinates.
	pub position: Point,
	/// Fixed at creation.
	pub size: Size,
	/// Per-instance settings seeded from the registry defaults.
	pub config: ConfigMap,
	/// Input ports copied from the registry.
	pub inputs: Vec<PortSpec>,
	/// Output ports copied from the registry.
	pub outputs: Vec<PortSpec>,
}

impl Block {
	/// World-space bounds.
	pub fn rect(&self) -> Rect {
		Rect::new(self.position, self.size)
	}

	/// Port list on one side.
	pub fn ports(&self, direction: PortDirection) -> &[PortSpec] {
		match direction {
			PortDirection::Input => &self.inputs,
			PortDirection::Output => &self.outputs,
		}
	}

	/// World-space centre of a port, `None` when the index is out of range.
	pub fn port_position(&self, direction: PortDirection, index: usize) -> Option<Point> {
		if index >= self.ports(direction).len() {
			return None;
		}
		let x = match direction {
			PortDirection::Input => self.position.x,
			PortDirection::Output => self.position.x + self.size.width,
		};
		let y = self.position.y + HEADER_HEIGHT + PORT_SPACING * (index as f64 + 0.5);
		Some(Point::new(x, y))
	}
}

/// A directed edge from an output port to an input port.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Connection {
	/// Unique id.
	pub id: ConnectionId,
	/// Output side.
	pub from: ConnectionEnd,
	/// Input side.
	pub to: ConnectionEnd,
}

impl Connection {
	/// Whether either endpoint belongs to `block`.
	pub fn touches(&self, block: BlockId) -> bool {
		self.from.block_id == block || self.to.block_id == block
	}
}

/// Deep copy of the structural part of a graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
	/// Blocks in z-order (last is topmost).
	pub blocks: Vec<Block>,
	/// Connections in creation order.
	pub connections: Vec<Connection>,
}

impl GraphSnapshot {
	/// Checks ids are unique and every connection endpoint resolves to an existing port.
	pub fn validate(&self) -> Result<(), GraphError> {
		check_structure(&self.blocks, &self.connections)
	}
}

fn check_structure(blocks: &[Block], connections: &[Connection]) -> Result<(), GraphError> {
	let mut block_ids = HashSet::new();
	if let Some(block) = blocks.iter().find(|b| !block_ids.insert(b.id)) {
		return Err(GraphError::DuplicateBlockId(block.id));
	}
	let mut connection_ids = HashSet::new();
	if let Some(connection) = connections.iter().find(|c| !connection_ids.insert(c.id)) {
		return Err(GraphError::DuplicateConnectionId(connection.id));
	}
	let port_exists = |port: PortRef| -> Result<(), GraphError> {
		let block = blocks
			.iter()
			.find(|b| b.id == port.block)
			.ok_or(GraphError::BlockNotFound(port.block))?;
		if port.index < block.ports(port.direction).len() {
			Ok(())
		} else {
			Err(GraphError::PortNotFound {
				block: port.block,
				direction: port.direction,
				index: port.index,
			})
		}
	};
	for connection in connections {
		port_exists(PortRef::output(connection.from.block_id, connection.from.port_index))?;
		port_exists(PortRef::input(connection.to.block_id, connection.to.port_index))?;
	}
	Ok(())
}

/// The live block/connection store.
#[derive(Clone, Debug)]
pub struct Graph {
	registry: Rc<BlockTypeRegistry>,
	snap: GridSnap,
	blocks: Vec<Block>,
	connections: Vec<Connection>,
	next_block: u64,
	next_connection: u64,
}

impl Graph {
	/// Empty graph backed by `registry`.
	pub fn new(registry: Rc<BlockTypeRegistry>, snap: GridSnap) -> Self {
		Self {
			registry,
			snap,
			blocks: Vec::new(),
			connections: Vec::new(),
			next_block: 1,
			next_connection: 1,
		}
	}

	/// Registry this graph instantiates from.
	pub fn registry(&self) -> &BlockTypeRegistry {
		&self.registry
	}

	/// Current snapping settings.
	pub fn snap(&self) -> GridSnap {
		self.snap
	}

	/// Blocks in z-order, bottom first.
	pub fn blocks(&self) -> &[Block] {
		&self.blocks
	}

	/// All connections.
	pub fn connections(&self) -> &[Connection] {
		&self.connections
	}

	/// Looks up a block.
	pub fn block(&self, id: BlockId) -> Option<&Block> {
		self.blocks.iter().find(|b| b.id == id)
	}

	fn block_mut(&mut self, id: BlockId) -> Result<&mut Block, GraphError> {
		self.blocks
			.iter_mut()
			.find(|b| b.id == id)
			.ok_or(GraphError::BlockNotFound(id))
	}

	/// Looks up a connection.
	pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
		self.connections.iter().find(|c| c.id == id)
	}

	/// Whether there are no blocks.
	pub fn is_empty(&self) -> bool {
		self.blocks.is_empty()
	}

	/// Instantiates `type_key` at the snapped `position`.
	pub fn add_block(&mut self, type_key: &str, position: Point) -> Result<BlockId, GraphError> {
		let block_type = self
			.registry
			.get(type_key)
			.ok_or_else(|| GraphError::UnknownBlockType(type_key.to_string()))?;
		let id = BlockId(self.next_block);
		let block = Block {
			id,
			type_key: block_type.key.clone(),
			position: self.snap.snap(position),
			size: block_type.default_size(),
			config: block_type.config.clone(),
			inputs: block_type.inputs.clone(),
			outputs: block_type.outputs.clone(),
		};
		self.next_block += 1;
		self.blocks.push(block);
		debug!("Added {} ({})", id, type_key);
		Ok(id)
	}

	/// Removes a block together with every connection referencing it.
	pub fn delete_block(&mut self, id: BlockId) -> Result<Block, GraphError> {
		let index = self
			.blocks
			.iter()
			.position(|b| b.id == id)
			.ok_or(GraphError::BlockNotFound(id))?;
		let block = self.blocks.remove(index);
		let before = self.connections.len();
		self.connections.retain(|c| !c.touches(id));
		debug!("Deleted {} and {} connection(s)", id, before - self.connections.len());
		Ok(block)
	}

	/// Moves a block to the snapped `position`. Returns whether the position changed.
	pub fn move_block(&mut self, id: BlockId, position: Point) -> Result<bool, GraphError> {
		let snapped = self.snap.snap(position);
		let block = self.block_mut(id)?;
		let moved = block.position != snapped;
		block.position = snapped;
		Ok(moved)
	}

	/// Overwrites an existing setting. Keys outside the block's current set are rejected.
	pub fn set_config(
		&mut self,
		id: BlockId,
		key: &str,
		value: ConfigValue,
	) -> Result<(), GraphError> {
		let block = self.block_mut(id)?;
		match block.config.get_mut(key) {
			Some(slot) => {
				*slot = value;
				Ok(())
			}
			None => Err(GraphError::UnknownConfigKey {
				block: id,
				key: key.to_string(),
			}),
		}
	}

	/// Joins two ports. `origin` is where the gesture started and decides the roles: the output side
	/// becomes `from`, the input side becomes `to`.
	pub fn connect(&mut self, origin: PortRef, target: PortRef) -> Result<ConnectionId, GraphError> {
		if origin.direction == target.direction {
			return Err(GraphError::SameDirection(origin.direction));
		}
		self.resolve_port(origin)?;
		self.resolve_port(target)?;
		let (output, input) = match origin.direction {
			PortDirection::Output => (origin, target),
			PortDirection::Input => (target, origin),
		};
		let (from, to) = (output.end(), input.end());
		if self.connections.iter().any(|c| c.from == from && c.to == to) {
			return Err(GraphError::DuplicateConnection { from, to });
		}
		let id = ConnectionId(self.next_connection);
		self.next_connection += 1;
		self.connections.push(Connection { id, from, to });
		debug!("Connected {} -> {} as {}", from, to, id);
		Ok(id)
	}

	/// Shorthand for connecting `from_block.outputs[from_port]` to `to_block.inputs[to_port]`.
	pub fn connect_ports(
		&mut self,
		from_block: BlockId,
		from_port: usize,
		to_block: BlockId,
		to_port: usize,
	) -> Result<ConnectionId, GraphError> {
		self.connect(
			PortRef::output(from_block, from_port),
			PortRef::input(to_block, to_port),
		)
	}

	/// Removes a connection. `None` when it does not exist.
	pub fn disconnect(&mut self, id: ConnectionId) -> Option<Connection> {
		let index = self.connections.iter().position(|c| c.id == id)?;
		Some(self.connections.remove(index))
	}

	/// World-space centre of a port.
	pub fn port_position(&self, port: PortRef) -> Option<Point> {
		self.block(port.block)?.port_position(port.direction, port.index)
	}

	/// World-space endpoints of a connection, output first.
	pub fn connection_endpoints(&self, connection: &Connection) -> Option<(Point, Point)> {
		let from = self.port_position(PortRef::output(connection.from.block_id, connection.from.port_index))?;
		let to = self.port_position(PortRef::input(connection.to.block_id, connection.to.port_index))?;
		Some((from, to))
	}

	/// Topmost block whose bounds contain `world`.
	pub fn block_at(&self, world: Point) -> Option<BlockId> {
		self.blocks.iter().rev().find(|b| b.rect().contains(world)).map(|b| b.id)
	}

	/// Bounding box of every block, `None` for an empty graph.
	pub fn bounds(&self) -> Option<Rect> {
		let mut blocks = self.blocks.iter().map(Block::rect);
		let first = blocks.next()?;
		Some(blocks.fold(first, |acc, r| acc.union(&r)))
	}

	/// Checks ids are unique and every connection endpoint resolves.
	pub fn validate(&self) -> Result<(), GraphError> {
		check_structure(&self.blocks, &self.connections)
	}

	/// Deep copy of blocks and connections.
	pub fn snapshot(&self) -> GraphSnapshot {
		GraphSnapshot {
			blocks: self.blocks.clone(),
			connections: self.connections.clone(),
		}
	}

	/// Replaces the contents with a copy of `snapshot`. Id counters only move forward, so ids are never
	/// reused within a session.
	pub fn restore(&mut self, snapshot: &GraphSnapshot) {
		self.blocks = snapshot.blocks.clone();
		self.connections = snapshot.connections.clone();
		let max_block = self.blocks.iter().map(|b| b.id.0).max().unwrap_or(0);
		let max_connection = self.connections.iter().map(|c| c.id.0).max().unwrap_or(0);
		self.next_block = self.next_block.max(max_block + 1);
		self.next_connection = self.next_connection.max(max_connection + 1);
	}

	/// Drops every block and connection.
	pub fn clear(&mut self) {
		self.blocks.clear();
		self.connections.clear();
	}

	fn resolve_port(&self, port: PortRef) -> Result<&PortSpec, GraphError> {
		let block = self.block(port.block).ok_or(GraphError::BlockNotFound(port.block))?;
		block
			.ports(port.direction)
			.get(port.index)
			.ok_or(GraphError::PortNotFound {
				block: port.block,
				direction: port.direction,
				index: port.index,
			})
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn graph() -> Graph {
		Graph::new(Rc::new(BlockTypeRegistry::builtin()), GridSnap::default())
	}

	#[test]
	fn add_block_copies_registry_defaults() {
		let mut graph = graph();
		let id = graph.add_block("llmPrompt", Point::new(101.0, 89.0)).unwrap();
		let block = graph.block(id).unwrap();
		let entry = graph.registry().get("llmPrompt").unwrap();
		assert_eq!(block.position, Point::new(100.0, 80.0));
		assert_eq!(block.config, entry.config);
		assert_eq!(block.inputs, entry.inputs);
		assert_eq!(block.outputs, entry.outputs);
		assert_eq!(block.size, entry.default_size());
	}

	#[test]
	fn unknown_type_is_rejected() {
		let mut graph = graph();
		assert_eq!(
			graph.add_block("nope", Point::ZERO),
			Err(GraphError::UnknownBlockType("nope".to_string()))
		);
		assert!(graph.is_empty());
	}

	#[test]
	fn delete_removes_every_touching_connection() {
		let mut graph = graph();
		let a = graph.add_block("textInput", Point::ZERO).unwrap();
		let m = graph.add_block("merge", Point::new(300.0, 0.0)).unwrap();
		let out = graph.add_block("textOutput", Point::new(600.0, 0.0)).unwrap();
		graph.connect_ports(a, 0, m, 0).unwrap();
		graph.connect_ports(a, 0, m, 1).unwrap();
		graph.connect_ports(m, 0, out, 0).unwrap();

		graph.delete_block(m).unwrap();
		assert_eq!(graph.connections().len(), 0);
		assert!(graph.connections().iter().all(|c| !c.touches(m)));
		assert_eq!(graph.blocks().len(), 2);
		assert_eq!(graph.delete_block(m), Err(GraphError::BlockNotFound(m)));
	}

	#[test]
	fn connect_infers_roles_from_origin() {
		let mut graph = graph();
		let a = graph.add_block("textInput", Point::ZERO).unwrap();
		let b = graph.add_block("textOutput", Point::new(300.0, 0.0)).unwrap();
		let id = graph
			.connect(PortRef::input(b, 0), PortRef::output(a, 0))
			.unwrap();
		let connection = graph.connection(id).unwrap();
		assert_eq!(connection.from.block_id, a);
		assert_eq!(connection.to.block_id, b);
	}

	#[test]
	fn same_direction_is_rejected() {
		let mut graph = graph();
		let a = graph.add_block("transform", Point::ZERO).unwrap();
		let b = graph.add_block("transform", Point::new(300.0, 0.0)).unwrap();
		assert_eq!(
			graph.connect(PortRef::output(a, 0), PortRef::output(b, 0)),
			Err(GraphError::SameDirection(PortDirection::Output))
		);
		assert_eq!(
			graph.connect(PortRef::input(a, 0), PortRef::input(b, 0)),
			Err(GraphError::SameDirection(PortDirection::Input))
		);
		assert!(graph.connections().is_empty());
	}

	#[test]
	fn missing_ports_and_duplicates_are_rejected() {
		let mut graph = graph();
		let a = graph.add_block("textInput", Point::ZERO).unwrap();
		let b = graph.add_block("textOutput", Point::new(300.0, 0.0)).unwrap();
		assert!(matches!(
			graph.connect_ports(a, 3, b, 0),
			Err(GraphError::PortNotFound { index: 3, .. })
		));
		assert!(matches!(
			graph.connect_ports(a, 0, BlockId(99), 0),
			Err(GraphError::BlockNotFound(BlockId(99)))
		));
		graph.connect_ports(a, 0, b, 0).unwrap();
		assert!(matches!(
			graph.connect_ports(a, 0, b, 0),
			Err(GraphError::DuplicateConnection { .. })
		));
		assert_eq!(graph.connections().len(), 1);
	}

	#[test]
	fn self_loops_are_allowed() {
		let mut graph = graph();
		let t = graph.add_block("transform", Point::ZERO).unwrap();
		assert!(graph.connect_ports(t, 0, t, 0).is_ok());
	}

	#[test]
	fn set_config_only_updates_existing_keys() {
		let mut graph = graph();
		let id = graph.add_block("transform", Point::ZERO).unwrap();
		graph.set_config(id, "trim", false.into()).unwrap();
		assert_eq!(graph.block(id).unwrap().config["trim"], ConfigValue::Bool(false));
		assert!(matches!(
			graph.set_config(id, "extra", 1.0.into()),
			Err(GraphError::UnknownConfigKey { .. })
		));
		assert!(!graph.block(id).unwrap().config.contains_key("extra"));
		assert!(graph.set_config(BlockId(42), "trim", true.into()).is_err());
	}

	#[test]
	fn move_snaps_and_reports_change() {
		let mut graph = graph();
		let id = graph.add_block("transform", Point::ZERO).unwrap();
		assert_eq!(graph.move_block(id, Point::new(7.0, 3.0)), Ok(false));
		assert_eq!(graph.move_block(id, Point::new(33.0, 47.0)), Ok(true));
		assert_eq!(graph.block(id).unwrap().position, Point::new(40.0, 40.0));
	}

	#[test]
	fn restore_never_reuses_ids() {
		let mut graph = graph();
		let empty = graph.snapshot();
		let first = graph.add_block("transform", Point::ZERO).unwrap();
		graph.restore(&empty);
		let second = graph.add_block("transform", Point::ZERO).unwrap();
		assert_ne!(first, second);
	}

	#[test]
	fn ports_are_ordered_top_down() {
		let mut graph = graph();
		let id = graph.add_block("merge", Point::ZERO).unwrap();
		let block = graph.block(id).unwrap();
		let first = block.port_position(PortDirection::Input, 0).unwrap();
		let second = block.port_position(PortDirection::Input, 1).unwrap();
		let output = block.port_position(PortDirection::Output, 0).unwrap();
		assert!(first.y < second.y);
		assert_eq!(first.x, 0.0);
		assert_eq!(output.x, block.size.width);
		assert!(block.port_position(PortDirection::Output, 1).is_none());
	}

	#[test]
	fn block_at_prefers_topmost() {
		let mut graph = graph();
		let under = graph.add_block("transform", Point::ZERO).unwrap();
		let over = graph.add_block("transform", Point::new(20.0, 20.0)).unwrap();
		assert_eq!(graph.block_at(Point::new(30.0, 30.0)), Some(over));
		assert_eq!(graph.block_at(Point::new(5.0, 5.0)), Some(under));
		assert_eq!(graph.block_at(Point::new(-5.0, 5.0)), None);
	}
}
