//! Error types for graph mutation and persistence.

use thiserror::Error;

use super::graph::{BlockId, ConnectionEnd, ConnectionId, PortDirection};

/// Errors raised by graph mutations.
///
/// The interactive path treats these as no-ops; only direction and storage problems are shown to the
/// user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
	/// No registry entry with this key.
	#[error("Unknown block type '{0}'")]
	UnknownBlockType(String),

	/// The block id does not resolve.
	#[error("Block {0} not found")]
	BlockNotFound(BlockId),

	/// The block exists but has no port at this index.
	#[error("Block {block} has no {direction} port at index {index}")]
	PortNotFound {
		/// Owning block.
		block: BlockId,
		/// Side that was searched.
		direction: PortDirection,
		/// Requested index.
		index: usize,
	},

	/// Both endpoints are outputs or both are inputs.
	#[error("Cannot connect two {0} ports")]
	SameDirection(PortDirection),

	/// The exact same output/input pair is already connected.
	#[error("Ports {from} and {to} are already connected")]
	DuplicateConnection {
		/// Output endpoint.
		from: ConnectionEnd,
		/// Input endpoint.
		to: ConnectionEnd,
	},

	/// Two blocks in one graph share an id.
	#[error("Block id {0} is used more than once")]
	DuplicateBlockId(BlockId),

	/// Two connections in one graph share an id.
	#[error("Connection id {0} is used more than once")]
	DuplicateConnectionId(ConnectionId),

	/// Only keys seeded from the registry defaults may be updated.
	#[error("Block {block} has no setting '{key}'")]
	UnknownConfigKey {
		/// Target block.
		block: BlockId,
		/// Rejected key.
		key: String,
	},
}

/// Errors raised by the flow store and its storage sink.
#[derive(Error, Debug)]
pub enum PersistenceError {
	/// No storage backend could be opened.
	#[error("Storage is unavailable: {0}")]
	Unavailable(String),

	/// The sink rejected a read or write (quota exceeded, private mode, ...).
	#[error("Storage write failed: {0}")]
	Storage(String),

	/// Stored text is not a valid flow record.
	#[error("Failed to (de)serialize flow: {0}")]
	Serialization(#[from] serde_json::Error),

	/// A stored or imported flow references blocks or ports it does not contain.
	#[error("Flow is not a valid graph: {0}")]
	InvalidFlow(#[from] GraphError),

	/// No saved flow with this id.
	#[error("Flow '{0}' not found")]
	FlowNotFound(String),
}
