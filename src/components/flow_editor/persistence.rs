//! Saved flows and the storage sink they are written to.
//!
//! The full list of saved flows lives under one key and a single autosave record under another. Sinks
//! are swappable so the store can run against `localStorage` in the browser and an in-memory map in
//! tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::config::{AUTOSAVE_FLOW_ID, AUTOSAVE_STORAGE_KEY, FLOWS_STORAGE_KEY};
use super::error::PersistenceError;
use super::graph::{Block, Connection, GraphSnapshot};

/// One persisted flow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
	/// Unique id, `autosave` for the reserved record.
	pub id: String,
	/// User-facing name.
	pub name: String,
	/// Blocks in z-order.
	pub blocks: Vec<Block>,
	/// Connections.
	pub connections: Vec<Connection>,
	/// Save time, epoch milliseconds.
	pub timestamp: f64,
}

impl FlowRecord {
	/// Structural content of the record.
	pub fn snapshot(&self) -> GraphSnapshot {
		GraphSnapshot {
			blocks: self.blocks.clone(),
			connections: self.connections.clone(),
		}
	}
}

/// Key/value text store.
pub trait StorageSink {
	/// Reads a value, `Ok(None)` when the key is absent.
	fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;
	/// Writes a value.
	fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
	/// Deletes a value. Absent keys are not an error.
	fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

/// In-memory sink. Clones share the same entries.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
	entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemorySink {
	/// Empty sink.
	pub fn new() -> Self {
		Self::default()
	}
}

impl StorageSink for MemorySink {
	fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
		Ok(self.entries.borrow().get(key).cloned())
	}

	fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
		self.entries.borrow_mut().insert(key.to_string(), value.to_string());
		Ok(())
	}

	fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
		self.entries.borrow_mut().remove(key);
		Ok(())
	}
}

/// Sink backed by the browser's `localStorage`.
pub struct LocalStorageSink {
	storage: web_sys::Storage,
}

impl LocalStorageSink {
	/// Opens `window.localStorage`.
	pub fn open() -> Result<Self, PersistenceError> {
		let window = web_sys::window()
			.ok_or_else(|| PersistenceError::Unavailable("no window".to_string()))?;
		let storage = window
			.local_storage()
			.map_err(|e| PersistenceError::Unavailable(format!("{e:?}")))?
			.ok_or_else(|| PersistenceError::Unavailable("localStorage disabled".to_string()))?;
		Ok(Self { storage })
	}
}

impl StorageSink for LocalStorageSink {
	fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
		self.storage
			.get_item(key)
			.map_err(|e| PersistenceError::Storage(format!("{e:?}")))
	}

	fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
		self.storage
			.set_item(key, value)
			.map_err(|e| PersistenceError::Storage(format!("{e:?}")))
	}

	fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
		self.storage
			.remove_item(key)
			.map_err(|e| PersistenceError::Storage(format!("{e:?}")))
	}
}

/// Saved-flow list plus autosave slot on top of a sink.
pub struct FlowStore {
	sink: Box<dyn StorageSink>,
	flows: Vec<FlowRecord>,
	next_id: u64,
}

impl FlowStore {
	/// Loads the existing flow list from `sink`. Unreadable lists are logged and treated as empty so a
	/// corrupt entry never prevents the editor from starting.
	pub fn new(sink: Box<dyn StorageSink>) -> Self {
		let flows = match read_json::<Vec<FlowRecord>>(sink.as_ref(), FLOWS_STORAGE_KEY) {
			Ok(flows) => flows.unwrap_or_default(),
			Err(err) => {
				warn!("Ignoring saved flows: {}", err);
				Vec::new()
			}
		};
		info!("Flow store opened with {} saved flow(s)", flows.len());
		Self {
			sink,
			next_id: flows.len() as u64 + 1,
			flows,
		}
	}

	/// Saved flows, newest first.
	pub fn flows(&self) -> Vec<&FlowRecord> {
		let mut flows: Vec<_> = self.flows.iter().collect();
		flows.sort_by(|a, b| b.timestamp.total_cmp(&a.timestamp));
		flows
	}

	/// Looks up a saved flow.
	pub fn get(&self, id: &str) -> Option<&FlowRecord> {
		self.flows.iter().find(|f| f.id == id)
	}

	/// Appends a new record for `snapshot` and writes the full list. In-memory state is left untouched
	/// when the write fails.
	pub fn save(
		&mut self,
		name: &str,
		snapshot: &GraphSnapshot,
		timestamp: f64,
	) -> Result<FlowRecord, PersistenceError> {
		let record = FlowRecord {
			id: self.fresh_id(timestamp),
			name: name.to_string(),
			blocks: snapshot.blocks.clone(),
			connections: snapshot.connections.clone(),
			timestamp,
		};
		self.insert(record.clone())?;
		info!("Saved flow '{}' as {}", record.name, record.id);
		Ok(record)
	}

	/// Removes a saved flow.
	pub fn delete(&mut self, id: &str) -> Result<FlowRecord, PersistenceError> {
		let index = self
			.flows
			.iter()
			.position(|f| f.id == id)
			.ok_or_else(|| PersistenceError::FlowNotFound(id.to_string()))?;
		let mut flows = self.flows.clone();
		let removed = flows.remove(index);
		self.sink.write(FLOWS_STORAGE_KEY, &serde_json::to_string(&flows)?)?;
		self.flows = flows;
		Ok(removed)
	}

	/// Writes the reserved autosave record. Empty graphs are skipped; returns whether anything was
	/// written.
	pub fn autosave(
		&mut self,
		snapshot: &GraphSnapshot,
		timestamp: f64,
	) -> Result<bool, PersistenceError> {
		if snapshot.blocks.is_empty() {
			return Ok(false);
		}
		let record = FlowRecord {
			id: AUTOSAVE_FLOW_ID.to_string(),
			name: "Autosave".to_string(),
			blocks: snapshot.blocks.clone(),
			connections: snapshot.connections.clone(),
			timestamp,
		};
		self.sink.write(AUTOSAVE_STORAGE_KEY, &serde_json::to_string(&record)?)?;
		Ok(true)
	}

	/// The autosave record, if one was written.
	pub fn read_autosave(&self) -> Result<Option<FlowRecord>, PersistenceError> {
		read_json(self.sink.as_ref(), AUTOSAVE_STORAGE_KEY)
	}

	/// Drops the autosave record.
	pub fn clear_autosave(&mut self) -> Result<(), PersistenceError> {
		self.sink.remove(AUTOSAVE_STORAGE_KEY)
	}

	/// Pretty JSON for a saved flow.
	pub fn export_json(&self, id: &str) -> Result<String, PersistenceError> {
		let record = self.get(id).ok_or_else(|| PersistenceError::FlowNotFound(id.to_string()))?;
		Ok(serde_json::to_string_pretty(record)?)
	}

	/// Adds a flow from exported JSON under a fresh id. Records with dangling or duplicate references
	/// are rejected.
	pub fn import_json(&mut self, json: &str, timestamp: f64) -> Result<FlowRecord, PersistenceError> {
		let mut record: FlowRecord = serde_json::from_str(json)?;
		record.snapshot().validate()?;
		record.id = self.fresh_id(timestamp);
		record.timestamp = timestamp;
		self.insert(record.clone())?;
		Ok(record)
	}

	fn insert(&mut self, record: FlowRecord) -> Result<(), PersistenceError> {
		let mut flows = self.flows.clone();
		flows.push(record);
		self.sink.write(FLOWS_STORAGE_KEY, &serde_json::to_string(&flows)?)?;
		self.flows = flows;
		Ok(())
	}

	fn fresh_id(&mut self, timestamp: f64) -> String {
		loop {
			let id = format!("flow_{}_{}", timestamp as u64, self.next_id);
			self.next_id += 1;
			if self.get(&id).is_none() {
				return id;
			}
		}
	}
}

fn read_json<T: for<'de> Deserialize<'de>>(
	sink: &dyn StorageSink,
	key: &str,
) -> Result<Option<T>, PersistenceError> {
	match sink.read(key)? {
		Some(text) => Ok(Some(serde_json::from_str(&text)?)),
		None => Ok(None),
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use std::rc::Rc;

	use pretty_assertions::assert_eq;

	use super::*;
	use crate::components::flow_editor::error::GraphError;
	use crate::components::flow_editor::graph::{BlockId, Graph};
	use crate::components::flow_editor::registry::BlockTypeRegistry;
	use crate::components::flow_editor::types::Point;
	use crate::components::flow_editor::viewport::GridSnap;

	/// Sink that rejects every write, as a full quota would.
	pub(crate) struct FullSink;

	impl StorageSink for FullSink {
		fn read(&self, _key: &str) -> Result<Option<String>, PersistenceError> {
			Ok(None)
		}

		fn write(&mut self, _key: &str, _value: &str) -> Result<(), PersistenceError> {
			Err(PersistenceError::Storage("QuotaExceededError".to_string()))
		}

		fn remove(&mut self, _key: &str) -> Result<(), PersistenceError> {
			Ok(())
		}
	}

	fn sample() -> GraphSnapshot {
		let mut graph = Graph::new(Rc::new(BlockTypeRegistry::builtin()), GridSnap::default());
		let a = graph.add_block("textInput", Point::new(100.0, 100.0)).unwrap();
		let b = graph.add_block("textOutput", Point::new(400.0, 100.0)).unwrap();
		graph.connect_ports(a, 0, b, 0).unwrap();
		graph.snapshot()
	}

	#[test]
	fn saved_flows_survive_reopening() {
		let sink = MemorySink::new();
		let snapshot = sample();
		let saved = FlowStore::new(Box::new(sink.clone()))
			.save("First", &snapshot, 1_000.0)
			.unwrap();
		let store = FlowStore::new(Box::new(sink));
		let record = store.get(&saved.id).unwrap();
		assert_eq!(record.snapshot(), snapshot);
		assert_eq!(record.name, "First");
	}

	#[test]
	fn flows_are_listed_newest_first() {
		let mut store = FlowStore::new(Box::new(MemorySink::new()));
		store.save("old", &sample(), 1.0).unwrap();
		store.save("new", &sample(), 2.0).unwrap();
		let names: Vec<_> = store.flows().iter().map(|f| f.name.as_str()).collect();
		assert_eq!(names, vec!["new", "old"]);
	}

	#[test]
	fn record_uses_camel_case_fields() {
		let mut store = FlowStore::new(Box::new(MemorySink::new()));
		let record = store.save("x", &sample(), 5.0).unwrap();
		let json = serde_json::to_value(&record).unwrap();
		assert_eq!(json["blocks"][0]["typeKey"], "textInput");
		assert_eq!(json["connections"][0]["from"]["portIndex"], 0);
		assert!(json["timestamp"].is_number());
	}

	#[test]
	fn autosave_skips_empty_graphs() {
		let mut store = FlowStore::new(Box::new(MemorySink::new()));
		assert!(!store.autosave(&GraphSnapshot::default(), 1.0).unwrap());
		assert!(store.read_autosave().unwrap().is_none());
		assert!(store.autosave(&sample(), 2.0).unwrap());
		let record = store.read_autosave().unwrap().unwrap();
		assert_eq!(record.id, AUTOSAVE_FLOW_ID);
		assert!(store.flows().is_empty());
		store.clear_autosave().unwrap();
		assert!(store.read_autosave().unwrap().is_none());
	}

	#[test]
	fn failed_write_leaves_list_untouched() {
		let mut store = FlowStore::new(Box::new(FullSink));
		assert!(matches!(
			store.save("x", &sample(), 1.0),
			Err(PersistenceError::Storage(_))
		));
		assert!(store.flows().is_empty());
		assert!(store.autosave(&sample(), 1.0).is_err());
	}

	#[test]
	fn corrupt_list_is_ignored() {
		let mut sink = MemorySink::new();
		sink.write(FLOWS_STORAGE_KEY, "{not json").unwrap();
		let store = FlowStore::new(Box::new(sink));
		assert!(store.flows().is_empty());
	}

	#[test]
	fn export_then_import_adds_a_copy() {
		let mut store = FlowStore::new(Box::new(MemorySink::new()));
		let saved = store.save("shared", &sample(), 1.0).unwrap();
		let json = store.export_json(&saved.id).unwrap();
		let imported = store.import_json(&json, 2.0).unwrap();
		assert_ne!(imported.id, saved.id);
		assert_eq!(imported.snapshot(), saved.snapshot());
		assert_eq!(store.flows().len(), 2);
		assert!(store.import_json("[]", 3.0).is_err());
	}

	#[test]
	fn import_rejects_dangling_and_duplicate_references() {
		let mut store = FlowStore::new(Box::new(MemorySink::new()));
		let saved = store.save("shared", &sample(), 1.0).unwrap();
		let exported: serde_json::Value =
			serde_json::from_str(&store.export_json(&saved.id).unwrap()).unwrap();

		let mut dangling = exported.clone();
		dangling["connections"][0]["to"]["blockId"] = 99.into();
		assert!(matches!(
			store.import_json(&dangling.to_string(), 2.0),
			Err(PersistenceError::InvalidFlow(GraphError::BlockNotFound(BlockId(99))))
		));

		let mut out_of_range = exported.clone();
		out_of_range["connections"][0]["from"]["portIndex"] = 7.into();
		assert!(matches!(
			store.import_json(&out_of_range.to_string(), 3.0),
			Err(PersistenceError::InvalidFlow(GraphError::PortNotFound { index: 7, .. }))
		));

		let mut twins = exported;
		let first_id = twins["blocks"][0]["id"].clone();
		twins["blocks"][1]["id"] = first_id;
		assert!(matches!(
			store.import_json(&twins.to_string(), 4.0),
			Err(PersistenceError::InvalidFlow(GraphError::DuplicateBlockId(_)))
		));

		assert_eq!(store.flows().len(), 1);
	}

	#[test]
	fn delete_removes_saved_flow() {
		let mut store = FlowStore::new(Box::new(MemorySink::new()));
		let saved = store.save("gone", &sample(), 1.0).unwrap();
		store.delete(&saved.id).unwrap();
		assert!(store.get(&saved.id).is_none());
		assert!(matches!(
			store.delete(&saved.id),
			Err(PersistenceError::FlowNotFound(_))
		));
	}
}
