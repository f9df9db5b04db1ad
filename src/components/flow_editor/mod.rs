//! Canvas-based node-graph editor for building flows out of typed blocks.
//!
//! The model side (`graph`, `history`, `persistence`, `state`, `interaction`) has no DOM dependency
//! and is driven by plain values; `component` wires it to a Leptos view and a 2d canvas.

mod canvas;
mod component;
pub mod config;
pub mod error;
pub mod graph;
pub mod history;
pub mod interaction;
pub mod minimap;
pub mod persistence;
pub mod registry;
pub mod render;
pub mod state;
pub mod types;
pub mod viewport;

pub use component::FlowEditorCanvas;
pub use config::EditorConfig;
pub use error::{GraphError, PersistenceError};
pub use graph::{Block, BlockId, Connection, ConnectionId, Graph, GraphSnapshot, PortDirection, PortRef};
pub use persistence::{FlowRecord, FlowStore, LocalStorageSink, MemorySink, StorageSink};
pub use registry::{BlockType, BlockTypeRegistry, Category, ConfigValue};
pub use state::{ExecutionMode, ExecutionRequest, FlowEditor, Notice, NoticeLevel, Selection};
