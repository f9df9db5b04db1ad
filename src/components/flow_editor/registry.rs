//! Static catalogue of block kinds.
//!
//! Each entry carries display metadata, default configuration and its ordered port lists. Blocks copy
//! what they need at creation time, so the registry stays read-only once the editor is running.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::types::Size;

/// Block width in world units.
pub const BLOCK_WIDTH: f64 = 180.0;
/// Height of the title area above the first port row.
pub const HEADER_HEIGHT: f64 = 36.0;
/// Vertical distance between port rows.
pub const PORT_SPACING: f64 = 24.0;
/// Padding below the last port row.
pub const FOOTER_HEIGHT: f64 = 12.0;

/// A single configuration value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
	/// Checkbox setting.
	Bool(bool),
	/// Numeric setting.
	Number(f64),
	/// Free text setting.
	Text(String),
}

impl fmt::Display for ConfigValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConfigValue::Bool(b) => write!(f, "{b}"),
			ConfigValue::Number(n) => write!(f, "{n}"),
			ConfigValue::Text(s) => f.write_str(s),
		}
	}
}

impl From<bool> for ConfigValue {
	fn from(value: bool) -> Self {
		ConfigValue::Bool(value)
	}
}

impl From<f64> for ConfigValue {
	fn from(value: f64) -> Self {
		ConfigValue::Number(value)
	}
}

impl From<&str> for ConfigValue {
	fn from(value: &str) -> Self {
		ConfigValue::Text(value.to_string())
	}
}

/// Ordered setting name to value mapping.
pub type ConfigMap = IndexMap<String, ConfigValue>;

/// Named, typed connection point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSpec {
	/// Label shown in the hover tag.
	pub name: String,
	/// Free-form data type tag ("text", "number", "any", ...).
	pub data_type: String,
}

impl PortSpec {
	/// Creates a port descriptor.
	pub fn new(name: &str, data_type: &str) -> Self {
		Self {
			name: name.to_string(),
			data_type: data_type.to_string(),
		}
	}
}

/// Palette grouping. Also decides the accent bar colour of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
	/// Data sources.
	Input,
	/// Transformations.
	Processing,
	/// Branching and flow control.
	Logic,
	/// Model-backed blocks.
	Ai,
	/// External services.
	Integration,
	/// Sinks.
	Output,
}

impl Category {
	/// All categories in palette order.
	pub const ALL: [Category; 6] = [
		Category::Input,
		Category::Processing,
		Category::Logic,
		Category::Ai,
		Category::Integration,
		Category::Output,
	];

	/// Display label.
	pub fn label(self) -> &'static str {
		match self {
			Category::Input => "Input",
			Category::Processing => "Processing",
			Category::Logic => "Logic",
			Category::Ai => "AI",
			Category::Integration => "Integration",
			Category::Output => "Output",
		}
	}

	/// Accent colour.
	pub fn color(self) -> &'static str {
		match self {
			Category::Input => "#4fc3f7",
			Category::Processing => "#81c784",
			Category::Logic => "#ffb74d",
			Category::Ai => "#ba68c8",
			Category::Integration => "#4db6ac",
			Category::Output => "#e57373",
		}
	}
}

/// One catalogue entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockType {
	/// Unique lookup key, e.g. `textInput`.
	pub key: String,
	/// Palette group.
	pub category: Category,
	/// Short glyph drawn in the title bar.
	pub icon: String,
	/// Display name.
	pub name: String,
	/// One-line description.
	pub description: String,
	/// Icon colour.
	pub color: String,
	/// Default settings, copied into each new block.
	pub config: ConfigMap,
	/// Input ports, top to bottom.
	pub inputs: Vec<PortSpec>,
	/// Output ports, top to bottom.
	pub outputs: Vec<PortSpec>,
}

impl BlockType {
	/// Size given to new blocks of this type.
	pub fn default_size(&self) -> Size {
		let rows = self.inputs.len().max(self.outputs.len()).max(1) as f64;
		Size::new(BLOCK_WIDTH, HEADER_HEIGHT + rows * PORT_SPACING + FOOTER_HEIGHT)
	}

	fn matches(&self, needle: &str) -> bool {
		[
			self.key.as_str(),
			self.name.as_str(),
			self.description.as_str(),
			self.category.label(),
		]
		.iter()
		.any(|field| field.to_lowercase().contains(needle))
	}
}

/// Ordered catalogue of block types.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockTypeRegistry {
	types: Vec<BlockType>,
}

impl BlockTypeRegistry {
	/// Empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces an entry. Replacing keeps the original catalogue position.
	pub fn register(&mut self, block_type: BlockType) -> &mut Self {
		match self.types.iter_mut().find(|t| t.key == block_type.key) {
			Some(existing) => *existing = block_type,
			None => self.types.push(block_type),
		}
		self
	}

	/// Looks up an entry by key.
	pub fn get(&self, key: &str) -> Option<&BlockType> {
		self.types.iter().find(|t| t.key == key)
	}

	/// All entries in catalogue order.
	pub fn iter(&self) -> impl Iterator<Item = &BlockType> {
		self.types.iter()
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.types.len()
	}

	/// Whether the catalogue is empty.
	pub fn is_empty(&self) -> bool {
		self.types.is_empty()
	}

	/// Entries grouped by category, skipping empty groups.
	pub fn by_category(&self) -> Vec<(Category, Vec<&BlockType>)> {
		Category::ALL
			.iter()
			.map(|&category| {
				let entries: Vec<&BlockType> =
					self.types.iter().filter(|t| t.category == category).collect();
				(category, entries)
			})
			.filter(|(_, entries)| !entries.is_empty())
			.collect()
	}

	/// Case-insensitive search over key, name, description and category.
	/// An empty query returns everything.
	pub fn search(&self, query: &str) -> Vec<&BlockType> {
		let needle = query.trim().to_lowercase();
		self.types.iter().filter(|t| needle.is_empty() || t.matches(&needle)).collect()
	}

	/// The built-in catalogue.
	pub fn builtin() -> Self {
		let mut registry = Self::new();
		for block_type in builtin_types() {
			registry.register(block_type);
		}
		registry
	}
}

#[allow(clippy::too_many_arguments)]
fn entry(
	key: &str,
	category: Category,
	icon: &str,
	name: &str,
	description: &str,
	config: &[(&str, ConfigValue)],
	inputs: &[(&str, &str)],
	outputs: &[(&str, &str)],
) -> BlockType {
	BlockType {
		key: key.to_string(),
		category,
		icon: icon.to_string(),
		name: name.to_string(),
		description: description.to_string(),
		color: category.color().to_string(),
		config: config.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
		inputs: inputs.iter().map(|(n, t)| PortSpec::new(n, t)).collect(),
		outputs: outputs.iter().map(|(n, t)| PortSpec::new(n, t)).collect(),
	}
}

fn builtin_types() -> Vec<BlockType> {
	use Category::*;

	vec![
		entry(
			"textInput",
			Input,
			"T",
			"Text Input",
			"Provides a fixed or user-entered text value",
			&[("placeholder", "Enter text...".into()), ("multiline", false.into())],
			&[],
			&[("text", "text")],
		),
		entry(
			"numberInput",
			Input,
			"#",
			"Number Input",
			"Provides a numeric value",
			&[("value", 0.0.into()), ("min", 0.0.into()), ("max", 100.0.into())],
			&[],
			&[("value", "number")],
		),
		entry(
			"fileInput",
			Input,
			"F",
			"File Input",
			"Reads the contents of an uploaded file",
			&[("accept", ".txt,.csv,.json".into())],
			&[],
			&[("content", "text"), ("name", "text")],
		),
		entry(
			"transform",
			Processing,
			"~",
			"Transform",
			"Applies a text transformation",
			&[("operation", "uppercase".into()), ("trim", true.into())],
			&[("input", "text")],
			&[("output", "text")],
		),
		entry(
			"merge",
			Processing,
			"+",
			"Merge",
			"Joins two inputs into one",
			&[("separator", " ".into())],
			&[("first", "any"), ("second", "any")],
			&[("merged", "any")],
		),
		entry(
			"condition",
			Logic,
			"?",
			"Condition",
			"Routes input to one of two outputs",
			&[("expression", "value > 0".into())],
			&[("value", "any")],
			&[("true", "any"), ("false", "any")],
		),
		entry(
			"loop",
			Logic,
			"@",
			"Loop",
			"Repeats its body for each item",
			&[("maxIterations", 10.0.into())],
			&[("items", "list")],
			&[("item", "any"), ("done", "list")],
		),
		entry(
			"llmPrompt",
			Ai,
			"*",
			"LLM Prompt",
			"Sends a prompt to a language model",
			&[
				("model", "default".into()),
				("temperature", 0.7.into()),
				("maxTokens", 512.0.into()),
			],
			&[("prompt", "text"), ("context", "text")],
			&[("response", "text")],
		),
		entry(
			"classifier",
			Ai,
			"%",
			"Classifier",
			"Labels text with a category and confidence",
			&[("labels", "positive,negative".into()), ("threshold", 0.5.into())],
			&[("text", "text")],
			&[("label", "text"), ("confidence", "number")],
		),
		entry(
			"httpRequest",
			Integration,
			"H",
			"HTTP Request",
			"Calls an external endpoint",
			&[("method", "GET".into()), ("url", "https://".into())],
			&[("body", "any")],
			&[("response", "any"), ("status", "number")],
		),
		entry(
			"textOutput",
			Output,
			">",
			"Text Output",
			"Displays a text value",
			&[("format", "plain".into())],
			&[("text", "text")],
			&[],
		),
		entry(
			"logger",
			Output,
			"L",
			"Logger",
			"Writes any value to the log",
			&[("level", "info".into())],
			&[("value", "any")],
			&[],
		),
	]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builtin_has_unique_keys() {
		let registry = BlockTypeRegistry::builtin();
		let mut keys: Vec<_> = registry.iter().map(|t| t.key.clone()).collect();
		let total = keys.len();
		keys.sort();
		keys.dedup();
		assert_eq!(keys.len(), total);
		assert!(registry.get("textInput").is_some());
		assert!(registry.get("textOutput").is_some());
	}

	#[test]
	fn register_replaces_in_place() {
		let mut registry = BlockTypeRegistry::builtin();
		let position = registry.iter().position(|t| t.key == "merge").unwrap();
		let mut merge = registry.get("merge").unwrap().clone();
		merge.name = "Join".to_string();
		registry.register(merge);
		assert_eq!(registry.iter().position(|t| t.key == "merge"), Some(position));
		assert_eq!(registry.get("merge").unwrap().name, "Join");
	}

	#[test]
	fn search_is_case_insensitive() {
		let registry = BlockTypeRegistry::builtin();
		let keys: Vec<_> = registry.search("OUTPUT").iter().map(|t| t.key.as_str()).collect();
		assert!(keys.contains(&"textOutput"));
		assert!(keys.contains(&"logger"));
		assert_eq!(registry.search("  ").len(), registry.len());
		assert!(registry.search("no such block").is_empty());
	}

	#[test]
	fn default_size_grows_with_ports() {
		let registry = BlockTypeRegistry::builtin();
		let one = registry.get("transform").unwrap().default_size();
		let two = registry.get("merge").unwrap().default_size();
		assert_eq!(one.width, BLOCK_WIDTH);
		assert_eq!(two.height - one.height, PORT_SPACING);
	}

	#[test]
	fn config_values_keep_their_json_shape() {
		let json = serde_json::to_string(&registry_config()).unwrap();
		assert_eq!(json, r#"{"a":true,"b":1.5,"c":"x"}"#);
		let back: ConfigMap = serde_json::from_str(&json).unwrap();
		assert_eq!(back, registry_config());
	}

	fn registry_config() -> ConfigMap {
		[
			("a".to_string(), ConfigValue::Bool(true)),
			("b".to_string(), ConfigValue::Number(1.5)),
			("c".to_string(), ConfigValue::Text("x".to_string())),
		]
		.into_iter()
		.collect()
	}
}
