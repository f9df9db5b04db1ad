//! Leptos component wiring the editor to a canvas, a minimap and the side panels.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent,
};

use super::config::EditorConfig;
use super::graph::BlockId;
use super::interaction::{KeyOutcome, Modifiers, PointerButton, PointerInput};
use super::minimap;
use super::persistence::{FlowStore, LocalStorageSink, MemorySink, StorageSink};
use super::registry::{BlockType, BlockTypeRegistry, ConfigValue};
use super::render;
use super::state::{ExecutionMode, ExecutionRequest, FlowEditor, Notice, NoticeLevel, Selection};
use super::types::Point;

/// Panel-initiated edits, applied to the editor in order by a single effect.
#[derive(Clone, Debug, PartialEq)]
enum PanelAction {
	AddBlock(String),
	Undo,
	Redo,
	NewFlow,
	Save(String),
	Load(String),
	DeleteSaved(String),
	Export(String),
	Import(String),
	SetConfig(BlockId, String, ConfigValue),
	Zoom(i32),
	ResetView,
	FitView,
	Execute(ExecutionMode),
}

#[derive(Clone, Copy)]
struct Dispatch(RwSignal<Vec<PanelAction>>);

impl Dispatch {
	fn send(self, action: PanelAction) {
		self.0.update(|queue| queue.push(action));
	}
}

#[derive(Clone, Debug, PartialEq)]
struct SavedFlowRow {
	id: String,
	name: String,
	blocks: usize,
}

#[derive(Clone, Debug, PartialEq)]
struct Inspector {
	block: BlockId,
	title: String,
	fields: Vec<(String, ConfigValue)>,
}

/// Plain copy of everything the side panels display.
#[derive(Clone, Debug, Default, PartialEq)]
struct PanelState {
	flow_name: String,
	can_undo: bool,
	can_redo: bool,
	zoom_percent: i64,
	block_count: usize,
	connection_count: usize,
	flows: Vec<SavedFlowRow>,
	inspector: Option<Inspector>,
	notice: Option<Notice>,
}

fn open_editor(registry: BlockTypeRegistry, config: EditorConfig) -> FlowEditor {
	let sink: Box<dyn StorageSink> = match LocalStorageSink::open() {
		Ok(sink) => {
			info!("Persisting flows to localStorage");
			Box::new(sink)
		}
		Err(err) => {
			warn!("{}; flows are kept in memory only", err);
			Box::new(MemorySink::new())
		}
	};
	let mut editor = FlowEditor::new(registry, FlowStore::new(sink), config);
	if editor.restore_autosave() {
		info!("Restored autosaved flow");
	}
	editor
}

fn sync_panel(editor: &mut FlowEditor, panel: RwSignal<PanelState>, seen: &Cell<u64>) {
	if editor.revision() == seen.get() {
		return;
	}
	seen.set(editor.revision());

	let notice = editor
		.drain_notices()
		.pop()
		.or_else(|| panel.with_untracked(|p| p.notice.clone()));
	let graph = editor.graph();
	let inspector = match editor.selection() {
		Selection::Block(id) => graph.block(id).map(|block| Inspector {
			block: id,
			title: graph
				.registry()
				.get(&block.type_key)
				.map(|t| t.name.clone())
				.unwrap_or_else(|| block.type_key.clone()),
			fields: block.config.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
		}),
		_ => None,
	};
	panel.set(PanelState {
		flow_name: editor.flow_name().to_string(),
		can_undo: editor.history().can_undo(),
		can_redo: editor.history().can_redo(),
		zoom_percent: (editor.viewport().zoom * 100.0).round() as i64,
		block_count: graph.blocks().len(),
		connection_count: graph.connections().len(),
		flows: editor
			.saved_flows()
			.into_iter()
			.map(|f| SavedFlowRow {
				id: f.id.clone(),
				name: f.name.clone(),
				blocks: f.blocks.len(),
			})
			.collect(),
		inspector,
		notice,
	});
}

fn apply_action(
	editor: &mut FlowEditor,
	action: PanelAction,
	exchange: RwSignal<String>,
	on_execute: Option<Callback<ExecutionRequest>>,
) {
	match action {
		PanelAction::AddBlock(key) => {
			editor.add_block_at_center(&key);
		}
		PanelAction::Undo => {
			editor.undo();
		}
		PanelAction::Redo => {
			editor.redo();
		}
		PanelAction::NewFlow => editor.new_flow(),
		PanelAction::Save(name) => {
			editor.save(&name, js_sys::Date::now());
		}
		PanelAction::Load(id) => {
			editor.load(&id);
		}
		PanelAction::DeleteSaved(id) => {
			editor.delete_saved(&id);
		}
		PanelAction::Export(id) => {
			if let Some(json) = editor.export_flow(&id) {
				exchange.set(json);
			}
		}
		PanelAction::Import(json) => {
			editor.import_flow(&json, js_sys::Date::now());
		}
		PanelAction::SetConfig(block, key, value) => {
			editor.set_block_config(block, &key, value);
		}
		PanelAction::Zoom(steps) => editor.zoom_step(steps),
		PanelAction::ResetView => editor.reset_view(),
		PanelAction::FitView => editor.fit_to_content(),
		PanelAction::Execute(mode) => {
			let Some(request) = editor.execution_request(mode) else {
				return;
			};
			match on_execute {
				Some(callback) => callback.run(request),
				None => info!(
					"{:?} requested for {} block(s); no executor attached",
					mode,
					request.graph.blocks.len()
				),
			}
		}
	}
}

/// Applies every queued action in send order. Draining re-runs the owning effect once, with an empty
/// queue.
fn drain_actions(
	editor: &mut FlowEditor,
	pending: RwSignal<Vec<PanelAction>>,
	exchange: RwSignal<String>,
	on_execute: Option<Callback<ExecutionRequest>>,
) {
	let mut actions = Vec::new();
	pending.update(|queue| actions = std::mem::take(queue));
	for action in actions {
		apply_action(editor, action, exchange, on_execute);
	}
}

fn canvas_context(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok().flatten()?.dyn_into().ok()
}

fn parent_size(canvas: &HtmlCanvasElement) -> (f64, f64) {
	canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.unwrap_or((800.0, 600.0))
}

fn relative_position(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> Point {
	let rect = canvas.get_bounding_client_rect();
	Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn mouse_modifiers(ev: &MouseEvent) -> Modifiers {
	Modifiers {
		ctrl: ev.ctrl_key(),
		shift: ev.shift_key(),
		alt: ev.alt_key(),
		meta: ev.meta_key(),
	}
}

fn pointer_input(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<PointerInput> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	Some(PointerInput {
		screen: relative_position(&canvas, ev),
		button: PointerButton::from_dom(ev.button()),
		modifiers: mouse_modifiers(ev),
	})
}

fn typing_in_field(ev: &KeyboardEvent) -> bool {
	ev.target()
		.and_then(|t| t.dyn_into::<web_sys::Element>().ok())
		.is_some_and(|el| matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT"))
}

/// Node-graph flow editor: block palette, canvas with minimap, toolbar, inspector and saved flows.
#[component]
pub fn FlowEditorCanvas(
	/// Block catalogue; the built-in one when omitted.
	#[prop(optional)]
	registry: Option<BlockTypeRegistry>,
	/// Editor tunables.
	#[prop(optional)]
	config: Option<EditorConfig>,
	/// Receives validated graphs from the Execute and Test buttons.
	#[prop(optional)]
	on_execute: Option<Callback<ExecutionRequest>>,
) -> impl IntoView {
	let registry = registry.unwrap_or_else(BlockTypeRegistry::builtin);
	let config = config.unwrap_or_default();
	let (autosave_ms, show_minimap, minimap_size) = (
		config.autosave_interval_ms,
		config.show_minimap,
		config.minimap_size,
	);

	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let minimap_ref = NodeRef::<leptos::html::Canvas>::new();
	let editor = Rc::new(RefCell::new(open_editor(registry.clone(), config)));
	let seen = Rc::new(Cell::new(u64::MAX));

	let panel = RwSignal::new(PanelState::default());
	let pending = RwSignal::new(Vec::<PanelAction>::new());
	let dispatch = Dispatch(pending);
	let quick_open = RwSignal::new(false);
	let quick_query = RwSignal::new(String::new());
	let save_name = RwSignal::new(String::new());
	let exchange = RwSignal::new(String::new());

	sync_panel(&mut editor.borrow_mut(), panel, &seen);

	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let keydown_cb: Rc<RefCell<Option<Closure<dyn FnMut(KeyboardEvent)>>>> =
		Rc::new(RefCell::new(None));
	let autosave_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (editor_init, seen_init) = (editor.clone(), seen.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if animate.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};
		let Some(ctx) = canvas_context(&canvas) else {
			warn!("2d canvas context unavailable");
			return;
		};
		let (w, h) = parent_size(&canvas);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		editor_init.borrow_mut().resize(w, h);

		let minimap_ctx = minimap_ref.get().and_then(|mini| {
			let mini: HtmlCanvasElement = mini.into();
			mini.set_width(minimap_size.width as u32);
			mini.set_height(minimap_size.height as u32);
			canvas_context(&mini)
		});

		let (editor_resize, canvas_resize) = (editor_init.clone(), canvas.clone());
		*resize_cb.borrow_mut() = Some(Closure::new(move || {
			let (nw, nh) = parent_size(&canvas_resize);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Ok(mut editor) = editor_resize.try_borrow_mut() {
				editor.resize(nw, nh);
			}
		}));
		if let Some(ref cb) = *resize_cb.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (editor_key, seen_key) = (editor_init.clone(), seen_init.clone());
		*keydown_cb.borrow_mut() = Some(Closure::new(move |ev: KeyboardEvent| {
			let key = ev.key();
			if key == "Escape" {
				quick_open.set(false);
			} else if typing_in_field(&ev) {
				return;
			}
			let Ok(mut editor) = editor_key.try_borrow_mut() else {
				return;
			};
			let modifiers = Modifiers {
				ctrl: ev.ctrl_key(),
				shift: ev.shift_key(),
				alt: ev.alt_key(),
				meta: ev.meta_key(),
			};
			match editor.key_down(&key, modifiers) {
				KeyOutcome::Ignored => {}
				KeyOutcome::Handled => ev.prevent_default(),
				KeyOutcome::SaveRequested => {
					ev.prevent_default();
					editor.save_current(js_sys::Date::now());
				}
				KeyOutcome::OpenQuickAdd => {
					ev.prevent_default();
					quick_query.set(String::new());
					quick_open.set(true);
				}
			}
			sync_panel(&mut editor, panel, &seen_key);
		}));
		if let Some(ref cb) = *keydown_cb.borrow() {
			let _ = window.add_event_listener_with_callback("keydown", cb.as_ref().unchecked_ref());
		}

		let (editor_auto, seen_auto) = (editor_init.clone(), seen_init.clone());
		*autosave_cb.borrow_mut() = Some(Closure::new(move || {
			let Ok(mut editor) = editor_auto.try_borrow_mut() else {
				return;
			};
			if editor.autosave(js_sys::Date::now()) {
				debug!("Autosaved {} block(s)", editor.graph().blocks().len());
			}
			sync_panel(&mut editor, panel, &seen_auto);
		}));
		if let Some(ref cb) = *autosave_cb.borrow() {
			let _ = window.set_interval_with_callback_and_timeout_and_arguments_0(
				cb.as_ref().unchecked_ref(),
				autosave_ms as i32,
			);
		}

		let (editor_anim, animate_inner) = (editor_init.clone(), animate.clone());
		let (mut ctx, mut minimap_ctx) = (ctx, minimap_ctx);
		*animate.borrow_mut() = Some(Closure::new(move || {
			if let Ok(editor) = editor_anim.try_borrow() {
				render::render(&editor, &mut ctx);
				if let Some(mini) = minimap_ctx.as_mut().filter(|_| show_minimap) {
					minimap::render_minimap(&editor, mini);
				}
			}
			if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let (editor_act, seen_act) = (editor.clone(), seen.clone());
	Effect::new(move |_| {
		if pending.with(|queue| queue.is_empty()) {
			return;
		}
		let Ok(mut editor) = editor_act.try_borrow_mut() else {
			return;
		};
		drain_actions(&mut editor, pending, exchange, on_execute);
		sync_panel(&mut editor, panel, &seen_act);
	});

	let (editor_md, seen_md) = (editor.clone(), seen.clone());
	let on_mousedown = move |ev: MouseEvent| {
		let Some(input) = pointer_input(canvas_ref, &ev) else {
			return;
		};
		if input.button == PointerButton::Middle {
			ev.prevent_default();
		}
		let mut editor = editor_md.borrow_mut();
		editor.pointer_down(input);
		sync_panel(&mut editor, panel, &seen_md);
	};

	let editor_mm = editor.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some(input) = pointer_input(canvas_ref, &ev) {
			editor_mm.borrow_mut().pointer_move(input);
		}
	};

	let (editor_mu, seen_mu) = (editor.clone(), seen.clone());
	let on_mouseup = move |ev: MouseEvent| {
		let Some(input) = pointer_input(canvas_ref, &ev) else {
			return;
		};
		let mut editor = editor_mu.borrow_mut();
		editor.pointer_up(input);
		sync_panel(&mut editor, panel, &seen_mu);
	};

	let (editor_ml, seen_ml) = (editor.clone(), seen.clone());
	let on_mouseleave = move |_: MouseEvent| {
		let mut editor = editor_ml.borrow_mut();
		editor.pointer_leave();
		sync_panel(&mut editor, panel, &seen_ml);
	};

	let (editor_wh, seen_wh) = (editor.clone(), seen.clone());
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let mut editor = editor_wh.borrow_mut();
		editor.wheel(Point::new(ev.delta_x(), ev.delta_y()), mouse_modifiers(&ev));
		sync_panel(&mut editor, panel, &seen_wh);
	};

	let (editor_nav, seen_nav) = (editor.clone(), seen.clone());
	let on_minimap_down = move |ev: MouseEvent| {
		let Some(mini) = minimap_ref.get() else {
			return;
		};
		let mini: HtmlCanvasElement = mini.into();
		let mut editor = editor_nav.borrow_mut();
		minimap::navigate_to(&mut editor, relative_position(&mini, &ev));
		sync_panel(&mut editor, panel, &seen_nav);
	};

	let palette = registry
		.by_category()
		.into_iter()
		.map(|(category, entries)| {
			let buttons = entries
				.into_iter()
				.map(|t| palette_button(t, dispatch))
				.collect_view();
			view! {
				<section class="palette-group">
					<h3 style=format!("color: {};", category.color())>{category.label()}</h3>
					{buttons}
				</section>
			}
		})
		.collect_view();

	let catalogue = registry;
	let minimap_style = if show_minimap {
		"position: absolute; right: 12px; bottom: 36px; border: 1px solid #44475a; cursor: pointer;"
	} else {
		"display: none;"
	};

	view! {
		<div class="flow-editor" style="display: flex; width: 100%; height: 100%; background: #14142a; color: #e6e6f0; font-family: sans-serif;">
			<aside class="flow-editor-palette" style="width: 200px; overflow-y: auto; padding: 8px; border-right: 1px solid #2c2c44;">
				<h2>"Blocks"</h2>
				{palette}
			</aside>
			<div class="flow-editor-main" style="flex: 1; display: flex; flex-direction: column; min-width: 0;">
				<div class="flow-editor-toolbar" style="display: flex; gap: 6px; align-items: center; padding: 6px; border-bottom: 1px solid #2c2c44;">
					<input
						placeholder=move || panel.with(|p| p.flow_name.clone())
						prop:value=move || save_name.get()
						on:input=move |ev| save_name.set(event_target_value(&ev))
					/>
					<button on:click=move |_| dispatch.send(PanelAction::Save(save_name.get_untracked()))>
						"Save"
					</button>
					<button on:click=move |_| dispatch.send(PanelAction::NewFlow)>"New"</button>
					<button
						disabled=move || !panel.with(|p| p.can_undo)
						on:click=move |_| dispatch.send(PanelAction::Undo)
					>
						"Undo"
					</button>
					<button
						disabled=move || !panel.with(|p| p.can_redo)
						on:click=move |_| dispatch.send(PanelAction::Redo)
					>
						"Redo"
					</button>
					<button on:click=move |_| dispatch.send(PanelAction::Zoom(-1))>"-"</button>
					<span>{move || format!("{}%", panel.with(|p| p.zoom_percent))}</span>
					<button on:click=move |_| dispatch.send(PanelAction::Zoom(1))>"+"</button>
					<button on:click=move |_| dispatch.send(PanelAction::FitView)>"Fit"</button>
					<button on:click=move |_| dispatch.send(PanelAction::ResetView)>"1:1"</button>
					<button on:click=move |_| {
						quick_query.set(String::new());
						quick_open.set(true);
					}>"Quick add"</button>
					<span style="flex: 1;"></span>
					<button on:click=move |_| dispatch.send(PanelAction::Execute(ExecutionMode::Test))>
						"Test"
					</button>
					<button on:click=move |_| dispatch.send(PanelAction::Execute(ExecutionMode::Execute))>
						"Execute"
					</button>
				</div>
				<div class="flow-editor-stage" style="position: relative; flex: 1; min-height: 0; overflow: hidden;">
					<canvas
						node_ref=canvas_ref
						class="flow-editor-canvas"
						on:mousedown=on_mousedown
						on:mousemove=on_mousemove
						on:mouseup=on_mouseup
						on:mouseleave=on_mouseleave
						on:wheel=on_wheel
						on:contextmenu=|ev: MouseEvent| ev.prevent_default()
						style="display: block;"
					/>
					<canvas
						node_ref=minimap_ref
						class="flow-editor-minimap"
						on:mousedown=on_minimap_down
						style=minimap_style
					/>
					{move || {
						quick_open
							.get()
							.then(|| quick_add(catalogue.clone(), quick_query, quick_open, dispatch))
					}}
					<div class="flow-editor-status" style="position: absolute; left: 0; right: 0; bottom: 0; padding: 4px 8px; font-size: 12px; background: rgba(0, 0, 0, 0.5);">
						{move || {
							panel
								.with(|p| format!(
									"{} | {} blocks, {} connections",
									p.flow_name,
									p.block_count,
									p.connection_count,
								))
						}}
						{move || {
							panel
								.with(|p| p.notice.clone())
								.map(|notice| {
									view! {
										<span style=format!("margin-left: 12px; color: {};", notice_color(notice.level))>
											{notice.message}
										</span>
									}
								})
						}}
					</div>
				</div>
			</div>
			<aside class="flow-editor-sidebar" style="width: 260px; overflow-y: auto; padding: 8px; border-left: 1px solid #2c2c44;">
				<h2>"Inspector"</h2>
				{move || match panel.with(|p| p.inspector.clone()) {
					Some(inspector) => inspector_view(inspector, dispatch).into_any(),
					None => view! { <p>"Select a block to edit its settings."</p> }.into_any(),
				}}
				<h2>"Saved flows"</h2>
				<ul style="list-style: none; padding: 0;">
					{move || {
						panel
							.with(|p| p.flows.clone())
							.into_iter()
							.map(|row| saved_flow_row(row, dispatch))
							.collect_view()
					}}
				</ul>
				<h3>"Import / export"</h3>
				<textarea
					rows="6"
					style="width: 100%;"
					prop:value=move || exchange.get()
					on:input=move |ev| exchange.set(event_target_value(&ev))
				></textarea>
				<button on:click=move |_| dispatch.send(PanelAction::Import(exchange.get_untracked()))>
					"Import"
				</button>
			</aside>
		</div>
	}
}

fn notice_color(level: NoticeLevel) -> &'static str {
	match level {
		NoticeLevel::Info => "#81c784",
		NoticeLevel::Warning => "#ffb74d",
		NoticeLevel::Error => "#e57373",
	}
}

fn palette_button(block_type: &BlockType, dispatch: Dispatch) -> impl IntoView + use<> {
	let key = block_type.key.clone();
	view! {
		<button
			class="palette-item"
			title=block_type.description.clone()
			style="display: block; width: 100%; text-align: left; margin: 2px 0;"
			on:click=move |_| dispatch.send(PanelAction::AddBlock(key.clone()))
		>
			<span style=format!("color: {}; margin-right: 6px;", block_type.color)>
				{block_type.icon.clone()}
			</span>
			{block_type.name.clone()}
		</button>
	}
}

fn quick_add(
	catalogue: BlockTypeRegistry,
	query: RwSignal<String>,
	open: RwSignal<bool>,
	dispatch: Dispatch,
) -> impl IntoView {
	let first_match = catalogue.clone();
	let on_keydown = move |ev: KeyboardEvent| {
		if ev.key() != "Enter" {
			return;
		}
		if let Some(t) = first_match.search(&query.get_untracked()).first() {
			dispatch.send(PanelAction::AddBlock(t.key.clone()));
			open.set(false);
		}
	};
	view! {
		<div
			class="flow-editor-quick-add"
			style="position: absolute; top: 40px; left: 50%; transform: translateX(-50%); width: 320px; background: #24243a; border: 1px solid #44475a; padding: 8px;"
		>
			<input
				placeholder="Search blocks..."
				style="width: 100%;"
				autofocus=true
				prop:value=move || query.get()
				on:input=move |ev| query.set(event_target_value(&ev))
				on:keydown=on_keydown
			/>
			<ul style="list-style: none; padding: 0; margin: 6px 0 0 0;">
				{move || {
					catalogue
						.search(&query.get())
						.into_iter()
						.map(|t| {
							let key = t.key.clone();
							view! {
								<li>
									<button
										style="width: 100%; text-align: left;"
										on:click=move |_| {
											dispatch.send(PanelAction::AddBlock(key.clone()));
											open.set(false);
										}
									>
										{format!("{} {} ({})", t.icon, t.name, t.category.label())}
									</button>
								</li>
							}
						})
						.collect_view()
				}}
			</ul>
		</div>
	}
}

fn inspector_view(inspector: Inspector, dispatch: Dispatch) -> impl IntoView {
	let block = inspector.block;
	let fields = inspector
		.fields
		.into_iter()
		.map(|(key, value)| {
			let label = key.clone();
			let input = match value {
				ConfigValue::Bool(checked) => view! {
					<input
						type="checkbox"
						prop:checked=checked
						on:change=move |ev| {
							dispatch.send(PanelAction::SetConfig(
								block,
								key.clone(),
								ConfigValue::Bool(event_target_checked(&ev)),
							))
						}
					/>
				}
				.into_any(),
				ConfigValue::Number(n) => view! {
					<input
						type="number"
						prop:value=n.to_string()
						on:change=move |ev| {
							if let Ok(n) = event_target_value(&ev).parse::<f64>() {
								dispatch.send(PanelAction::SetConfig(block, key.clone(), ConfigValue::Number(n)));
							}
						}
					/>
				}
				.into_any(),
				ConfigValue::Text(text) => view! {
					<input
						type="text"
						prop:value=text
						on:change=move |ev| {
							dispatch.send(PanelAction::SetConfig(
								block,
								key.clone(),
								ConfigValue::Text(event_target_value(&ev)),
							))
						}
					/>
				}
				.into_any(),
			};
			view! {
				<label style="display: block; margin: 4px 0;">
					<span style="display: inline-block; width: 100px;">{label}</span>
					{input}
				</label>
			}
		})
		.collect_view();
	view! {
		<div class="flow-editor-inspector">
			<h3>{format!("{} ({})", inspector.title, block)}</h3>
			{fields}
		</div>
	}
}

fn saved_flow_row(row: SavedFlowRow, dispatch: Dispatch) -> impl IntoView {
	let (load_id, export_id, delete_id) = (row.id.clone(), row.id.clone(), row.id);
	view! {
		<li style="margin: 4px 0;">
			<span>{format!("{} ({} blocks)", row.name, row.blocks)}</span>
			<button on:click=move |_| dispatch.send(PanelAction::Load(load_id.clone()))>"Load"</button>
			<button on:click=move |_| dispatch.send(PanelAction::Export(export_id.clone()))>
				"Export"
			</button>
			<button on:click=move |_| dispatch.send(PanelAction::DeleteSaved(delete_id.clone()))>
				"Delete"
			</button>
		</li>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn editor() -> FlowEditor {
		FlowEditor::new(
			BlockTypeRegistry::builtin(),
			FlowStore::new(Box::new(MemorySink::new())),
			EditorConfig::default(),
		)
	}

	#[test]
	fn queued_actions_all_apply_in_order() {
		let pending = RwSignal::new(Vec::new());
		let exchange = RwSignal::new(String::new());
		let dispatch = Dispatch(pending);
		dispatch.send(PanelAction::AddBlock("textInput".to_string()));
		dispatch.send(PanelAction::AddBlock("textOutput".to_string()));
		dispatch.send(PanelAction::Undo);

		let mut editor = editor();
		drain_actions(&mut editor, pending, exchange, None);

		let keys: Vec<_> = editor.graph().blocks().iter().map(|b| b.type_key.as_str()).collect();
		assert_eq!(keys, ["textInput"]);
		assert!(editor.history().can_redo());
		assert!(pending.with_untracked(|queue| queue.is_empty()));
	}

	#[test]
	fn panel_mirrors_selected_block() {
		let panel = RwSignal::new(PanelState::default());
		let seen = Cell::new(u64::MAX);
		let mut editor = editor();
		let id = editor.add_block("httpRequest", Point::ZERO).unwrap();
		sync_panel(&mut editor, panel, &seen);

		let state = panel.get_untracked();
		assert_eq!(state.block_count, 1);
		assert!(state.can_undo);
		let inspector = state.inspector.unwrap();
		assert_eq!(inspector.block, id);
		assert!(!inspector.fields.is_empty());
	}
}
