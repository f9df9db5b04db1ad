use leptos::prelude::*;
use log::info;

use crate::components::flow_editor::{ExecutionMode, ExecutionRequest, FlowEditorCanvas};

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	// No executor is bundled; requests are only logged.
	let on_execute = Callback::new(|request: ExecutionRequest| {
		let verb = match request.mode {
			ExecutionMode::Execute => "Execute",
			ExecutionMode::Test => "Test",
		};
		info!(
			"{} requested: {} blocks, {} connections",
			verb,
			request.graph.blocks.len(),
			request.graph.connections.len()
		);
	});

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			<div class="fullscreen-editor" style="position: fixed; inset: 0;">
				<FlowEditorCanvas on_execute=on_execute />
			</div>
		</ErrorBoundary>
	}
}
