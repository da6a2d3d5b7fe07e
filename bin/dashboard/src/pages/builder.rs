//! Workflow builder page.
//!
//! Serves both `/workflow/new` and `/workflow/:id`. A new workflow starts
//! from the starter graph with the template gallery open; an existing one is
//! fetched and loaded into the editor. Saving creates or updates through the
//! workflow store.

pub(crate) mod canvas;
mod config_panel;
mod template_picker;

use crate::app::use_app;
use crate::browser;
use crate::components::ErrorBanner;
use canvas::NodeCanvas;
use config_panel::NodeConfigPanel;
use flowforge_core::{NodeId, WorkflowId};
use flowforge_workflow::{GraphEditor, NodeType, WorkflowError};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::A;
use leptos_router::hooks::{use_navigate, use_params_map};
use template_picker::TemplatePicker;

const DEFAULT_NAME: &str = "New Workflow";

fn new_workflow() -> GraphEditor {
    let mut editor = GraphEditor::starter();
    editor.name = DEFAULT_NAME.to_string();
    editor
}

/// Replaces the editor contents with a pasted export, reporting failures.
fn import_into(editor: &mut GraphEditor, text: &str) -> Result<(), String> {
    if text.trim().is_empty() {
        return Err("Paste an exported workflow first".to_string());
    }
    editor.import(text).map_err(|e| match e {
        WorkflowError::Import { reason } => format!("Not a workflow export: {reason}"),
        other => other.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Ready,
    Loading,
    NotFound,
}

#[component]
pub fn BuilderPage() -> impl IntoView {
    let app = use_app();
    let params = use_params_map();
    let workflow_id = Memo::new(move |_| params.with(|p| p.get("id")).map(WorkflowId::from));

    let editor = RwSignal::new(new_workflow());
    let connecting_from = RwSignal::new(Option::<NodeId>::None);
    let show_templates = RwSignal::new(workflow_id.get_untracked().is_none());
    let import_open = RwSignal::new(false);
    let import_text = RwSignal::new(String::new());
    let page_error = RwSignal::new(Option::<String>::None);
    let load_state = RwSignal::new(LoadState::Ready);

    let store = app.stores.workflows.clone();
    Effect::new(move |_| {
        let Some(id) = workflow_id.get() else {
            return;
        };
        let store = store.clone();
        load_state.set(LoadState::Loading);
        spawn_local(async move {
            match store.fetch_workflow(&id).await {
                Ok(definition) => {
                    editor.set(GraphEditor::from_definition(&definition));
                    load_state.set(LoadState::Ready);
                }
                Err(e) if e.is_not_found() => load_state.set(LoadState::NotFound),
                Err(e) => {
                    tracing::warn!(workflow_id = %id, error = %e, "failed to load workflow");
                    load_state.set(LoadState::Ready);
                }
            }
        });
    });

    let store = app.stores.workflows.clone();
    let navigate = use_navigate();
    let on_save = move |_| {
        let snapshot = editor.get_untracked();
        if !snapshot.has_name() {
            page_error.set(Some("Please enter a workflow name".to_string()));
            return;
        }
        let mut started = false;
        editor.update(|e| started = e.begin_save());
        if !started {
            return;
        }
        page_error.set(None);

        let store = store.clone();
        let navigate = navigate.clone();
        let existing = workflow_id.get_untracked();
        spawn_local(async move {
            let result = match &existing {
                Some(id) => store.update_workflow(id, &snapshot.update()).await,
                None => store.create_workflow(&snapshot.draft()).await,
            };
            editor.update(GraphEditor::finish_save);
            match result {
                Ok(saved) if existing.is_none() => {
                    navigate(&format!("/workflow/{}", saved.id), Default::default());
                }
                Ok(saved) => tracing::info!(workflow_id = %saved.id, version = saved.version, "workflow saved"),
                Err(e) => tracing::warn!(error = %e, "failed to save workflow"),
            }
        });
    };

    let on_export = move |_| {
        let export = editor.with_untracked(GraphEditor::export);
        match export.to_json_pretty() {
            Ok(json) => browser::download_json(&export.file_name(), &json),
            Err(e) => page_error.set(Some(format!("Export failed: {e}"))),
        }
    };

    let on_import = move |_| {
        let text = import_text.get_untracked();
        let mut outcome = Ok(());
        editor.update(|e| outcome = import_into(e, &text));
        match outcome {
            Ok(()) => {
                page_error.set(None);
                import_text.set(String::new());
                import_open.set(false);
                connecting_from.set(None);
            }
            Err(message) => page_error.set(Some(message)),
        }
    };

    let stores = app.stores.clone();
    let state = app.workflows;

    view! {
        <div class="workflow-editor-page">
            <header class="editor-header">
                <A href="/" attr:class="back-link">"← Back to Dashboard"</A>
                <h1>{move || if workflow_id.get().is_some() { "Edit Workflow" } else { "Create Workflow" }}</h1>
                <div class="header-actions">
                    <button class="secondary-btn" on:click=move |_| show_templates.update(|open| *open = !*open)>
                        "Templates"
                    </button>
                    <button class="secondary-btn" on:click=move |_| import_open.update(|open| *open = !*open)>
                        "Import"
                    </button>
                    <button class="secondary-btn" on:click=on_export>"Export"</button>
                    <button
                        class="save-btn primary-btn"
                        on:click=on_save
                        disabled=move || editor.with(GraphEditor::is_saving)
                    >
                        {move || if editor.with(GraphEditor::is_saving) { "Saving..." } else { "Save Workflow" }}
                    </button>
                </div>
            </header>

            <ErrorBanner
                message=Signal::derive(move || page_error.get().or_else(|| state.get().error))
                on_dismiss=move || {
                    page_error.set(None);
                    stores.workflows.clear_error();
                }
            />

            {move || match load_state.get() {
                LoadState::Loading => view! { <p>"Loading workflow..."</p> }.into_any(),
                LoadState::NotFound => view! {
                    <div class="not-found">
                        <h1>"Workflow Not Found"</h1>
                        <p>"The workflow you're looking for doesn't exist."</p>
                        <A href="/">"Back to Dashboard"</A>
                    </div>
                }
                .into_any(),
                LoadState::Ready => view! {
                    <WorkflowDetails editor=editor/>

                    {move || import_open.get().then(|| view! {
                        <div class="import-box">
                            <label for="import-json">"Paste an exported workflow"</label>
                            <textarea
                                id="import-json"
                                class="mono"
                                rows="8"
                                prop:value=move || import_text.get()
                                on:input=move |ev| import_text.set(event_target_value(&ev))
                            ></textarea>
                            <div class="button-row">
                                <button class="primary-btn" on:click=on_import>"Load"</button>
                                <button class="link-btn" on:click=move |_| import_open.set(false)>"Cancel"</button>
                            </div>
                        </div>
                    })}

                    {move || show_templates.get().then(|| view! {
                        <TemplatePicker
                            on_select=move |template| {
                                editor.update(|e| e.load_template(template));
                                connecting_from.set(None);
                                show_templates.set(false);
                            }
                            on_skip=move || show_templates.set(false)
                        />
                    })}

                    <div class="editor-content">
                        <div class="node-toolbar">
                            <span class="toolbar-label">"Add Node:"</span>
                            {NodeType::ALL.into_iter().map(|node_type| view! {
                                <button
                                    class=format!("toolbar-btn {}", node_type.as_str())
                                    on:click=move |_| editor.update(|e| {
                                        let id = e.add_node(node_type);
                                        e.select(Some(id));
                                    })
                                >
                                    {node_type.default_name()}
                                </button>
                            }).collect_view()}
                            <span class="toolbar-spacer"></span>
                            {move || connecting_from.get().map(|_| view! {
                                <span class="connecting-hint">"Click a node to connect, or "</span>
                                <button class="cancel-btn" on:click=move |_| connecting_from.set(None)>"Cancel"</button>
                            })}
                        </div>

                        <div class="editor-layout">
                            <NodeCanvas editor=editor connecting_from=connecting_from/>
                            <NodeConfigPanel editor=editor/>
                        </div>

                        <InspectionNotes editor=editor/>
                    </div>
                }
                .into_any(),
            }}
        </div>
    }
}

#[component]
fn WorkflowDetails(editor: RwSignal<GraphEditor>) -> impl IntoView {
    view! {
        <div class="settings-content">
            <div class="form-group">
                <label for="workflow-name">"Workflow Name"</label>
                <input
                    id="workflow-name"
                    type="text"
                    prop:value=move || editor.with(|e| e.name.clone())
                    on:input=move |ev| editor.update(|e| e.name = event_target_value(&ev))
                />
            </div>
            <div class="form-group">
                <label for="workflow-description">"Description"</label>
                <textarea
                    id="workflow-description"
                    rows="2"
                    prop:value=move || editor.with(|e| e.description.clone())
                    on:input=move |ev| editor.update(|e| e.description = event_target_value(&ev))
                ></textarea>
            </div>
        </div>
    }
}

/// Structural observations about the graph. Informational only.
#[component]
fn InspectionNotes(editor: RwSignal<GraphEditor>) -> impl IntoView {
    move || {
        let notes = editor.with(|e| e.inspect().notes());
        (!notes.is_empty()).then(|| view! {
            <ul class="inspection-notes">
                {notes.into_iter().map(|note| view! { <li>{note}</li> }).collect_view()}
            </ul>
        })
    }
}
