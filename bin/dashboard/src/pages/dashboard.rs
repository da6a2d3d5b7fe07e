//! Dashboard page: headline stats, recent runs, the workflow list and the
//! scheduler controls.

mod scheduler_panel;

use crate::app::use_app;
use crate::browser;
use crate::components::{ErrorBanner, StatCard, StatusBadge, format_timestamp};
use flowforge_client::ClientError;
use flowforge_core::WorkflowId;
use flowforge_store::{DEFAULT_PAGE_SIZE, WorkflowState, WorkflowStore};
use flowforge_workflow::{RunFilter, RunStatus, SystemStats};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::A;
use leptos_router::hooks::use_navigate;
use scheduler_panel::SchedulerPanel;
use serde_json::json;

/// How many recent runs the dashboard lists.
const RECENT_RUNS: u32 = 10;

/// Total workflow count, preferring the server's figure over the page length.
fn workflow_count(state: &WorkflowState) -> usize {
    usize::try_from(state.pagination.total)
        .ok()
        .filter(|total| *total > 0)
        .unwrap_or(state.workflows.len())
}

fn stats(state: &WorkflowState) -> SystemStats {
    let metrics = state.metrics.clone().unwrap_or_default();
    SystemStats::from_metrics(workflow_count(state), &metrics)
}

/// Adds `id` to the selection or takes it out.
fn toggle(selection: &mut Vec<WorkflowId>, id: WorkflowId) {
    if let Some(index) = selection.iter().position(|s| *s == id) {
        selection.remove(index);
    } else {
        selection.push(id);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Overview,
    Scheduler,
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let app = use_app();
    let state = app.workflows;
    let (active_tab, set_active_tab) = signal(Tab::Overview);

    let store = app.stores.workflows.clone();
    let load = move |page: u32| {
        let store = store.clone();
        spawn_local(async move {
            let (workflows, runs, metrics) = load_lists(&store, page).await;
            for (what, result) in [("workflows", workflows), ("runs", runs), ("metrics", metrics)] {
                if let Err(e) = result {
                    tracing::warn!(what, error = %e, "dashboard load failed");
                }
            }
        });
    };
    load(1);

    let stores = app.stores.clone();

    view! {
        <div class="dashboard-page">
            <header class="page-header">
                <h1>"Dashboard"</h1>
                <A href="/workflow/new" attr:class="primary-btn">"New Workflow"</A>
            </header>

            <ErrorBanner
                message=Signal::derive(move || state.get().error)
                on_dismiss=move || stores.workflows.clear_error()
            />

            <div class="stat-grid">
                <StatCard
                    label="Total Workflows"
                    value=Signal::derive(move || stats(&state.get()).total_workflows.to_string())
                />
                <StatCard
                    label="Total Runs"
                    value=Signal::derive(move || stats(&state.get()).total_runs.to_string())
                />
                <StatCard
                    label="Success Rate"
                    value=Signal::derive(move || format!("{:.1}%", stats(&state.get()).success_rate))
                />
                <StatCard
                    label="Avg Task Duration"
                    value=Signal::derive(move || format!("{:.0}ms", stats(&state.get()).avg_task_duration))
                />
            </div>

            <div class="editor-tabs">
                <button
                    class=move || if active_tab.get() == Tab::Overview { "tab active" } else { "tab" }
                    on:click=move |_| set_active_tab.set(Tab::Overview)
                >"Overview"</button>
                <button
                    class=move || if active_tab.get() == Tab::Scheduler { "tab active" } else { "tab" }
                    on:click=move |_| set_active_tab.set(Tab::Scheduler)
                >"Scheduler"</button>
            </div>

            {move || match active_tab.get() {
                Tab::Overview => {
                    let load = load.clone();
                    view! {
                        <RecentRuns/>
                        <WorkflowList on_page=move |page| load(page)/>
                    }
                    .into_any()
                }
                Tab::Scheduler => view! { <SchedulerPanel/> }.into_any(),
            }}
        </div>
    }
}

/// Loads every list the dashboard shows, returning each outcome.
async fn load_lists(
    store: &WorkflowStore,
    page: u32,
) -> (
    Result<(), ClientError>,
    Result<(), ClientError>,
    Result<(), ClientError>,
) {
    let workflows = store.fetch_workflows(page, DEFAULT_PAGE_SIZE).await;
    let runs = store.fetch_runs(None, 1, RECENT_RUNS).await;
    let metrics = store.fetch_metrics().await;
    (workflows, runs, metrics)
}

#[component]
fn RecentRuns() -> impl IntoView {
    let app = use_app();
    let state = app.workflows;
    let filter = RwSignal::new(RunFilter::default());

    let workflow_names = move || {
        let mut names: Vec<String> = state.get().workflows.into_iter().map(|w| w.name).collect();
        names.sort();
        names.dedup();
        names
    };

    view! {
        <section class="card">
            <div class="card-header">
                <h2>"Recent Runs"</h2>
                <div class="filters">
                    <input
                        type="search"
                        placeholder="Search by Run ID..."
                        prop:value=move || filter.get().search
                        on:input=move |ev| filter.update(|f| f.search = event_target_value(&ev))
                    />
                    <select on:change=move |ev| {
                        let value = event_target_value(&ev);
                        filter.update(|f| f.workflow = (value != "all").then_some(value));
                    }>
                        <option value="all">"All Workflows"</option>
                        {move || workflow_names().into_iter().map(|name| {
                            view! { <option value=name.clone()>{name.clone()}</option> }
                        }).collect_view()}
                    </select>
                    <select on:change=move |ev| {
                        let value = event_target_value(&ev);
                        filter.update(|f| f.status = RunStatus::from_filter(&value));
                    }>
                        <option value="all">"All Status"</option>
                        {RunStatus::ALL.into_iter().map(|status| view! {
                            <option value=status.as_str()>{status.label()}</option>
                        }).collect_view()}
                    </select>
                </div>
            </div>
            {move || {
                let runs = state.get().runs;
                let current = filter.get();
                let visible = current.apply(&runs);
                if visible.is_empty() {
                    return view! { <p class="empty">"No runs match the current filters."</p> }.into_any();
                }
                view! {
                    <table class="data-table">
                        <thead>
                            <tr>
                                <th>"Run ID"</th>
                                <th>"Workflow"</th>
                                <th>"Status"</th>
                                <th>"Started"</th>
                                <th>"Duration"</th>
                            </tr>
                        </thead>
                        <tbody>
                            {visible.into_iter().cloned().map(|run| {
                                let href = format!("/runs/{}", run.id);
                                let id = run.id.to_string();
                                view! {
                                    <tr>
                                        <td class="mono"><A href=href>{id}</A></td>
                                        <td>{run.workflow_name().unwrap_or("-").to_string()}</td>
                                        <td><StatusBadge status=run.status/></td>
                                        <td>{format_timestamp(run.started_at)}</td>
                                        <td>{run.duration_label()}</td>
                                    </tr>
                                }
                            }).collect_view()}
                        </tbody>
                    </table>
                }
                .into_any()
            }}
        </section>
    }
}

#[component]
fn WorkflowList(on_page: impl Fn(u32) + Clone + Send + Sync + 'static) -> impl IntoView {
    let app = use_app();
    let state = app.workflows;
    let navigate = use_navigate();
    let selected = RwSignal::new(Vec::<WorkflowId>::new());
    let (deleting, set_deleting) = signal(false);

    let stores = app.stores.clone();
    let on_bulk_delete = move |_| {
        let ids = selected.get();
        if ids.is_empty()
            || !browser::confirm(&format!("Delete {} workflow(s)? Their runs are removed too.", ids.len()))
        {
            return;
        }
        let store = stores.workflows.clone();
        set_deleting.set(true);
        spawn_local(async move {
            match store.delete_workflows(ids).await {
                Ok(()) => selected.set(Vec::new()),
                Err(e) => tracing::warn!(error = %e, "bulk delete failed"),
            }
            set_deleting.set(false);
        });
    };

    let on_select_all = move |_| {
        let all: Vec<WorkflowId> = state.get().workflows.into_iter().map(|w| w.id).collect();
        selected.update(|s| {
            if s.len() == all.len() {
                s.clear();
            } else {
                *s = all;
            }
        });
    };

    let stores = app.stores.clone();
    let run_workflow = move |id: WorkflowId| {
        let store = stores.workflows.clone();
        let navigate = navigate.clone();
        spawn_local(async move {
            match store.trigger_run(&id, json!({})).await {
                Ok(run) => navigate(&format!("/runs/{}", run.id), Default::default()),
                Err(e) => tracing::warn!(workflow_id = %id, error = %e, "trigger failed"),
            }
        });
    };

    let stores = app.stores.clone();
    let delete_workflow = move |id: WorkflowId, name: String| {
        if !browser::confirm(&format!("Delete workflow \"{name}\"?")) {
            return;
        }
        let store = stores.workflows.clone();
        spawn_local(async move {
            if let Err(e) = store.delete_workflow(&id).await {
                tracing::warn!(workflow_id = %id, error = %e, "delete failed");
            }
            selected.update(|s| s.retain(|s| *s != id));
        });
    };

    let on_prev = {
        let on_page = on_page.clone();
        move |_| {
            let page = state.get().pagination.page;
            if page > 1 {
                on_page(page - 1);
            }
        }
    };
    let on_next = move |_| {
        let pagination = state.get().pagination;
        if pagination.page < pagination.pages {
            on_page(pagination.page + 1);
        }
    };

    view! {
        <section class="card">
            <div class="card-header">
                <h2>"Workflows"</h2>
                {move || (!selected.get().is_empty()).then(|| {
                    let on_bulk_delete = on_bulk_delete.clone();
                    view! {
                        <button
                            class="danger-btn"
                            disabled=move || deleting.get()
                            on:click=on_bulk_delete
                        >
                            {move || if deleting.get() {
                                "Deleting...".to_string()
                            } else {
                                format!("Delete Selected ({})", selected.get().len())
                            }}
                        </button>
                    }
                })}
            </div>
            {move || {
                let current = state.get();
                if current.workflows.is_empty() {
                    return view! {
                        <div class="empty">
                            <p>"No workflows yet."</p>
                            <A href="/workflow/new">"Create your first workflow"</A>
                        </div>
                    }
                    .into_any();
                }
                let all_selected = selected.get().len() == current.workflows.len();
                let run_workflow = run_workflow.clone();
                let delete_workflow = delete_workflow.clone();
                view! {
                    <table class="data-table">
                        <thead>
                            <tr>
                                <th>
                                    <input type="checkbox" prop:checked=all_selected on:change=on_select_all/>
                                </th>
                                <th>"Name"</th>
                                <th>"Nodes"</th>
                                <th>"Version"</th>
                                <th>"Updated"</th>
                                <th>"Actions"</th>
                            </tr>
                        </thead>
                        <tbody>
                            {current.workflows.into_iter().map(|workflow| {
                                let id = workflow.id.clone();
                                let is_selected = selected.get().contains(&id);
                                let toggle_id = id.clone();
                                let run_id = id.clone();
                                let delete_id = id.clone();
                                let delete_name = workflow.name.clone();
                                let run_workflow = run_workflow.clone();
                                let delete_workflow = delete_workflow.clone();
                                view! {
                                    <tr>
                                        <td>
                                            <input
                                                type="checkbox"
                                                prop:checked=is_selected
                                                on:change=move |_| selected.update(|s| toggle(s, toggle_id.clone()))
                                            />
                                        </td>
                                        <td>
                                            <div class="workflow-name">{workflow.name.clone()}</div>
                                            <div class="muted">{workflow.description.clone().unwrap_or_default()}</div>
                                        </td>
                                        <td>{workflow.nodes.len()}</td>
                                        <td>{format!("v{}", workflow.version)}</td>
                                        <td>{format_timestamp(workflow.updated_at)}</td>
                                        <td class="actions">
                                            <button class="primary-btn small" on:click=move |_| run_workflow(run_id.clone())>"Run"</button>
                                            <A href=format!("/workflow/{id}") attr:class="secondary-btn small">"Edit"</A>
                                            <button
                                                class="danger-btn small"
                                                on:click=move |_| delete_workflow(delete_id.clone(), delete_name.clone())
                                            >"Delete"</button>
                                        </td>
                                    </tr>
                                }
                            }).collect_view()}
                        </tbody>
                    </table>
                }
                .into_any()
            }}
            <div class="pagination">
                <button class="secondary-btn small" on:click=on_prev>"Previous"</button>
                <span>{move || {
                    let pagination = state.get().pagination;
                    format!("Page {} of {}", pagination.page.max(1), pagination.pages.max(1))
                }}</span>
                <button class="secondary-btn small" on:click=on_next>"Next"</button>
            </div>
        </section>
    }
}
