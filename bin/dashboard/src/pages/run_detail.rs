//! Run detail page: one run's tasks as a graph, log, table and metrics.
//!
//! The page re-fetches the run every [`POLL_INTERVAL`] while it is RUNNING.

use crate::app::use_app;
use crate::components::{ErrorBanner, StatCard, StatusBadge, format_timestamp, status_class};
use crate::pages::builder::canvas::{NODE_HEIGHT, NODE_WIDTH, edge_path, view_box};
use chrono::Utc;
use flowforge_core::{NodeId, RunId};
use flowforge_store::RunDetailState;
use flowforge_workflow::execution::{activity_log, task_graph};
use flowforge_workflow::{POLL_INTERVAL, RunMetrics, RunStatus, Task};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::A;
use leptos_router::hooks::{use_navigate, use_params_map};

/// First eight characters of an id, for compact headings.
fn short_id(id: &str) -> String {
    let short: String = id.chars().take(8).collect();
    if short.len() < id.len() {
        format!("{short}...")
    } else {
        short
    }
}

/// Task duration in milliseconds, or `Running...` until it completes.
fn task_duration(task: &Task) -> String {
    task.duration_ms()
        .map_or_else(|| "Running...".to_string(), |ms| format!("{ms}ms"))
}

fn metrics_now(state: &RunDetailState) -> Option<RunMetrics> {
    state.metrics(Utc::now())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Logs,
    Tasks,
    Metrics,
}

impl Tab {
    const ALL: [Self; 3] = [Self::Logs, Self::Tasks, Self::Metrics];

    const fn label(self) -> &'static str {
        match self {
            Self::Logs => "Logs",
            Self::Tasks => "Tasks",
            Self::Metrics => "Metrics",
        }
    }
}

#[component]
pub fn RunDetailPage() -> impl IntoView {
    let app = use_app();
    let state = app.run_detail;
    let params = use_params_map();
    let run_id = Memo::new(move |_| params.with(|p| p.get("id")).map(RunId::from));
    let (active_tab, set_active_tab) = signal(Tab::Logs);
    let has_run = Memo::new(move |_| state.with(|s| s.run.is_some()));

    let store = app.stores.run_detail.clone();
    Effect::new(move |_| {
        let Some(id) = run_id.get() else {
            return;
        };
        let store = store.clone();
        spawn_local(async move {
            if let Err(e) = store.open(id).await {
                tracing::debug!(error = %e, "initial run load failed");
            }
        });
    });

    let store = app.stores.run_detail.clone();
    match set_interval_with_handle(
        move || {
            if !store.should_poll() {
                return;
            }
            let store = store.clone();
            spawn_local(async move {
                if let Err(e) = store.refresh().await {
                    tracing::debug!(error = %e, "poll failed");
                }
            });
        },
        POLL_INTERVAL,
    ) {
        Ok(handle) => on_cleanup(move || handle.clear()),
        Err(e) => tracing::error!(error = ?e, "could not start run polling"),
    }

    let store = app.stores.run_detail.clone();
    let on_refresh = move |_| {
        let store = store.clone();
        spawn_local(async move {
            if let Err(e) = store.refresh().await {
                tracing::warn!(error = %e, "refresh failed");
            }
        });
    };

    let store = app.stores.run_detail.clone();
    let on_cancel = move |_| {
        let store = store.clone();
        spawn_local(async move {
            if let Err(e) = store.cancel().await {
                tracing::warn!(error = %e, "cancel failed");
            }
        });
    };

    let store = app.stores.run_detail.clone();
    let navigate = use_navigate();
    let on_rerun = move |_| {
        let store = store.clone();
        let navigate = navigate.clone();
        spawn_local(async move {
            match store.rerun().await {
                Ok(Some(run)) => navigate(&format!("/runs/{}", run.id), Default::default()),
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "rerun failed"),
            }
        });
    };

    let stores = app.stores.clone();

    view! {
        <div class="run-detail-page">
            <ErrorBanner
                message=Signal::derive(move || state.get().error)
                on_dismiss=move || stores.run_detail.clear_error()
            />
            {move || {
                let current = state.get();
                if current.not_found {
                    return view! {
                        <div class="not-found">
                            <h1>"Run not found"</h1>
                            <A href="/">"Back to Dashboard"</A>
                        </div>
                    }
                    .into_any();
                }
                let Some(run) = current.run.clone() else {
                    return view! { <p>"Loading run details..."</p> }.into_any();
                };
                let successful = current.tasks.iter().filter(|t| t.status == RunStatus::Success).count();
                let on_refresh = on_refresh.clone();
                let on_cancel = on_cancel.clone();
                let on_rerun = on_rerun.clone();
                view! {
                    <header class="editor-header">
                        <A href="/" attr:class="back-link">"← Back to Dashboard"</A>
                        <div>
                            <h1>"Run Details"</h1>
                            <p class="muted">
                                {format!("{} • {}", short_id(run.id.as_str()), run.workflow_name().unwrap_or("-"))}
                            </p>
                        </div>
                        <div class="header-actions">
                            <StatusBadge status=run.status/>
                            <button class="secondary-btn" disabled=current.loading on:click=on_refresh>
                                "Refresh"
                            </button>
                            {(!run.status.is_terminal()).then(|| view! {
                                <button class="secondary-btn" on:click=on_cancel>"Cancel"</button>
                            })}
                            <button class="primary-btn" on:click=on_rerun>"Retry"</button>
                        </div>
                    </header>

                    <div class="stat-grid">
                        <StatCard label="Started At" value=format_timestamp(run.started_at)/>
                        <StatCard label="Duration" value=run.duration_label()/>
                        <StatCard
                            label="Tasks"
                            value=format!("{} ({successful} successful)", current.tasks.len())
                        />
                    </div>
                }
                .into_any()
            }}

            {move || has_run.get().then(|| view! {
                <section class="card">
                    <h2>"Workflow Execution"</h2>
                    <TaskGraph/>
                </section>

                <div class="editor-tabs">
                    {Tab::ALL.into_iter().map(|tab| view! {
                        <button
                            class=move || if active_tab.get() == tab { "tab active" } else { "tab" }
                            on:click=move |_| set_active_tab.set(tab)
                        >{tab.label()}</button>
                    }).collect_view()}
                </div>

                {move || match active_tab.get() {
                    Tab::Logs => view! { <ActivityLog/> }.into_any(),
                    Tab::Tasks => view! { <TaskTable/> }.into_any(),
                    Tab::Metrics => view! { <MetricsPanel/> }.into_any(),
                }}
            })}
        </div>
    }
}

#[component]
fn TaskGraph() -> impl IntoView {
    let state = use_app().run_detail;
    move || {
        let (nodes, edges) = state.with(|s| task_graph(&s.tasks));
        if nodes.is_empty() {
            return view! { <p class="empty">"No tasks have been scheduled yet."</p> }.into_any();
        }
        let position_of = |id: &NodeId| nodes.iter().find(|n| &n.node_id == id).map(|n| n.position);
        let paths: Vec<String> = edges
            .iter()
            .filter_map(|e| Some(edge_path(position_of(&e.source)?, position_of(&e.target)?)))
            .collect();
        view! {
            <svg class="node-canvas-svg run-graph" viewBox=view_box(nodes.iter().map(|n| n.position))>
                <defs>
                    <marker id="run-arrowhead" markerWidth="10" markerHeight="7" refX="9" refY="3.5" orient="auto">
                        <polygon points="0 0, 10 3.5, 0 7" fill="#666"/>
                    </marker>
                </defs>
                {paths.into_iter().map(|d| view! {
                    <path class="edge-path" d=d fill="none" stroke="#666" stroke-width="2" marker-end="url(#run-arrowhead)"/>
                }).collect_view()}
                {nodes.clone().into_iter().map(|node| {
                    let title = format!("{} ({})", node.label, node.task_id);
                    let detail = node
                        .error
                        .clone()
                        .or_else(|| node.duration_ms.map(|ms| format!("{ms}ms")))
                        .unwrap_or_else(|| node.status.label().to_string());
                    view! {
                        <g
                            class=format!("workflow-node task-node {}", status_class(node.status))
                            transform=format!("translate({}, {})", node.position.x, node.position.y)
                        >
                            <title>{title}</title>
                            <rect class="node-bg" width=NODE_WIDTH height=NODE_HEIGHT rx="6" ry="6"/>
                            <text class="node-label" x=NODE_WIDTH / 2.0 y="28" text-anchor="middle">{node.label}</text>
                            <text class="node-type-text" x=NODE_WIDTH / 2.0 y="45" text-anchor="middle">{detail}</text>
                        </g>
                    }
                }).collect_view()}
            </svg>
        }
        .into_any()
    }
}

#[component]
fn ActivityLog() -> impl IntoView {
    let state = use_app().run_detail;
    view! {
        <section class="card">
            <h2>"Execution Logs"</h2>
            <div class="log-view mono">
                {move || {
                    let lines = state.with(|s| activity_log(&s.tasks));
                    if lines.is_empty() {
                        return view! { <p class="muted">"No activity yet."</p> }.into_any();
                    }
                    lines
                        .into_iter()
                        .map(|line| view! { <div class="log-line">{line}</div> })
                        .collect_view()
                        .into_any()
                }}
            </div>
        </section>
    }
}

#[component]
fn TaskTable() -> impl IntoView {
    let state = use_app().run_detail;
    view! {
        <section class="card">
            <h2>"Task Details"</h2>
            <table class="data-table">
                <thead>
                    <tr>
                        <th>"Task ID"</th>
                        <th>"Node"</th>
                        <th>"Status"</th>
                        <th>"Attempts"</th>
                        <th>"Duration"</th>
                        <th>"Error"</th>
                    </tr>
                </thead>
                <tbody>
                    {move || state.with(|s| {
                        s.tasks.iter().map(|task| view! {
                            <tr>
                                <td class="mono">{short_id(task.id.as_str())}</td>
                                <td>{task.label().to_string()}</td>
                                <td><StatusBadge status=task.status/></td>
                                <td>{task.retry_count + 1}</td>
                                <td>{task_duration(task)}</td>
                                <td class="truncate">{task.error.clone().unwrap_or_else(|| "-".to_string())}</td>
                            </tr>
                        }).collect_view()
                    })}
                </tbody>
            </table>
        </section>
    }
}

#[component]
fn MetricsPanel() -> impl IntoView {
    let state = use_app().run_detail;
    move || {
        let Some(metrics) = state.with(metrics_now) else {
            return view! { <p class="muted">"No metrics yet."</p> }.into_any();
        };
        let failed_share = if metrics.total_tasks == 0 {
            0.0
        } else {
            metrics.failed_tasks as f64 / metrics.total_tasks as f64 * 100.0
        };
        view! {
            <section class="card">
                <h2>"Task Success Rate"</h2>
                <div class="rate-bar">
                    <div class="rate-success" style=format!("width: {:.1}%", metrics.success_rate)></div>
                    <div class="rate-failed" style=format!("width: {failed_share:.1}%")></div>
                </div>
                <div class="stat-grid">
                    <StatCard label="Total Tasks" value=metrics.total_tasks.to_string()/>
                    <StatCard label="Successful" value=metrics.successful_tasks.to_string()/>
                    <StatCard label="Failed" value=metrics.failed_tasks.to_string()/>
                    <StatCard label="Retries" value=metrics.total_retries.to_string()/>
                    <StatCard label="Execution Time" value=format!("{}ms", metrics.execution_time_ms)/>
                    <StatCard label="Success Rate" value=format!("{:.1}%", metrics.success_rate)/>
                </div>
            </section>
        }
        .into_any()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn short_ids_are_truncated() {
        assert_eq!(short_id("01HZX4ABCDEF"), "01HZX4AB...");
        assert_eq!(short_id("run-1"), "run-1");
    }

    #[test]
    fn unfinished_tasks_show_running() {
        let task: Task = serde_json::from_value(json!({
            "id": "t-1",
            "runId": "r-1",
            "nodeId": "n-1",
            "status": "RUNNING",
            "startedAt": "2024-05-01T12:00:00Z"
        }))
        .expect("task");
        assert_eq!(task_duration(&task), "Running...");

        let done: Task = serde_json::from_value(json!({
            "id": "t-2",
            "runId": "r-1",
            "nodeId": "n-2",
            "status": "SUCCESS",
            "startedAt": "2024-05-01T12:00:00Z",
            "completedAt": "2024-05-01T12:00:01.250Z"
        }))
        .expect("task");
        assert_eq!(task_duration(&done), "1250ms");
    }
}
