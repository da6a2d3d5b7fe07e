//! Dead-letter queue page.

use crate::app::use_app;
use crate::browser;
use crate::components::{ErrorBanner, StatCard, format_timestamp};
use flowforge_core::TaskId;
use flowforge_workflow::{DeadLetterFilter, DeadLetterTask, ErrorKind};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::A;

fn error_class(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Timeout => "error-timeout",
        ErrorKind::Connection => "error-connection",
        ErrorKind::ServerError => "error-server",
        ErrorKind::BadRequest => "error-bad-request",
        ErrorKind::Validation => "error-validation",
        ErrorKind::Unknown => "error-unknown",
    }
}

/// `None` for the "all" option, the raw value otherwise.
fn filter_choice(value: String) -> Option<String> {
    (value != "all" && !value.is_empty()).then_some(value)
}

#[component]
pub fn DeadLetterPage() -> impl IntoView {
    let app = use_app();
    let state = app.dead_letter;
    app.stores.dead_letter.load();

    let summary = Memo::new(move |_| state.with(|s| s.summary()));
    let filter = Memo::new(move |_| state.with(|s| s.filter.clone()));

    let store = app.stores.dead_letter.clone();
    let update_filter = move |edit: &dyn Fn(&mut DeadLetterFilter)| {
        let mut next = filter.get_untracked();
        edit(&mut next);
        store.set_filter(next);
    };
    let on_search = {
        let update_filter = update_filter.clone();
        move |ev: leptos::ev::Event| {
            let value = event_target_value(&ev);
            update_filter(&|f| f.search = value.clone());
        }
    };
    let on_workflow = {
        let update_filter = update_filter.clone();
        move |ev: leptos::ev::Event| {
            let value = filter_choice(event_target_value(&ev));
            update_filter(&|f| f.workflow = value.clone());
        }
    };
    let on_task_type = move |ev: leptos::ev::Event| {
        let value = filter_choice(event_target_value(&ev));
        update_filter(&|f| f.task_type = value.clone());
    };

    let store = app.stores.dead_letter.clone();
    let stores = app.stores.clone();

    view! {
        <div class="dead-letter-page">
            <header class="page-header">
                <h1>"Dead Letter Queue"</h1>
                <span class="badge status-failed">
                    {move || format!("{} Failed Tasks", summary.get().total)}
                </span>
                <button
                    class="secondary-btn"
                    disabled=move || state.get().loading
                    on:click=move |_| store.load()
                >"Refresh"</button>
            </header>

            {move || state.get().is_sample.then(|| view! {
                <div class="info-banner">
                    "Showing sample data. The backend does not expose a dead-letter endpoint yet; "
                    "retries are sent for real, deletions only affect this list."
                </div>
            })}

            <ErrorBanner
                message=Signal::derive(move || state.get().error)
                on_dismiss=move || stores.dead_letter.clear_error()
            />

            <div class="stat-grid">
                <StatCard label="Total Failed Tasks" value=Signal::derive(move || summary.get().total.to_string())/>
                <StatCard label="Max Retries Exceeded" value=Signal::derive(move || summary.get().exhausted.to_string())/>
                <StatCard label="Retryable Tasks" value=Signal::derive(move || summary.get().retryable.to_string())/>
                <StatCard label="Unique Workflows" value=Signal::derive(move || summary.get().workflows.len().to_string())/>
            </div>

            <section class="card">
                <h2>"Filters"</h2>
                <div class="filters">
                    <input
                        type="search"
                        placeholder="Search by error message..."
                        prop:value=move || filter.get().search
                        on:input=on_search
                    />
                    <select on:change=on_workflow>
                        <option value="all">"All Workflows"</option>
                        {move || summary.get().workflows.into_iter().map(|name| view! {
                            <option value=name.clone() selected={filter.get_untracked().workflow.as_ref() == Some(&name)}>
                                {name.clone()}
                            </option>
                        }).collect_view()}
                    </select>
                    <select on:change=on_task_type>
                        <option value="all">"All Task Types"</option>
                        {move || summary.get().task_types.into_iter().map(|kind| view! {
                            <option value=kind.clone() selected={filter.get_untracked().task_type.as_ref() == Some(&kind)}>
                                {kind.clone()}
                            </option>
                        }).collect_view()}
                    </select>
                </div>
            </section>

            <section class="card">
                <h2>"Failed Tasks"</h2>
                <DeadLetterTable/>
            </section>
        </div>
    }
}

#[component]
fn DeadLetterTable() -> impl IntoView {
    let app = use_app();
    let state = app.dead_letter;
    let expanded = RwSignal::new(Option::<TaskId>::None);

    let store = app.stores.dead_letter.clone();
    let retry = move |task_id: TaskId| {
        let store = store.clone();
        spawn_local(async move {
            if let Err(e) = store.retry(&task_id).await {
                tracing::warn!(%task_id, error = %e, "dead-letter retry failed");
            }
        });
    };

    let store = app.stores.dead_letter.clone();
    let remove = move |task_id: TaskId| {
        if !browser::confirm("Remove this task from the dead letter queue?") {
            return;
        }
        if store.remove(&task_id) {
            tracing::info!(%task_id, "dead-letter entry removed");
        }
    };

    move || {
        let current = state.get();
        let visible: Vec<DeadLetterTask> = current.visible().into_iter().cloned().collect();
        if visible.is_empty() {
            return view! { <p class="empty">"No failed tasks match the current filters."</p> }.into_any();
        }
        let retrying = current.retrying.clone();
        let open = expanded.get();
        let retry = retry.clone();
        let remove = remove.clone();
        view! {
            <table class="data-table">
                <thead>
                    <tr>
                        <th>"Task ID"</th>
                        <th>"Workflow"</th>
                        <th>"Node"</th>
                        <th>"Error Type"</th>
                        <th>"Failed At"</th>
                        <th>"Retries"</th>
                        <th>"Actions"</th>
                    </tr>
                </thead>
                <tbody>
                    {visible.into_iter().map(|entry| {
                        let task = entry.task.clone();
                        let kind = entry.error_kind();
                        let is_retrying = retrying.as_ref() == Some(&task.id);
                        let is_expanded = open.as_ref() == Some(&task.id);
                        let (toggle_id, retry_id, remove_id) = (task.id.clone(), task.id.clone(), task.id.clone());
                        let retry = retry.clone();
                        let remove = remove.clone();
                        let input = serde_json::to_string_pretty(&task.input).unwrap_or_default();
                        view! {
                            <tr>
                                <td class="mono">{task.id.to_string()}</td>
                                <td>
                                    <A href=format!("/runs/{}", task.run_id)>
                                        {entry.workflow_name.clone().unwrap_or_else(|| "-".to_string())}
                                    </A>
                                </td>
                                <td>
                                    <div>{task.label().to_string()}</div>
                                    <div class="muted">{task.node_type.clone().unwrap_or_default()}</div>
                                </td>
                                <td><span class=format!("badge {}", error_class(kind))>{kind.label()}</span></td>
                                <td>{format_timestamp(task.completed_at.or(task.updated_at))}</td>
                                <td>{format!("{}/{}", task.retry_count, task.max_retries)}</td>
                                <td class="actions">
                                    <button
                                        class="link-btn small"
                                        on:click=move |_| expanded.update(|open| {
                                            *open = if open.as_ref() == Some(&toggle_id) { None } else { Some(toggle_id.clone()) };
                                        })
                                    >{if is_expanded { "Hide" } else { "Details" }}</button>
                                    <button
                                        class="primary-btn small"
                                        disabled={!task.can_retry() || is_retrying}
                                        on:click=move |_| retry(retry_id.clone())
                                    >{if is_retrying { "Retrying..." } else { "Retry" }}</button>
                                    <button class="danger-btn small" on:click=move |_| remove(remove_id.clone())>
                                        "Delete"
                                    </button>
                                </td>
                            </tr>
                            {is_expanded.then(|| view! {
                                <tr class="details-row">
                                    <td colspan="7">
                                        <p class="error-text">{task.error.clone().unwrap_or_default()}</p>
                                        <pre class="mono">{input}</pre>
                                    </td>
                                </tr>
                            })}
                        }
                    }).collect_view()}
                </tbody>
            </table>
        }
        .into_any()
    }
}
