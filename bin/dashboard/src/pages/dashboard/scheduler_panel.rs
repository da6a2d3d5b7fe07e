//! Manual scheduler triggers and their results.

use crate::app::use_app;
use crate::components::{ErrorBanner, format_timestamp};
use flowforge_client::{OutcomeStatus, SchedulerConfig, SchedulerKind, SchedulerResponse};
use flowforge_core::RunId;
use leptos::prelude::*;
use leptos::task::spawn_local;

const MAX_TASKS_LIMIT: u32 = 50;
const HISTORY_SHOWN: usize = 5;

/// Builds the request options from the raw form fields.
///
/// An unparsable task count falls back to the panel default; a blank run id
/// means "all runs".
fn panel_config(max_tasks: &str, process_retry_queue: bool, run_id: &str) -> SchedulerConfig {
    let defaults = SchedulerConfig::panel_defaults();
    let max_tasks = max_tasks
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .map(|n| n.min(MAX_TASKS_LIMIT))
        .or(defaults.max_tasks);
    let run_id = run_id.trim();
    SchedulerConfig {
        max_tasks,
        process_retry_queue: Some(process_retry_queue),
        run_id: (!run_id.is_empty()).then(|| RunId::from(run_id)),
    }
}

fn outcome_label(status: OutcomeStatus) -> &'static str {
    match status {
        OutcomeStatus::Processed => "processed",
        OutcomeStatus::Error => "error",
        OutcomeStatus::ProcessedStuck => "processed (stuck)",
        OutcomeStatus::ErrorStuck => "error (stuck)",
    }
}

fn button_label(kind: SchedulerKind) -> &'static str {
    match kind {
        SchedulerKind::Standard => "Main Scheduler",
        SchedulerKind::Redis => "Redis Scheduler",
        SchedulerKind::Mongo => "MongoDB Scheduler",
        SchedulerKind::Cron => "Cron Scheduler",
    }
}

#[component]
pub fn SchedulerPanel() -> impl IntoView {
    let app = use_app();
    let state = app.scheduler;
    let defaults = SchedulerConfig::panel_defaults();

    let (max_tasks, set_max_tasks) =
        signal(defaults.max_tasks.map(|n| n.to_string()).unwrap_or_default());
    let (retry_queue, set_retry_queue) = signal(defaults.process_retry_queue.unwrap_or(true));
    let (run_id, set_run_id) = signal(String::new());

    let store = app.stores.scheduler.clone();
    let trigger = move |kind: SchedulerKind| {
        let store = store.clone();
        let config = panel_config(&max_tasks.get(), retry_queue.get(), &run_id.get());
        spawn_local(async move {
            let config = kind.accepts_config().then_some(&config);
            if let Err(e) = store.trigger(kind, config).await {
                tracing::warn!(%kind, error = %e, "scheduler trigger failed");
            }
        });
    };

    let stores = app.stores.clone();
    let history_store = app.stores.scheduler.clone();

    view! {
        <div class="scheduler-panel">
            <section class="card">
                <h2>"Scheduler Controls"</h2>
                <div class="form-row">
                    <div class="form-group">
                        <label for="max-tasks">"Max Tasks"</label>
                        <input
                            id="max-tasks"
                            type="number"
                            min="1"
                            max=MAX_TASKS_LIMIT.to_string()
                            prop:value=move || max_tasks.get()
                            on:input=move |ev| set_max_tasks.set(event_target_value(&ev))
                        />
                    </div>
                    <div class="form-group checkbox">
                        <label for="retry-queue">"Process Retry Queue"</label>
                        <input
                            id="retry-queue"
                            type="checkbox"
                            prop:checked=move || retry_queue.get()
                            on:change=move |ev| set_retry_queue.set(event_target_checked(&ev))
                        />
                    </div>
                    <div class="form-group">
                        <label for="run-id">"Run ID (Optional)"</label>
                        <input
                            id="run-id"
                            type="text"
                            placeholder="Specific run ID"
                            prop:value=move || run_id.get()
                            on:input=move |ev| set_run_id.set(event_target_value(&ev))
                        />
                    </div>
                </div>
                <div class="button-row">
                    {SchedulerKind::ALL.into_iter().map(|kind| {
                        let trigger = trigger.clone();
                        view! {
                            <button
                                class={if kind == SchedulerKind::Standard { "primary-btn" } else { "secondary-btn" }}
                                disabled=move || state.get().is_processing
                                on:click=move |_| trigger(kind)
                            >
                                {move || if state.get().is_processing && kind == SchedulerKind::Standard {
                                    "Processing..."
                                } else {
                                    button_label(kind)
                                }}
                            </button>
                        }
                    }).collect_view()}
                </div>
                <ErrorBanner
                    message=Signal::derive(move || state.get().error)
                    on_dismiss=move || stores.scheduler.clear_error()
                />
            </section>

            {move || state.get().last_result.map(|result| view! { <LastResult result=result/> })}

            {move || {
                let history = state.get().processing_history;
                let history_store = history_store.clone();
                (!history.is_empty()).then(|| view! {
                    <section class="card">
                        <div class="card-header">
                            <h2>"Processing History"</h2>
                            <button class="secondary-btn small" on:click=move |_| history_store.clear_history()>
                                "Clear History"
                            </button>
                        </div>
                        <ul class="history-list">
                            {history.into_iter().take(HISTORY_SHOWN).map(|entry| view! {
                                <li>
                                    <span class="history-time">{format_timestamp(entry.timestamp)}</span>
                                    <span>{format!("{} tasks processed", entry.processed_tasks)}</span>
                                    <span class="badge">{format!("{} Redis", entry.redis_tasks_processed.unwrap_or(0))}</span>
                                    <span class="badge">{format!("{} Pending", entry.pending_tasks_found)}</span>
                                </li>
                            }).collect_view()}
                        </ul>
                    </section>
                })
            }}
        </div>
    }
}

#[component]
fn LastResult(result: SchedulerResponse) -> impl IntoView {
    let errors = result.error_count();
    view! {
        <section class="card">
            <div class="card-header">
                <h2>"Last Scheduler Run"</h2>
                <span class="muted">{format_timestamp(result.timestamp)}</span>
            </div>
            <div class="stat-grid">
                <div class="stat-card">
                    <span class="stat-value">{result.processed_tasks}</span>
                    <span class="stat-label">"Processed Tasks"</span>
                </div>
                <div class="stat-card">
                    <span class="stat-value">{result.redis_tasks_processed.unwrap_or(0)}</span>
                    <span class="stat-label">"Redis Tasks"</span>
                </div>
                <div class="stat-card">
                    <span class="stat-value">{result.pending_tasks_found}</span>
                    <span class="stat-label">"Pending Found"</span>
                </div>
                <div class="stat-card">
                    <span class="stat-value">{result.stuck_tasks_found}</span>
                    <span class="stat-label">"Stuck Found"</span>
                </div>
            </div>
            {(!result.results.is_empty()).then(|| view! {
                <h3>{format!("Task Results ({errors} errors)")}</h3>
                <ul class="outcome-list">
                    {result.results.into_iter().map(|outcome| {
                        let class = if outcome.status.is_error() { "badge status-failed" } else { "badge status-success" };
                        view! {
                            <li>
                                <span class="mono">{outcome.task_id.to_string()}</span>
                                {outcome.node_id.map(|node| view! { <span class="muted">{format!("({node})")}</span> })}
                                <span class=class>{outcome_label(outcome.status)}</span>
                                {outcome.source.map(|source| view! { <span class="badge">{source}</span> })}
                                {outcome.error.map(|error| view! { <span class="error-text">{error}</span> })}
                            </li>
                        }
                    }).collect_view()}
                </ul>
            })}
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parses_panel_fields() {
        let config = panel_config("25", false, " run-7 ");
        assert_eq!(config.max_tasks, Some(25));
        assert_eq!(config.process_retry_queue, Some(false));
        assert_eq!(config.run_id, Some(RunId::from("run-7")));
    }

    #[test]
    fn config_falls_back_and_clamps() {
        assert_eq!(panel_config("abc", true, "").max_tasks, Some(10));
        assert_eq!(panel_config("0", true, "").max_tasks, Some(10));
        assert_eq!(panel_config("500", true, "").max_tasks, Some(MAX_TASKS_LIMIT));
        assert_eq!(panel_config("5", true, "   ").run_id, None);
    }
}
