//! Small building blocks shared by several pages.

use chrono::{DateTime, Utc};
use flowforge_workflow::RunStatus;
use leptos::prelude::*;

/// CSS modifier for a run or task status.
#[must_use]
pub fn status_class(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Success => "status-success",
        RunStatus::Running => "status-running",
        RunStatus::Failed => "status-failed",
        RunStatus::Pending => "status-pending",
        RunStatus::Canceled => "status-canceled",
    }
}

/// `2024-05-01 12:00:00`, or a dash when unknown.
#[must_use]
pub fn format_timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(
        || "-".to_string(),
        |at| at.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

#[component]
pub fn StatusBadge(status: RunStatus) -> impl IntoView {
    view! {
        <span class=format!("badge {}", status_class(status))>{status.label()}</span>
    }
}

/// Dismissable error message. Renders nothing when `message` is `None`.
#[component]
pub fn ErrorBanner(
    #[prop(into)] message: Signal<Option<String>>,
    on_dismiss: impl Fn() + Send + Sync + 'static,
) -> impl IntoView {
    let on_dismiss = std::sync::Arc::new(on_dismiss);
    move || {
        let on_dismiss = on_dismiss.clone();
        message.get().map(|text| {
            view! {
                <div class="error-banner" role="alert">
                    <span>{text}</span>
                    <button class="link-btn" on:click=move |_| on_dismiss()>"Dismiss"</button>
                </div>
            }
        })
    }
}

#[component]
pub fn StatCard(label: &'static str, #[prop(into)] value: Signal<String>) -> impl IntoView {
    view! {
        <div class="stat-card">
            <span class="stat-label">{label}</span>
            <span class="stat-value">{move || value.get()}</span>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_render_or_dash() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single();
        assert_eq!(format_timestamp(at), "2024-05-01 12:00:00");
        assert_eq!(format_timestamp(None), "-");
    }

    #[test]
    fn every_status_has_a_class() {
        for status in RunStatus::ALL {
            assert!(status_class(status).starts_with("status-"));
        }
    }
}
