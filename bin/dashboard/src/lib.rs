//! FlowForge dashboard.
//!
//! A client-side rendered Leptos application for authoring workflows,
//! triggering and watching runs, and poking the backend scheduler.

#![allow(non_snake_case)]

pub mod app;
pub mod browser;
pub mod components;
pub mod logging;
pub mod pages;

/// Installs the panic hook and logger, then mounts the app on `<body>`.
pub fn start() {
    console_error_panic_hook::set_once();
    logging::init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting dashboard");
    leptos::mount::mount_to_body(app::App);
}
