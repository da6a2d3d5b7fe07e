//! Root component, routing and shared application context.

use crate::browser::{BrowserNavigator, LocalStorage};
use crate::pages::{
    BuilderPage, DashboardPage, DeadLetterPage, LoginPage, RegisterPage, RunDetailPage,
};
use flowforge_client::{ApiClient, ClientConfig, ClientError};
use flowforge_store::{
    AuthState, DeadLetterState, RunDetailState, SchedulerState, StateCell, Stores, WorkflowState,
};
use leptos::prelude::*;
use leptos_meta::{Title, provide_meta_context};
use leptos_router::{
    components::{A, Redirect, Route, Router, Routes},
    hooks::use_navigate,
    path,
};
use std::sync::Arc;

/// Mirrors a store's state into a signal that views can track.
fn track<T>(cell: &StateCell<T>) -> RwSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    let signal = RwSignal::new(cell.snapshot());
    let source = cell.clone();
    cell.subscribe(move || signal.set(source.snapshot()));
    signal
}

/// Stores plus a reactive view of each one, provided as context.
#[derive(Clone)]
pub struct AppContext {
    pub stores: Stores,
    pub auth: RwSignal<AuthState>,
    pub workflows: RwSignal<WorkflowState>,
    pub scheduler: RwSignal<SchedulerState>,
    pub run_detail: RwSignal<RunDetailState>,
    pub dead_letter: RwSignal<DeadLetterState>,
}

impl AppContext {
    /// Builds the client against the compiled-in backend address.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self, ClientError> {
        let config = ClientConfig::compiled();
        tracing::info!(api = %config.api_base_url, "configuring API client");
        let client = ApiClient::new(config, Arc::new(LocalStorage), Arc::new(BrowserNavigator))?;
        let stores = Stores::new(client);
        Ok(Self {
            auth: track(stores.auth.state()),
            workflows: track(stores.workflows.state()),
            scheduler: track(stores.scheduler.state()),
            run_detail: track(stores.run_detail.state()),
            dead_letter: track(stores.dead_letter.state()),
            stores,
        })
    }
}

/// The context provided by [`App`].
#[must_use]
pub fn use_app() -> AppContext {
    expect_context::<AppContext>()
}

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let context = match AppContext::new() {
        Ok(context) => context,
        Err(e) => {
            tracing::error!(error = %e, "failed to start");
            return view! {
                <div class="fatal">
                    <h1>"FlowForge could not start"</h1>
                    <p>{e.to_string()}</p>
                </div>
            }
            .into_any();
        }
    };
    provide_context(context);

    view! {
        <Title text="FlowForge"/>
        <Router>
            <Header/>
            <main class="container">
                <Routes fallback=|| view! { <p class="not-found">"Page not found."</p> }>
                    <Route path=path!("/login") view=LoginPage/>
                    <Route path=path!("/register") view=RegisterPage/>
                    <Route path=path!("/") view=|| view! { <Protected><DashboardPage/></Protected> }/>
                    <Route path=path!("/workflow/new") view=|| view! { <Protected><BuilderPage/></Protected> }/>
                    <Route path=path!("/workflow/:id") view=|| view! { <Protected><BuilderPage/></Protected> }/>
                    <Route path=path!("/runs/:id") view=|| view! { <Protected><RunDetailPage/></Protected> }/>
                    <Route path=path!("/dlq") view=|| view! { <Protected><DeadLetterPage/></Protected> }/>
                </Routes>
            </main>
        </Router>
    }
    .into_any()
}

/// Renders `children` for signed-in users and sends everyone else to login.
#[component]
fn Protected(children: ChildrenFn) -> impl IntoView {
    let app = use_app();
    let stores = app.stores.clone();
    move || {
        if stores.auth.validate_session() && app.auth.get().is_authenticated {
            children().into_any()
        } else {
            view! { <Redirect path="/login"/> }.into_any()
        }
    }
}

#[component]
fn Header() -> impl IntoView {
    let app = use_app();
    let navigate = use_navigate();
    let stores = app.stores.clone();

    let on_logout = move |_| {
        stores.auth.logout();
        navigate("/login", Default::default());
    };

    view! {
        <header class="header">
            <div class="header-left">
                <A href="/" attr:class="logo">"FlowForge"</A>
            </div>
            {move || {
                let on_logout = on_logout.clone();
                app.auth.get().user.map(|user| view! {
                    <nav class="header-right">
                        <A href="/">"Dashboard"</A>
                        <A href="/workflow/new">"New Workflow"</A>
                        <A href="/dlq">"Dead Letters"</A>
                        <span class="user-name">{user.email}</span>
                        <button class="link-btn" on:click=on_logout>"Log out"</button>
                    </nav>
                })
            }}
        </header>
    }
}
