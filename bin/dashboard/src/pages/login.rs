//! Sign-in and sign-up pages.

use crate::app::use_app;
use crate::components::ErrorBanner;
use flowforge_client::Credentials;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::{A, Redirect};
use leptos_router::hooks::use_navigate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Login,
    Register,
}

impl Mode {
    const fn title(self) -> &'static str {
        match self {
            Self::Login => "Sign in to FlowForge",
            Self::Register => "Create your FlowForge account",
        }
    }

    const fn submit_label(self, busy: bool) -> &'static str {
        match (self, busy) {
            (Self::Login, false) => "Sign in",
            (Self::Login, true) => "Signing in...",
            (Self::Register, false) => "Create account",
            (Self::Register, true) => "Creating account...",
        }
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    view! { <AuthForm mode=Mode::Login/> }
}

#[component]
pub fn RegisterPage() -> impl IntoView {
    view! { <AuthForm mode=Mode::Register/> }
}

#[component]
fn AuthForm(mode: Mode) -> impl IntoView {
    let app = use_app();
    let navigate = use_navigate();
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());

    let stores = app.stores.clone();
    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let credentials = Credentials::new(email.get().trim(), password.get());
        let auth = stores.auth.clone();
        let navigate = navigate.clone();
        spawn_local(async move {
            let result = match mode {
                Mode::Login => auth.login(&credentials).await,
                Mode::Register => auth.register(&credentials).await,
            };
            if result.is_ok() {
                navigate("/", Default::default());
            }
        });
    };

    let auth = app.auth;
    let stores = app.stores.clone();

    view! {
        {move || auth.get().is_authenticated.then(|| view! { <Redirect path="/"/> })}
        <div class="login-page">
            <form class="login-box" on:submit=on_submit>
                <h1>{mode.title()}</h1>
                <ErrorBanner
                    message=Signal::derive(move || auth.get().error)
                    on_dismiss=move || stores.auth.clear_error()
                />
                <div class="form-group">
                    <label for="email">"Email"</label>
                    <input
                        id="email"
                        type="email"
                        required=true
                        prop:value=move || email.get()
                        on:input=move |ev| set_email.set(event_target_value(&ev))
                    />
                </div>
                <div class="form-group">
                    <label for="password">"Password"</label>
                    <input
                        id="password"
                        type="password"
                        required=true
                        prop:value=move || password.get()
                        on:input=move |ev| set_password.set(event_target_value(&ev))
                    />
                </div>
                <button
                    type="submit"
                    class="primary-btn"
                    disabled=move || auth.get().loading
                >
                    {move || mode.submit_label(auth.get().loading)}
                </button>
                {match mode {
                    Mode::Login => view! {
                        <p class="help">"No account yet? " <A href="/register">"Create one"</A></p>
                    }.into_any(),
                    Mode::Register => view! {
                        <p class="help">"Already registered? " <A href="/login">"Sign in"</A></p>
                    }.into_any(),
                }}
            </form>
        </div>
    }
}
