#![allow(clippy::unit_arg)]

pub mod components;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod guard;
pub mod pages;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod testing;

use components::{Header, RequireSignIn};
use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::{components::*, StaticSegment};
use pages::*;

/// Wraps the content in a basic layout and a final fallback error boundary which should never actually trigger
#[component]
pub fn App() -> impl IntoView {
    tracing::info!("Rendering app");

    leptos_meta::provide_meta_context();
    if let Err(err) = context::initialise_context() {
        tracing::error!("Failed to initialise: {err}");
        return view! { <div class="error">{format!("Error: {}", err.user_message())}</div> }
            .into_any();
    }

    let fallback = move |errors: ArcRwSignal<Errors>| {
        errors
            .get_untracked()
            .into_iter()
            .map(|(_key, err)| {
                view! { <div>{format!("Unhandled error: {err}")}</div>}
            })
            .collect_view()
    };

    view! {
        <Stylesheet id="bistro" href="/pkg/bistro.css"/>
        <Meta name="description" content="Menu, orders and reservations"/>
        <Title text="Bistro"/>
        <div class="app">
            <ErrorBoundary fallback>
                <Content/>
            </ErrorBoundary>
        </div>
    }
    .into_any()
}

/// Contains the header and router
#[component]
pub fn Content() -> impl IntoView {
    view! {
        <Router>
            <Header/>
            <main class="main-content">
                <FlatRoutes fallback=|| "Page not found.">
                    <Route
                        path=StaticSegment("/")
                        view=Home
                    />
                    <Route
                        path=StaticSegment("menu")
                        view=MenuPage
                    />
                    <Route
                        path=StaticSegment("sign-in")
                        view=SignInPage
                    />
                    <Route
                        path=StaticSegment("sign-up")
                        view=SignUpPage
                    />
                    <Route
                        path=StaticSegment("orders")
                        view=|| view! { <RequireSignIn><OrdersPage/></RequireSignIn> }
                    />
                    <Route
                        path=StaticSegment("reservations")
                        view=|| view! { <RequireSignIn><ReservationsPage/></RequireSignIn> }
                    />
                </FlatRoutes>
            </main>
        </Router>
    }
}
