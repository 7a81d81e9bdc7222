//! Various utility functions.

use crate::{
    context::{self, client::Client},
    controller::{Access, ViewController, ViewState},
    error::WebResult,
};
use bistro_api::response::{DateTime, Utc};
use leptos::{prelude::*, IntoView};
use send_wrapper::SendWrapper;
use std::future::Future;

/// Generic loading fallback view.
pub fn loading_fallback(text: &'static str) -> impl IntoView {
    view! { <div class="loading">{text}</div> }.into_view()
}

/// Generic error fallback view.
pub fn errors_fallback(errors: ArcRwSignal<Errors>) -> impl IntoView {
    let errors = errors
        .get_untracked()
        .into_iter()
        .map(|(_, err)| {
            view! { <li>{format!("Error: {err}")}</li> }
        })
        .collect_view();

    view! {
        <div class="content">
            <ul>
                {errors}
            </ul>
        </div>
    }
}

pub fn format_price(price: f64) -> String {
    format!("${price:.2}")
}

pub fn format_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}

/// Reactive handle to a screen's [`ViewController`].
pub struct ViewData<T: Send + Sync + 'static> {
    controller: RwSignal<ViewController<T>>,
    refresh: RwSignal<u64>,
}

impl<T: Send + Sync + 'static> Clone for ViewData<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Send + Sync + 'static> Copy for ViewData<T> {}

impl<T: Clone + Send + Sync + 'static> ViewData<T> {
    pub fn state(&self) -> ViewState<T> {
        self.controller.with(|controller| controller.state().clone())
    }

    /// Starts a new activation with the current session.
    pub fn refetch(&self) {
        self.refresh.update(|n| *n += 1);
    }
}

/// Fetches data for a screen once per activation.
///
/// The fetch is repeated whenever the session finishes loading or its subject changes.
/// Results from superseded activations are dropped.
pub fn use_view_data<T, F, Fut>(access: Access, fetch: F) -> ViewData<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(Client) -> Fut + 'static,
    Fut: Future<Output = WebResult<T>> + 'static,
{
    let session = context::get_session();
    let client = SendWrapper::new(context::get_client());
    let controller = RwSignal::new(ViewController::<T>::default());
    let refresh = RwSignal::new(0_u64);
    let key = Memo::new(move |_| {
        session.with(|session| {
            (
                session.is_loaded(),
                session.subject_id().map(str::to_string),
            )
        })
    });

    Effect::new(move |_| {
        key.track();
        refresh.track();
        let current = session.get_untracked();
        let mut activation = None;
        controller.update(|controller| activation = controller.activate(&current, access));
        let Some(activation) = activation else {
            return;
        };
        let fetching = fetch((*client).clone());
        leptos::task::spawn_local(async move {
            let result = fetching.await;
            if let Err(err) = &result {
                tracing::warn!("Fetch failed: {err}");
            }
            controller.try_update(|controller| controller.resolve(&activation, result));
        });
    });
    on_cleanup(move || {
        controller.try_update(ViewController::deactivate);
    });

    ViewData {
        controller,
        refresh,
    }
}

/// Renders a [`ViewState`] with a loading placeholder and the error's display text.
pub fn render_state<T, V>(
    state: ViewState<T>,
    loading_text: &'static str,
    content: impl FnOnce(T) -> V,
) -> AnyView
where
    V: IntoView + 'static,
{
    match state {
        ViewState::Idle | ViewState::Loading => loading_fallback(loading_text).into_any(),
        ViewState::Loaded(data) => content(data).into_any(),
        ViewState::Failed(err) => {
            view! { <div class="error">{format!("Error: {}", err.user_message())}</div> }
                .into_any()
        }
    }
}
