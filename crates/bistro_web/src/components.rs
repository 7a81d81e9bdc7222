//! Custom components.

use crate::{
    config::{SIGN_IN_PATH, SIGN_UP_PATH},
    context::{get_identity, get_session},
    error::WebResult,
    guard::{GuardDecision, Navigator, Redirect, RouteGuard},
    utils::{self, format_date, format_price},
};
use bistro_api::response::{MenuItem, Order};
use leptos::prelude::*;
use leptos_router::{components::*, hooks::use_navigate, NavigateOptions};
use send_wrapper::SendWrapper;

#[component]
pub fn Header() -> impl IntoView {
    let session = get_session();
    let identity = SendWrapper::new(get_identity());
    let sign_out = Action::new(move |()| {
        let identity = (*identity).clone();
        SendWrapper::new(async move {
            if let Some(identity) = identity {
                identity.sign_out().await?;
            }
            WebResult::Ok(())
        })
    });

    let links = move || {
        let view = if session.with(|session| session.logged_in())? {
            view! {
                <A href="/orders">"My Orders"</A>
                <A href="/reservations">"Reservations"</A>
                <button class="sign-out-btn" on:click=move |_ev| { sign_out.dispatch(()); }>
                    "Sign out"
                </button>
            }
            .into_any()
        } else {
            view! {
                <A href=SIGN_IN_PATH>
                    <span class="sign-in-btn">"Sign In"</span>
                </A>
            }
            .into_any()
        };
        Some(view)
    };

    view! {
        <header class="header">
            <nav class="nav-container">
                <A href="/">
                    <span class="logo">"Bistro"</span>
                </A>
                <div class="nav-links">
                    <A href="/menu">"Menu"</A>
                    {links}
                </div>
            </nav>
            <ErrorBoundary fallback={utils::errors_fallback}>
                {move || sign_out.value().get()}
            </ErrorBoundary>
        </header>
    }
}

struct RouterNavigator<F>(F);

impl<F> Navigator for RouterNavigator<F>
where
    F: Fn(&str, NavigateOptions),
{
    fn navigate(&self, redirect: &Redirect) {
        (self.0)(
            &redirect.to,
            NavigateOptions {
                replace: redirect.replace,
                ..Default::default()
            },
        );
    }
}

/// Shows `children` to signed-in viewers and sends everyone else to the sign-in page.
#[component]
pub fn RequireSignIn(children: ChildrenFn) -> impl IntoView {
    let session = get_session();
    let navigator = RouterNavigator(use_navigate());
    let guard = StoredValue::new(RouteGuard::new(SIGN_IN_PATH));
    let decision = RwSignal::new(GuardDecision::Pending);

    Effect::new(move |_| {
        let current = session.get();
        let mut next = GuardDecision::Pending;
        guard.update_value(|guard| next = guard.evaluate(&current, &navigator));
        if decision.get_untracked() != next {
            decision.set(next);
        }
    });

    move || match decision.get() {
        GuardDecision::Pending => utils::loading_fallback("Loading...").into_any(),
        GuardDecision::Allowed => children().into_any(),
        GuardDecision::Denied(_) => ().into_any(),
    }
}

#[component]
pub fn MenuItemCard(item: MenuItem) -> impl IntoView {
    let unavailable = (!item.available).then(|| {
        view! { <span class="unavailable">"Currently unavailable"</span> }
    });
    let image = item.image_url.map(|src| {
        view! { <img class="menu-item-image" src=src alt=item.name.clone()/> }
    });
    view! {
        <div class="menu-item">
            {image}
            <h3>{item.name}</h3>
            <p>{item.description}</p>
            <p class="price">{format_price(item.price)}</p>
            {unavailable}
        </div>
    }
}

#[component]
pub fn OrderCard(order: Order, #[prop(into)] on_cancel: Callback<String>) -> impl IntoView {
    let cancel = order.status.is_cancellable().then(|| {
        let id = order.id.clone();
        view! {
            <button class="btn btn-secondary" on:click=move |_ev| on_cancel.run(id.clone())>
                "Cancel order"
            </button>
        }
    });
    let takeaway = order
        .is_takeaway
        .then(|| view! { <span class="takeaway">"Takeaway"</span> });
    let card_class = if order.status.is_terminal() {
        "order-item order-closed"
    } else {
        "order-item"
    };
    let status = order.status.as_str().to_string();
    let status_class = format!("status status-{status}");
    view! {
        <div class=card_class>
            <div class="order-header">
                <h3>{format!("Order #{}", order.id)}</h3>
                <span class=status_class>{status}</span>
            </div>
            <p>{format!("Total: {}", format_price(order.total))}</p>
            <p>{format!("{} items", order.item_count())}</p>
            <p>{format!("Placed on: {}", format_date(&order.created_at))}</p>
            {takeaway}
            {cancel}
        </div>
    }
}

#[component]
pub fn SignUpLink() -> impl IntoView {
    view! { <A href=SIGN_UP_PATH>"Join Us"</A> }
}
