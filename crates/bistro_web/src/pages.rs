//! Top level pages.

use crate::{
    components::*,
    context::{credentials::ClerkCredentials, get_client, get_identity, get_session},
    controller::Access,
    error::{WebError, WebResult},
    utils::{render_state, use_view_data},
};
use bistro_api::response as res;
use itertools::Itertools;
use leptos::{html::Div, prelude::*};
use leptos_router::components::*;
use send_wrapper::SendWrapper;
use std::collections::HashMap;

#[component]
pub fn Home() -> impl IntoView {
    tracing::info!("Rendering Home");

    let session = get_session();
    let session_links = move || {
        let view = if session.with(|session| session.logged_in())? {
            view! { <A href="/reservations">"Make a Reservation"</A> }.into_any()
        } else {
            view! { <SignUpLink/> }.into_any()
        };
        Some(view)
    };

    view! {
        <div class="home-container">
            <h1>"Welcome to Our Restaurant"</h1>
            <p>"Experience the finest dining with our carefully crafted menu."</p>
            <div class="cta-buttons">
                <A href="/menu">"View Menu"</A>
                {session_links}
            </div>
        </div>
    }
}

/// Groups items by category, ordered by the categories' display order.
/// Categories the backend did not list go last, alphabetically.
fn group_by_category(
    items: Vec<res::MenuItem>,
    categories: &[res::MenuCategory],
) -> Vec<(String, Vec<res::MenuItem>)> {
    let order = categories
        .iter()
        .map(|category| (category.id.as_str(), (category.display_order, category.name.as_str())))
        .collect::<HashMap<_, _>>();
    let rank = |category: &str| {
        order
            .get(category)
            .map_or((1, i32::MAX), |(display_order, _)| (0, *display_order))
    };
    let chunks = items
        .into_iter()
        .sorted_by(|l, r| {
            rank(&l.category)
                .cmp(&rank(&r.category))
                .then_with(|| l.category.cmp(&r.category))
        })
        .chunk_by(|item| item.category.clone());
    let mut sections = Vec::new();
    for (category, items) in &chunks {
        let heading = order
            .get(category.as_str())
            .map_or(category.clone(), |(_, name)| name.to_string());
        sections.push((heading, items.collect()));
    }
    sections
}

#[component]
pub fn MenuPage() -> impl IntoView {
    tracing::info!("Rendering MenuPage");

    let session = get_session();
    let items = use_view_data(Access::Public, |client| async move {
        client.list_menu_items(None).await
    });
    let categories = use_view_data(Access::Public, |client| async move {
        client.list_categories().await
    });

    let menu = move || {
        render_state(items.state(), "Loading menu...", |items: Vec<res::MenuItem>| {
            if items.is_empty() {
                return view! { <p>"No menu items available"</p> }.into_any();
            }
            let categories = categories.state().loaded().cloned().unwrap_or_default();
            group_by_category(items, &categories)
                .into_iter()
                .map(|(heading, items)| {
                    let cards = items
                        .into_iter()
                        .map(|item| view! { <MenuItemCard item/> })
                        .collect_view();
                    view! {
                        <section class="menu-section">
                            <h2>{heading}</h2>
                            <div class="menu-grid">{cards}</div>
                        </section>
                    }
                })
                .collect_view()
                .into_any()
        })
    };

    let actions = move || {
        let view = if session.with(|session| session.logged_in())? {
            view! {
                <div class="order-actions">
                    <A href="/orders">"View my orders"</A>
                </div>
            }
            .into_any()
        } else {
            view! {
                <div class="sign-in-prompt">
                    <p>"Sign in to place an order"</p>
                    <A href="/sign-in">"Sign In"</A>
                </div>
            }
            .into_any()
        };
        Some(view)
    };

    view! {
        <div class="menu-container">
            <h1>"Our Menu"</h1>
            {menu}
            {actions}
        </div>
    }
}

#[component]
pub fn OrdersPage() -> impl IntoView {
    tracing::info!("Rendering OrdersPage");

    let orders = use_view_data(Access::SignedIn, |client| async move {
        client.list_my_orders().await
    });
    let client = SendWrapper::new(get_client());
    let cancel = Action::new(move |id: &String| {
        let id = id.clone();
        let client = (*client).clone();
        SendWrapper::new(async move {
            let message = client.cancel_order(&id).await?;
            orders.refetch();
            WebResult::Ok(message.message)
        })
    });
    let on_cancel = Callback::new(move |id: String| {
        cancel.dispatch(id);
    });

    let list = move || {
        render_state(orders.state(), "Loading orders...", move |orders: Vec<res::Order>| {
            if orders.is_empty() {
                return view! {
                    <div>
                        <p>"You haven't placed any orders yet."</p>
                        <A href="/menu">"Browse Menu"</A>
                    </div>
                }
                .into_any();
            }
            let cards = orders
                .into_iter()
                .sorted_by(|l, r| r.created_at.cmp(&l.created_at))
                .map(|order| view! { <OrderCard order on_cancel/> })
                .collect_view();
            view! { <div class="orders-list">{cards}</div> }.into_any()
        })
    };

    let cancel_result = move || {
        cancel.value().get().map(|result| match result {
            Ok(message) => view! { <div class="notice">{message}</div> }.into_any(),
            Err(err) => {
                view! { <div class="error">{format!("Error: {}", err.user_message())}</div> }
                    .into_any()
            }
        })
    };

    view! {
        <div class="orders-container">
            <h1>"My Orders"</h1>
            {cancel_result}
            {list}
        </div>
    }
}

#[component]
pub fn ReservationsPage() -> impl IntoView {
    tracing::info!("Rendering ReservationsPage");

    view! {
        <div class="reservations-container">
            <h1>"My Reservations"</h1>
            <p>"You don't have any reservations."</p>
        </div>
    }
}

type Mount = fn(&ClerkCredentials, &web_sys::HtmlElement) -> WebResult<()>;

/// Hosts one of the identity provider's widgets, unmounting it when the page goes away.
fn identity_widget(name: &'static str, mount: Mount, unmount: Mount) -> impl IntoView {
    let container = NodeRef::<Div>::new();
    let (error, set_error) = signal(None::<WebError>);
    Effect::new(move |_| {
        let Some(element) = container.get() else {
            return;
        };
        let Some(identity) = get_identity() else {
            set_error.set(Some(WebError::Js(format!("{name} is unavailable right now"))));
            return;
        };
        if let Err(err) = mount(&identity, &element) {
            tracing::error!("Failed to show {name}: {err}");
            set_error.set(Some(err));
            return;
        }
        let mounted = SendWrapper::new((identity, element));
        on_cleanup(move || {
            let (identity, element) = mounted.take();
            if let Err(err) = unmount(&identity, &element) {
                tracing::warn!("Failed to remove {name}: {err}");
            }
        });
    });

    view! {
        <div class="auth-container">
            <div node_ref=container></div>
            {move || error.get().map(|err| view! { <div class="error">{err.user_message()}</div> })}
        </div>
    }
}

#[component]
pub fn SignInPage() -> impl IntoView {
    tracing::info!("Rendering SignInPage");

    identity_widget(
        "Sign-in",
        ClerkCredentials::mount_sign_in,
        ClerkCredentials::unmount_sign_in,
    )
}

#[component]
pub fn SignUpPage() -> impl IntoView {
    tracing::info!("Rendering SignUpPage");

    identity_widget(
        "Sign-up",
        ClerkCredentials::mount_sign_up,
        ClerkCredentials::unmount_sign_up,
    )
}
