pub mod client;
pub mod credentials;
pub mod session;

use self::{
    client::Client,
    credentials::{AnonymousCredentials, ClerkCredentials, CredentialProvider},
    session::Session,
};
use crate::{config::ApiConfig, error::WebResult, transport::BrowserTransport};
use leptos::prelude::*;
use send_wrapper::SendWrapper;
use std::rc::Rc;

pub fn initialise_context() -> WebResult<()> {
    tracing::trace!("initialising context");

    let config = ApiConfig::from_env()?;
    tracing::info!("Using backend at {}", config.base_url());

    let session = RwSignal::new(Session::Pending);
    let identity = match ClerkCredentials::from_window() {
        Ok(clerk) => Some(clerk),
        Err(err) => {
            tracing::error!("Continuing without sign-in: {err}");
            None
        }
    };
    let credentials: Rc<dyn CredentialProvider> = match &identity {
        Some(clerk) => Rc::new(clerk.clone()),
        None => Rc::new(AnonymousCredentials),
    };

    credentials.subscribe(Box::new(move |current: Session| {
        tracing::info!("Session changed: {current:?}");
        session.set(current);
    }));
    session.set(credentials.session());
    if let Some(clerk) = identity.clone() {
        leptos::task::spawn_local(async move {
            match clerk.load().await {
                Ok(()) => session.set(clerk.session()),
                Err(err) => {
                    tracing::error!("Failed to load the identity provider: {err}");
                    session.set(Session::SignedOut);
                }
            }
        });
    }

    let client = Client::new(config, Rc::new(BrowserTransport), credentials);
    leptos::context::provide_context(session);
    leptos::context::provide_context(SendWrapper::new(client));
    leptos::context::provide_context(SendWrapper::new(identity));
    Ok(())
}

pub fn get_client() -> Client {
    leptos::prelude::expect_context::<SendWrapper<Client>>().take()
}

pub fn get_session() -> RwSignal<Session> {
    leptos::prelude::expect_context::<RwSignal<Session>>()
}

/// The identity provider, if one was found on the page.
pub fn get_identity() -> Option<ClerkCredentials> {
    leptos::prelude::use_context::<SendWrapper<Option<ClerkCredentials>>>()
        .and_then(SendWrapper::take)
}
