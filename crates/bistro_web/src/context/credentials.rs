//! Access to the third-party identity provider.
//!
//! The provider owns sign-in, sign-up and token refresh. This crate only reads the
//! session it reports and asks it for a bearer token right before each authenticated call.

use crate::{
    config::{AFTER_SIGN_IN_PATH, SIGN_IN_PATH, SIGN_UP_PATH},
    context::session::Session,
    error::{WebError, WebResult},
};
use async_trait::async_trait;
use js_sys::{Function, Object, Promise, Reflect};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

#[async_trait(?Send)]
pub trait CredentialProvider {
    /// The current session. Cheap, never blocks.
    fn session(&self) -> Session;

    /// Registers a listener called whenever the session may have changed.
    fn subscribe(&self, listener: Box<dyn Fn(Session)>);

    /// A short-lived bearer token, `None` when signed out.
    async fn token(&self) -> Result<Option<String>, String>;
}

/// Used when no identity provider could be found on the page. Everyone is signed out.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousCredentials;

#[async_trait(?Send)]
impl CredentialProvider for AnonymousCredentials {
    fn session(&self) -> Session {
        Session::SignedOut
    }

    fn subscribe(&self, _listener: Box<dyn Fn(Session)>) {}

    async fn token(&self) -> Result<Option<String>, String> {
        Ok(None)
    }
}

/// Bridge to the Clerk browser SDK exposed as `window.Clerk`.
#[derive(Debug, Clone)]
pub struct ClerkCredentials {
    clerk: JsValue,
}

impl ClerkCredentials {
    pub fn from_window() -> WebResult<Self> {
        let clerk = get(&js_sys::global(), "Clerk")?;
        if clerk.is_undefined() || clerk.is_null() {
            return Err(WebError::Js(
                "The identity provider script was not loaded (window.Clerk is missing)".to_string(),
            ));
        }
        Ok(Self { clerk })
    }

    /// Resolves once the SDK knows whether someone is signed in.
    pub async fn load(&self) -> WebResult<()> {
        tracing::info!("Loading identity provider");
        self.call_async("load", &[]).await?;
        tracing::info!("Identity provider loaded");
        Ok(())
    }

    pub async fn sign_out(&self) -> WebResult<()> {
        tracing::info!("Signing out");
        self.call_async("signOut", &[]).await?;
        Ok(())
    }

    /// Renders the provider's sign-in widget into `element`.
    pub fn mount_sign_in(&self, element: &web_sys::HtmlElement) -> WebResult<()> {
        let props = Object::new();
        set(&props, "path", SIGN_IN_PATH)?;
        set(&props, "routing", "path")?;
        set(&props, "signUpUrl", SIGN_UP_PATH)?;
        set(&props, "afterSignInUrl", AFTER_SIGN_IN_PATH)?;
        self.call("mountSignIn", &[JsValue::from(element.clone()), props.into()])?;
        Ok(())
    }

    pub fn unmount_sign_in(&self, element: &web_sys::HtmlElement) -> WebResult<()> {
        self.call("unmountSignIn", &[JsValue::from(element.clone())])?;
        Ok(())
    }

    /// Renders the provider's sign-up widget into `element`.
    pub fn mount_sign_up(&self, element: &web_sys::HtmlElement) -> WebResult<()> {
        let props = Object::new();
        set(&props, "path", SIGN_UP_PATH)?;
        set(&props, "routing", "path")?;
        set(&props, "signInUrl", SIGN_IN_PATH)?;
        set(&props, "afterSignUpUrl", AFTER_SIGN_IN_PATH)?;
        self.call("mountSignUp", &[JsValue::from(element.clone()), props.into()])?;
        Ok(())
    }

    pub fn unmount_sign_up(&self, element: &web_sys::HtmlElement) -> WebResult<()> {
        self.call("unmountSignUp", &[JsValue::from(element.clone())])?;
        Ok(())
    }

    fn call(&self, name: &str, args: &[JsValue]) -> WebResult<JsValue> {
        call_method(&self.clerk, name, args)
    }

    async fn call_async(&self, name: &str, args: &[JsValue]) -> WebResult<JsValue> {
        let promise: Promise = self.call(name, args)?.dyn_into().map_err(WebError::from)?;
        let value = JsFuture::from(promise).await?;
        Ok(value)
    }
}

#[async_trait(?Send)]
impl CredentialProvider for ClerkCredentials {
    fn session(&self) -> Session {
        read_session(&self.clerk)
    }

    fn subscribe(&self, listener: Box<dyn Fn(Session)>) {
        let clerk = self.clerk.clone();
        let callback = Closure::<dyn FnMut(JsValue)>::new(move |_resources: JsValue| {
            listener(read_session(&clerk));
        });
        match call_method(&self.clerk, "addListener", &[callback.as_ref().clone()]) {
            // the listener lives as long as the page
            Ok(_) => callback.forget(),
            Err(err) => tracing::error!("Failed to subscribe to session changes: {err}"),
        }
    }

    async fn token(&self) -> Result<Option<String>, String> {
        let session = get(&self.clerk, "session").map_err(|err| err.to_string())?;
        if !session.is_object() {
            return Ok(None);
        }
        let promise: Promise = call_method(&session, "getToken", &[])
            .map_err(|err| err.to_string())?
            .dyn_into()
            .map_err(|err| format!("getToken did not return a promise: {err:?}"))?;
        let token = JsFuture::from(promise)
            .await
            .map_err(|err| format!("{err:?}"))?;
        Ok(token.as_string())
    }
}

fn read_session(clerk: &JsValue) -> Session {
    let loaded = get(clerk, "loaded")
        .ok()
        .and_then(|loaded| loaded.as_bool())
        .unwrap_or_default();
    if !loaded {
        return Session::Pending;
    }
    let user_id = get(clerk, "user")
        .ok()
        .filter(JsValue::is_object)
        .and_then(|user| get(&user, "id").ok())
        .and_then(|id| id.as_string());
    match user_id {
        Some(subject_id) => Session::SignedIn { subject_id },
        None => Session::SignedOut,
    }
}

fn get(target: &JsValue, key: &str) -> WebResult<JsValue> {
    Reflect::get(target, &JsValue::from_str(key)).map_err(WebError::from)
}

fn set(target: &Object, key: &str, value: &str) -> WebResult<()> {
    Reflect::set(target, &JsValue::from_str(key), &JsValue::from_str(value))?;
    Ok(())
}

fn call_method(target: &JsValue, name: &str, args: &[JsValue]) -> WebResult<JsValue> {
    let function: Function = get(target, name)?
        .dyn_into()
        .map_err(|_| WebError::Js(format!("Identity provider has no method `{name}`")))?;
    let args = args.iter().collect::<js_sys::Array>();
    let value = function.apply(target, &args)?;
    Ok(value)
}
