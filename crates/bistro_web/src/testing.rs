//! In-memory stand-ins for the network and the identity provider.

use crate::{
    config::ApiConfig,
    context::{client::Client, credentials::CredentialProvider, session::Session},
    guard::{Navigator, Redirect},
    transport::{HttpRequest, HttpResponse, Transport, TransportError},
};
use async_trait::async_trait;
use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
};

#[derive(Default)]
pub struct FakeTransport {
    responses: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn respond_json(&self, status: u16, body: serde_json::Value) {
        self.respond_raw(status, &body.to_string());
    }

    pub fn respond_raw(&self, status: u16, body: &str) {
        self.responses.borrow_mut().push_back(Ok(HttpResponse {
            status,
            body: body.as_bytes().to_vec(),
        }));
    }

    pub fn fail(&self, message: &str) {
        self.responses
            .borrow_mut()
            .push_back(Err(TransportError(message.to_string())));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.borrow_mut().push(request);
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError("no scripted response".to_string())))
    }
}

pub struct FakeCredentials {
    session: RefCell<Session>,
    tokens: RefCell<VecDeque<Result<Option<String>, String>>>,
    token_calls: Cell<usize>,
    listeners: RefCell<Vec<Box<dyn Fn(Session)>>>,
}

impl FakeCredentials {
    pub fn signed_out() -> Self {
        Self {
            session: RefCell::new(Session::SignedOut),
            tokens: RefCell::default(),
            token_calls: Cell::new(0),
            listeners: RefCell::default(),
        }
    }

    /// Signed in as `subject_id`, handing out `token-1`, `token-2`, ... unless scripted otherwise.
    pub fn signed_in(subject_id: &str) -> Self {
        let credentials = Self::signed_out();
        *credentials.session.borrow_mut() = Session::signed_in(subject_id);
        credentials
    }

    pub fn push_token(&self, token: Result<Option<String>, String>) {
        self.tokens.borrow_mut().push_back(token);
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.get()
    }

    pub fn set_session(&self, session: Session) {
        *self.session.borrow_mut() = session.clone();
        for listener in self.listeners.borrow().iter() {
            listener(session.clone());
        }
    }
}

#[async_trait(?Send)]
impl CredentialProvider for FakeCredentials {
    fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    fn subscribe(&self, listener: Box<dyn Fn(Session)>) {
        self.listeners.borrow_mut().push(listener);
    }

    async fn token(&self) -> Result<Option<String>, String> {
        let call = self.token_calls.get() + 1;
        self.token_calls.set(call);
        if let Some(token) = self.tokens.borrow_mut().pop_front() {
            return token;
        }
        Ok(self
            .session
            .borrow()
            .is_signed_in()
            .then(|| format!("token-{call}")))
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    redirects: RefCell<Vec<Redirect>>,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> Vec<Redirect> {
        self.redirects.borrow().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, redirect: &Redirect) {
        self.redirects.borrow_mut().push(redirect.clone());
    }
}

pub fn client(transport: &Rc<FakeTransport>, credentials: &Rc<FakeCredentials>) -> Client {
    let config = ApiConfig::new("http://localhost:5001").expect("valid test URL");
    Client::new(config, transport.clone(), credentials.clone())
}
