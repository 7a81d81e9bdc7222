//! Per-screen fetch state.
//!
//! Each activation of a screen gets a fresh [`Activation`]. Results are only applied while
//! their activation is still the current one, so a slow response from an earlier visit
//! (or from a previous user) cannot overwrite what the viewer is looking at now.

use crate::{
    context::session::Session,
    error::{WebError, WebResult},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ViewState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Failed(WebError),
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(data) => Some(data),
            _ => None,
        }
    }
}

/// Whether a screen's data needs a signed-in viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    SignedIn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    generation: u64,
    subject_id: Option<String>,
}

impl Activation {
    pub fn subject_id(&self) -> Option<&str> {
        self.subject_id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewController<T> {
    state: ViewState<T>,
    current: Option<Activation>,
    generation: u64,
}

impl<T> Default for ViewController<T> {
    fn default() -> Self {
        Self {
            state: ViewState::Idle,
            current: None,
            generation: 0,
        }
    }
}

impl<T> ViewController<T> {
    pub fn state(&self) -> &ViewState<T> {
        &self.state
    }

    /// Starts a new activation and moves to `Loading`, superseding any fetch in flight.
    ///
    /// Returns `None` when nothing should be fetched: the data needs a signed-in viewer and
    /// the session is still pending or signed out.
    pub fn activate(&mut self, session: &Session, access: Access) -> Option<Activation> {
        self.generation += 1;
        if access == Access::SignedIn && !session.is_signed_in() {
            tracing::debug!("Not fetching, session is {session:?}");
            self.current = None;
            self.state = ViewState::Idle;
            return None;
        }
        let activation = Activation {
            generation: self.generation,
            subject_id: session.subject_id().map(str::to_string),
        };
        self.current = Some(activation.clone());
        self.state = ViewState::Loading;
        Some(activation)
    }

    /// Applies a fetch result if `activation` is still current. Returns whether it was applied.
    pub fn resolve(&mut self, activation: &Activation, result: WebResult<T>) -> bool {
        if self.current.as_ref() != Some(activation) {
            tracing::debug!(
                "Discarding stale result from activation {}",
                activation.generation
            );
            return false;
        }
        self.state = match result {
            Ok(data) => ViewState::Loaded(data),
            Err(err) => ViewState::Failed(err),
        };
        true
    }

    /// The screen went away. Anything still in flight is discarded.
    pub fn deactivate(&mut self) {
        self.generation += 1;
        self.current = None;
    }
}
