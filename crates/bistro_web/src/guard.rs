//! Deciding whether a protected page may be shown.

use crate::context::session::Session;

/// A navigation request. `replace` swaps the current history entry instead of pushing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: String,
    pub replace: bool,
}

pub trait Navigator {
    fn navigate(&self, redirect: &Redirect);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still loading: show a placeholder and wait.
    Pending,
    Denied(Redirect),
    Allowed,
}

pub fn decide(session: &Session, sign_in_path: &str) -> GuardDecision {
    match session {
        Session::Pending => GuardDecision::Pending,
        Session::SignedOut => GuardDecision::Denied(Redirect {
            to: sign_in_path.to_string(),
            // back navigation must not land on the protected page again
            replace: true,
        }),
        Session::SignedIn { .. } => GuardDecision::Allowed,
    }
}

/// Re-evaluated on every session change. Redirects once per stretch of being denied.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    sign_in_path: String,
    redirected: bool,
}

impl RouteGuard {
    pub fn new(sign_in_path: impl Into<String>) -> Self {
        Self {
            sign_in_path: sign_in_path.into(),
            redirected: false,
        }
    }

    pub fn evaluate(&mut self, session: &Session, navigator: &dyn Navigator) -> GuardDecision {
        let decision = decide(session, &self.sign_in_path);
        match &decision {
            GuardDecision::Denied(redirect) => {
                if !self.redirected {
                    tracing::info!("Redirecting to {}", redirect.to);
                    navigator.navigate(redirect);
                    self.redirected = true;
                }
            }
            GuardDecision::Pending | GuardDecision::Allowed => self.redirected = false,
        }
        decision
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{config::SIGN_IN_PATH, testing::RecordingNavigator};

    #[test]
    fn pending_never_redirects() {
        let navigator = RecordingNavigator::default();
        let mut guard = RouteGuard::new(SIGN_IN_PATH);

        for _ in 0..3 {
            assert_eq!(guard.evaluate(&Session::Pending, &navigator), GuardDecision::Pending);
        }
        assert!(navigator.redirects().is_empty());
    }

    #[test]
    fn signed_out_redirects_exactly_once_replacing_history() {
        let navigator = RecordingNavigator::default();
        let mut guard = RouteGuard::new(SIGN_IN_PATH);

        guard.evaluate(&Session::Pending, &navigator);
        let decision = guard.evaluate(&Session::SignedOut, &navigator);
        guard.evaluate(&Session::SignedOut, &navigator);

        let expected = Redirect {
            to: "/sign-in".to_string(),
            replace: true,
        };
        assert_eq!(decision, GuardDecision::Denied(expected.clone()));
        assert_eq!(navigator.redirects(), vec![expected]);
    }

    #[test]
    fn signed_in_renders_without_redirect() {
        let navigator = RecordingNavigator::default();
        let mut guard = RouteGuard::new(SIGN_IN_PATH);

        let decision = guard.evaluate(&Session::signed_in("user_1"), &navigator);

        assert_eq!(decision, GuardDecision::Allowed);
        assert!(navigator.redirects().is_empty());
    }

    #[test]
    fn signing_out_again_redirects_again() {
        let navigator = RecordingNavigator::default();
        let mut guard = RouteGuard::new(SIGN_IN_PATH);

        guard.evaluate(&Session::SignedOut, &navigator);
        guard.evaluate(&Session::signed_in("user_1"), &navigator);
        guard.evaluate(&Session::SignedOut, &navigator);

        assert_eq!(navigator.redirects().len(), 2);
    }

    #[test]
    fn follows_provider_session_changes() {
        use crate::{context::credentials::CredentialProvider, testing::FakeCredentials};
        use std::{cell::RefCell, rc::Rc};

        let credentials = FakeCredentials::signed_in("user_1");
        let navigator = Rc::new(RecordingNavigator::default());
        let guard = Rc::new(RefCell::new(RouteGuard::new(SIGN_IN_PATH)));
        let decisions = Rc::new(RefCell::new(Vec::new()));
        {
            let (navigator, guard, decisions) = (navigator.clone(), guard.clone(), decisions.clone());
            credentials.subscribe(Box::new(move |session| {
                let decision = guard.borrow_mut().evaluate(&session, navigator.as_ref());
                decisions.borrow_mut().push(decision);
            }));
        }

        credentials.set_session(Session::SignedOut);
        credentials.set_session(Session::SignedOut);

        assert_eq!(decisions.borrow().len(), 2);
        assert_eq!(navigator.redirects().len(), 1);
        assert_eq!(credentials.session(), Session::SignedOut);
    }
}
