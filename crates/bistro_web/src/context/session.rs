//! The viewer's sign-in status as reported by the identity provider.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Session {
    /// The identity provider has not finished loading.
    #[default]
    Pending,
    SignedOut,
    SignedIn { subject_id: String },
}

impl Session {
    pub fn signed_in(subject_id: impl Into<String>) -> Self {
        Self::SignedIn {
            subject_id: subject_id.into(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }

    /// `None` until the session has loaded.
    pub fn logged_in(&self) -> Option<bool> {
        match self {
            Self::Pending => None,
            Self::SignedOut => Some(false),
            Self::SignedIn { .. } => Some(true),
        }
    }

    pub fn subject_id(&self) -> Option<&str> {
        match self {
            Self::SignedIn { subject_id } => Some(subject_id),
            _ => None,
        }
    }
}
