//! Build-time configuration.
//!
//! The app runs in the browser, so there is no process environment to read at runtime.
//! Values are baked in from the build environment instead.

use crate::error::{WebError, WebResult};
use bistro_api::API_PREFIX;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:5001";

/// Where unauthenticated viewers are sent.
pub const SIGN_IN_PATH: &str = "/sign-in";
pub const SIGN_UP_PATH: &str = "/sign-up";
/// Where the identity provider sends the viewer after signing in.
pub const AFTER_SIGN_IN_PATH: &str = "/menu";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: Url,
}

impl ApiConfig {
    pub fn new(base_url: &str) -> WebResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| WebError::invalid(format!("Invalid API URL {base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(WebError::invalid(format!(
                "Invalid API URL {base_url}: not a base URL"
            )));
        }
        Ok(Self { base_url })
    }

    /// Reads `BISTRO_API_URL` from the build environment.
    pub fn from_env() -> WebResult<Self> {
        Self::new(option_env!("BISTRO_API_URL").unwrap_or(DEFAULT_API_URL))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds `{base}{API_PREFIX}/{segments...}`, percent-encoding each segment.
    pub fn endpoint(&self, segments: &[&str]) -> WebResult<Url> {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| WebError::invalid("API URL cannot have a path"))?;
            path.pop_if_empty();
            path.extend(API_PREFIX.split('/').filter(|s| !s.is_empty()));
            path.extend(segments);
        }
        Ok(url)
    }

    pub fn endpoint_with_query<K, V>(&self, segments: &[&str], query: &[(K, V)]) -> WebResult<Url>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut url = self.endpoint(segments)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key.as_ref(), value.as_ref());
            }
        }
        Ok(url)
    }
}
