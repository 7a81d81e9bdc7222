//! Types for communication between the backend and frontend.

pub mod request;
pub mod response;
pub mod timestamp;

/// Path prefix shared by every backend endpoint.
pub const API_PREFIX: &str = "/api/v1";
