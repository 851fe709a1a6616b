//! Tableau REST API client and authentication.
//!
//! This module provides the [`TableauClient`] for interacting with the Tableau
//! REST API, site-scoped [`Session`]s, and [`PersonalAccessToken`] credentials.

mod auth;
mod tableau;

pub use auth::PersonalAccessToken;
pub use tableau::{
    MIN_TOKEN_API_VERSION, ProductVersion, ServerInfo, Session, TableauClient, parse_api_version,
    supports_personal_access_tokens,
};
