//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::token::TokenAuthenticator;
use nearserve_core::ports::{IdentityProvider, Store};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
    pub tokens: TokenAuthenticator,
    /// `None` when the Google OAuth variables are absent from the
    /// environment; the callback endpoint then refuses to run.
    pub identity: Option<Arc<dyn IdentityProvider>>,
}
