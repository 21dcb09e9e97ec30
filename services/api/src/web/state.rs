//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use nightfall_core::ports::{DatabaseService, IdentityService};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub identity: Arc<dyn IdentityService>,
    pub config: Arc<Config>,
}
