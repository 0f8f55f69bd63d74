//! Session and authentication for the billing platform API
//!
//! Provides the durable session store (access/refresh token pair plus the
//! cached user profile) and the authentication service calls. This crate is
//! a standalone library with no dependency on the request pipeline — it can
//! be tested and used independently.
//!
//! Session flow:
//! 1. Front-end calls `service::login()` or `service::register()`
//! 2. The returned session is persisted via `store::SessionStore::save()`
//! 3. The pipeline reads the access token from the store per request
//! 4. On an expired access token, `service::refresh()` exchanges the
//!    refresh token for a new pair
//! 5. The rotated pair is saved via `store::SessionStore::update_tokens()`
//! 6. Logout (voluntary or forced) calls `store::SessionStore::clear()`

pub mod error;
pub mod service;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use service::{login, refresh, register};
pub use store::SessionStore;
pub use types::{AuthResponse, LoginRequest, RegisterRequest, Role, Session, UserProfile};
