//! Client-side state: the session, the authentication signal, and the
//! caches views render from.
//!
//! DESIGN
//! ======
//! Layering, bottom up:
//!
//! - `session` persists the credential and per-user artifacts.
//! - `auth` owns the `AuthState` signal and keeps it consistent with the
//!   session.
//! - `optimistic` applies a reversible change before a remote call and
//!   rolls it back on failure.
//! - `contacts` and `profile` drive the REST API and report outcomes through
//!   `notices`.
//!
//! Every authenticated call passes its result through
//! `AuthCoordinator::guard`, so a 401 anywhere ends the session.

pub mod auth;
pub mod contacts;
pub mod notices;
pub mod optimistic;
pub mod profile;
pub mod session;
