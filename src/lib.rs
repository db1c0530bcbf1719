//! Client core for a contact-management REST backend.
//!
//! DESIGN
//! ======
//! The crate is the non-visual half of a contacts client: session
//! persistence, the authentication signal, and the contact and profile
//! caches a front end renders from. `main.rs` is one such front end, a
//! command-line tool; the library makes no assumption about which one.
//!
//! - `config`: environment-driven settings.
//! - `storage`: `localStorage`-shaped key/value backends.
//! - `net`: wire types, error taxonomy, and the `RemoteApi` client.
//! - `state`: session store, auth coordinator, optimistic updates, contacts,
//!   profile.
//! - `app`: the context object wiring it all together.

pub mod app;
pub mod config;
pub mod net;
pub mod state;
pub mod storage;

#[cfg(test)]
pub mod test_helpers;
