//! Optimistic mutation helper.
//!
//! A [`Transition`] is applied to the shared state before the remote call is
//! issued. If the call fails, the transition's inverse is applied to the
//! state as it is *at failure time*, not to a snapshot, so edits made while
//! the call was in flight survive the rollback.

#[cfg(test)]
#[path = "optimistic_test.rs"]
mod optimistic_test;

use std::future::Future;

use tokio::sync::RwLock;

use super::notices::Notices;
use crate::net::ApiError;

/// A pure, reversible state change.
pub trait Transition<S> {
    fn apply(&self, state: &mut S);
    fn revert(&self, state: &mut S);
}

/// A [`Transition`] built from a pair of closures.
pub struct Reversible<F, G> {
    apply: F,
    revert: G,
}

impl<F, G> Reversible<F, G> {
    pub fn new<S>(apply: F, revert: G) -> Self
    where
        F: Fn(&mut S),
        G: Fn(&mut S),
    {
        Self { apply, revert }
    }
}

impl<S, F, G> Transition<S> for Reversible<F, G>
where
    F: Fn(&mut S),
    G: Fn(&mut S),
{
    fn apply(&self, state: &mut S) {
        (self.apply)(state);
    }

    fn revert(&self, state: &mut S) {
        (self.revert)(state);
    }
}

/// Apply `transition`, then run `remote`. On failure, revert and post
/// `failure_message` as an error notice.
///
/// # Errors
///
/// Returns the remote call's error after the rollback.
pub async fn run<S, T, R, F, Fut>(
    state: &RwLock<S>,
    notices: &Notices,
    transition: &T,
    failure_message: &str,
    remote: F,
) -> Result<R, ApiError>
where
    T: Transition<S> + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<R, ApiError>>,
{
    transition.apply(&mut *state.write().await);

    match remote().await {
        Ok(value) => Ok(value),
        Err(e) => {
            transition.revert(&mut *state.write().await);
            tracing::warn!(error = %e, "optimistic update rolled back");
            notices.error(failure_message);
            Err(e)
        }
    }
}
