//! Page provider contract
//!
//! A provider turns one parameter into one page. The engine may abandon a
//! call at any await point (its task is aborted when a reset supersedes
//! it), so providers should not rely on running to completion.

use crate::types::Page;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Fetches a single page for a parameter
#[async_trait]
pub trait PageProvider<P, T>: Send + Sync + 'static {
    /// Error surfaced into `State::Loaded { error, .. }` on failure
    type Error: Send + Sync + 'static;

    /// Fetch the page identified by `parameter`
    async fn fetch(&self, parameter: P) -> Result<Page<P, T>, Self::Error>;
}

#[async_trait]
impl<P, T, Pr> PageProvider<P, T> for Arc<Pr>
where
    P: Send + 'static,
    T: Send + 'static,
    Pr: PageProvider<P, T> + ?Sized,
{
    type Error = Pr::Error;

    async fn fetch(&self, parameter: P) -> Result<Page<P, T>, Self::Error> {
        (**self).fetch(parameter).await
    }
}

/// Provider backed by an async closure, see [`provider_fn`]
#[derive(Clone)]
pub struct FnProvider<F> {
    f: F,
}

impl<F> std::fmt::Debug for FnProvider<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnProvider").finish_non_exhaustive()
    }
}

/// Wrap an async closure `Fn(P) -> Future<Output = Result<Page<P, T>, E>>`
/// as a [`PageProvider`]
///
/// ```rust
/// use pagefeed::{provider_fn, Page};
///
/// let provider = provider_fn(|offset: u32| async move {
///     let elements: Vec<u32> = (offset..offset + 5).collect();
///     Ok::<_, String>(Page::more(offset + 5, elements))
/// });
/// # let _ = provider;
/// ```
pub fn provider_fn<F>(f: F) -> FnProvider<F> {
    FnProvider { f }
}

#[async_trait]
impl<P, T, E, F, Fut> PageProvider<P, T> for FnProvider<F>
where
    P: Send + 'static,
    T: Send + 'static,
    E: Send + Sync + 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Page<P, T>, E>> + Send + 'static,
{
    type Error = E;

    async fn fetch(&self, parameter: P) -> Result<Page<P, T>, E> {
        (self.f)(parameter).await
    }
}
