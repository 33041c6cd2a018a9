//! Boxed futures and streams that are `Send` on native targets and local on
//! `wasm32`, where neither `reqwest` nor the browser timers are `Send`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::Stream;

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use std::sync::Arc;
    use std::time::Duration;

    pub type BoxFuture<'a, T> = futures::future::BoxFuture<'a, T>;
    pub type BoxStream<'a, T> = futures::stream::BoxStream<'a, T>;
    pub type SleepFn = dyn Fn(Duration) -> BoxFuture<'static, ()> + Send + Sync;

    /// `Send` on native targets.
    pub trait MaybeSend: Send {}
    impl<T: Send> MaybeSend for T {}

    /// `Sync` on native targets.
    pub trait MaybeSync: Sync {}
    impl<T: Sync> MaybeSync for T {}

    pub fn sleeper<F>(f: F) -> Arc<SleepFn>
    where
        F: Fn(Duration) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        Arc::new(f)
    }
}

#[cfg(target_arch = "wasm32")]
mod imp {
    use std::sync::Arc;
    use std::time::Duration;

    pub type BoxFuture<'a, T> = futures::future::LocalBoxFuture<'a, T>;
    pub type BoxStream<'a, T> = futures::stream::LocalBoxStream<'a, T>;
    pub type SleepFn = dyn Fn(Duration) -> BoxFuture<'static, ()>;

    /// Implemented by everything on `wasm32`.
    pub trait MaybeSend {}
    impl<T> MaybeSend for T {}

    /// Implemented by everything on `wasm32`.
    pub trait MaybeSync {}
    impl<T> MaybeSync for T {}

    pub fn sleeper<F>(f: F) -> Arc<SleepFn>
    where
        F: Fn(Duration) -> BoxFuture<'static, ()> + 'static,
    {
        Arc::new(f)
    }
}

use imp::sleeper;
pub use imp::{BoxFuture, BoxStream, MaybeSend, MaybeSync, SleepFn};

/// A timer supplied by the embedding runtime, e.g. `tokio::time::sleep`.
pub type Sleeper = Arc<SleepFn>;

pub fn boxed<'a, F>(fut: F) -> BoxFuture<'a, F::Output>
where
    F: Future + MaybeSend + 'a,
{
    Box::pin(fut)
}

pub fn boxed_stream<'a, S>(stream: S) -> BoxStream<'a, S::Item>
where
    S: Stream + MaybeSend + 'a,
{
    Box::pin(stream)
}

/// Convenience for building a [`Sleeper`] out of an async timer function.
pub fn sleep_with<F, Fut>(f: F) -> Sleeper
where
    F: Fn(Duration) -> Fut + MaybeSend + MaybeSync + 'static,
    Fut: Future<Output = ()> + MaybeSend + 'static,
{
    sleeper(move |d| boxed(f(d)))
}
