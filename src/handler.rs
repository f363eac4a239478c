//! Action trait and type erasure.
//!
//! A route node's action table has to hold handlers of *different* concrete
//! types in one collection, so the typed world is bridged to a trait-object
//! world once, at registration time:
//!
//! ```text
//! async fn list(req: Request) -> Response { … }    ← application code
//!        ↓ ActionDef::handler(list)
//! Arc::new(FnAction(list))                         ← stored as ActionFn
//!        ↓
//! action.call(req)  at request time                ← one vtable dispatch
//! ```
//!
//! The per-request cost is one `Arc` clone plus one virtual call.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future resolving to a [`Response`].
///
/// `Pin<Box<…>>` because the runtime polls the future in place; `Send +
/// 'static` so tokio may move it across worker threads.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public [`Action`] trait. External crates cannot
/// usefully interact with it.
#[doc(hidden)]
pub trait ErasedAction {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A shared, type-erased action handler.
#[doc(hidden)]
pub type ActionFn = Arc<dyn ErasedAction + Send + Sync + 'static>;

/// Implemented for every valid action handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` with the signature:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// The trait is sealed: only the blanket impl below can satisfy it, which
/// keeps the handler contract stable across versions.
pub trait Action: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_action_fn(self) -> ActionFn;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Action for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_action_fn(self) -> ActionFn {
        Arc::new(FnAction(self))
    }
}

/// Newtype holding a concrete handler `F`, implementing [`ErasedAction`].
struct FnAction<F>(F);

impl<F, Fut, R> ErasedAction for FnAction<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
