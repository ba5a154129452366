//! Handler trait and type erasure.
//!
//! A route handler is any `async fn(Request) -> Result<Response, ApiError>`.
//! The dispatch table has to store handlers of *different* concrete types in
//! one structure, so each handler is erased behind `dyn ErasedHandler`:
//!
//! ```text
//! async fn post_hello(req: Request) -> Result<Response, ApiError> { … }
//!        ↓ Route::post("/hello", post_hello)
//! post_hello.into_boxed_handler()        ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(post_hello))        ← stored as BoxedHandler
//!        ↓
//! handler.call(req)  at request time     ← one Arc clone + one virtual call
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::ApiError;
use crate::request::Request;
use crate::response::Response;

/// A heap-allocated, type-erased future resolving to the handler's result.
///
/// `Send + 'static` so tokio may move it across worker threads.
pub(crate) type BoxFuture =
    Pin<Box<dyn Future<Output = Result<Response, ApiError>> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` with the signature:
///
/// ```text
/// async fn name(req: Request) -> Result<Response, ApiError>
/// ```
///
/// The trait is sealed: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, ApiError>> + Send + 'static,
{
}

impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, ApiError>> + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Newtype holding a concrete handler `F`, bridging it into the trait-object
/// world.
struct FnHandler<F>(F);

impl<F, Fut> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, ApiError>> + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        Box::pin((self.0)(req))
    }
}
