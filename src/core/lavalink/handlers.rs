//! Handler registry: operation tag to handler function.
//!
//! The registry is frozen once built. The dispatch loop looks up each frame's
//! `op` here and awaits the matching handler inline, so handlers run one at a
//! time in frame order.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use super::error::HandlerError;

/// Future returned by a handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send>>;

/// Handler for one operation tag. Receives the full raw frame payload.
pub type MessageHandlerFunc = Arc<dyn Fn(Bytes) -> HandlerFuture + Send + Sync>;

/// Immutable mapping from operation tag to handler.
#[derive(Clone, Default)]
pub struct MessageHandlers {
    handlers: HashMap<String, MessageHandlerFunc>,
}

impl MessageHandlers {
    pub fn builder() -> MessageHandlersBuilder {
        MessageHandlersBuilder::default()
    }

    /// Registry with no handlers; the dispatch loop exits immediately with it.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, operation: &str) -> Option<&MessageHandlerFunc> {
        self.handlers.get(operation)
    }

    pub fn contains(&self, operation: &str) -> bool {
        self.handlers.contains_key(operation)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl fmt::Debug for MessageHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut operations: Vec<&str> = self.operations().collect();
        operations.sort_unstable();
        f.debug_struct("MessageHandlers")
            .field("operations", &operations)
            .finish()
    }
}

/// Collects handlers before the registry is frozen.
///
/// Registering the same tag twice keeps the last handler.
#[derive(Default)]
pub struct MessageHandlersBuilder {
    handlers: HashMap<String, MessageHandlerFunc>,
}

impl MessageHandlersBuilder {
    /// Register a handler that receives the raw payload.
    pub fn on<F, Fut>(mut self, operation: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let handler: MessageHandlerFunc =
            Arc::new(move |payload: Bytes| -> HandlerFuture { Box::pin(handler(payload)) });
        self.handlers.insert(operation.into(), handler);
        self
    }

    /// Register a handler that receives the payload decoded as `T`.
    ///
    /// A payload that does not decode into `T` counts as a handler failure.
    pub fn on_json<T, F, Fut>(self, operation: impl Into<String>, handler: F) -> Self
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        self.on(operation, move |payload: Bytes| {
            let handler = handler.clone();
            async move {
                match serde_json::from_slice::<T>(&payload) {
                    Ok(message) => handler(message).await,
                    Err(e) => Err(e.into()),
                }
            }
        })
    }

    /// Register a pre-built handler function.
    pub fn on_func(mut self, operation: impl Into<String>, handler: MessageHandlerFunc) -> Self {
        self.handlers.insert(operation.into(), handler);
        self
    }

    pub fn build(self) -> MessageHandlers {
        MessageHandlers {
            handlers: self.handlers,
        }
    }
}
