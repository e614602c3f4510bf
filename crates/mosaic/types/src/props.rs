//! Application props
//!
//! Props are resolved once, right before bootstrap, and the resolved value is
//! handed to every lifecycle hook afterwards.

use crate::error::BoxError;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Resolved props value
pub type Props = Value;

type PropsProducer = Arc<dyn Fn() -> BoxFuture<'static, Result<Value, BoxError>> + Send + Sync>;

/// Where an application's props come from
#[derive(Clone, Default)]
pub enum PropsSource {
    /// No props supplied
    #[default]
    Empty,

    /// A plain value
    Value(Value),

    /// A zero-argument producer, invoked once during bootstrap
    Producer(PropsProducer),
}

impl PropsSource {
    pub fn producer<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Value, BoxError>> + Send + 'static,
    {
        PropsSource::Producer(Arc::new(move || Box::pin(f())))
    }

    /// Resolve to the value handed to lifecycle hooks.
    ///
    /// Structured values (objects, arrays) are used as-is; scalars and an
    /// absent source resolve to an empty object.
    pub async fn resolve(&self) -> Result<Props, BoxError> {
        match self {
            PropsSource::Empty => Ok(empty()),
            PropsSource::Value(value @ (Value::Object(_) | Value::Array(_))) => Ok(value.clone()),
            PropsSource::Value(_) => Ok(empty()),
            PropsSource::Producer(produce) => produce().await,
        }
    }
}

fn empty() -> Value {
    Value::Object(Map::new())
}

impl From<Value> for PropsSource {
    fn from(value: Value) -> Self {
        PropsSource::Value(value)
    }
}

impl fmt::Debug for PropsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropsSource::Empty => f.write_str("Empty"),
            PropsSource::Value(v) => f.debug_tuple("Value").field(v).finish(),
            PropsSource::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}
