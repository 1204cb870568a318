//! # Method Binder
//!
//! Turns a schema method into a typed, single-shot asynchronous call.
//!
//! The only thing a bound method knows about the network is the crate-private [`Invoke`]
//! capability: "send this reflected message to this method, give me the reflected
//! response". On top of it, [`UnaryMethod<Req, Res>`] maps typed requests and responses
//! to and from the schema:
//!
//! ```text
//! Req --serde--> JSON --schema--> DynamicMessage --Invoke--> DynamicMessage --> JSON --serde--> Res
//! ```
//!
//! Every invocation settles exactly once: with the decoded response, or with a
//! [`CallError`]. Nothing is retried and no deadline is applied unless the caller asks for
//! one through [`CallOptions`]. Dropping the returned future cancels the call.
use crate::{
    error::{BindError, CallError, CodecError, TransportError},
    grpc::codec,
    schema::SchemaRegistry,
};
use futures_util::future::BoxFuture;
use prost_reflect::{DynamicMessage, MethodDescriptor};
use serde::{Serialize, de::DeserializeOwned};
use std::{fmt, marker::PhantomData, str::FromStr, sync::Arc, time::Duration};
use tonic::metadata::{
    AsciiMetadataKey, AsciiMetadataValue, MetadataMap,
    errors::{InvalidMetadataKey, InvalidMetadataValue},
};

/// The generic dispatch capability behind every bound method.
///
/// Never exposed publicly: callers only see the typed façades.
pub(crate) trait Invoke: Send + Sync + fmt::Debug {
    fn invoke(
        &self,
        method: MethodDescriptor,
        request: DynamicMessage,
        options: CallOptions,
    ) -> BoxFuture<'static, Result<DynamicMessage, TransportError>>;
}

/// Errors that can occur when building [`CallOptions`].
#[derive(thiserror::Error, Debug)]
pub enum CallOptionsError {
    #[error("Invalid metadata (header) key '{key}': '{source}'")]
    InvalidMetadataKey {
        key: String,
        source: InvalidMetadataKey,
    },
    #[error("Invalid metadata (header) value for key '{key}': '{source}'")]
    InvalidMetadataValue {
        key: String,
        source: InvalidMetadataValue,
    },
}

/// Per-call settings.
///
/// The default waits indefinitely and sends no extra metadata.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    timeout: Option<Duration>,
    metadata: MetadataMap,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds the call. The deadline is propagated to the server as `grpc-timeout` and
    /// enforced locally, expiry rejects with `DEADLINE_EXCEEDED`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attaches a metadata (header) entry to the call.
    pub fn with_header(mut self, key: &str, value: &str) -> Result<Self, CallOptionsError> {
        let metadata_key = AsciiMetadataKey::from_str(key).map_err(|source| {
            CallOptionsError::InvalidMetadataKey {
                key: key.to_string(),
                source,
            }
        })?;
        let metadata_value = AsciiMetadataValue::from_str(value).map_err(|source| {
            CallOptionsError::InvalidMetadataValue {
                key: key.to_string(),
                source,
            }
        })?;

        self.metadata.insert(metadata_key, metadata_value);
        Ok(self)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn into_metadata(self) -> MetadataMap {
        self.metadata
    }
}

/// A schema method bound to a transport, typed by its request and response.
pub struct UnaryMethod<Req, Res> {
    invoker: Arc<dyn Invoke>,
    method: MethodDescriptor,
    _types: PhantomData<fn(Req) -> Res>,
}

impl<Req, Res> Clone for UnaryMethod<Req, Res> {
    fn clone(&self) -> Self {
        Self {
            invoker: Arc::clone(&self.invoker),
            method: self.method.clone(),
            _types: PhantomData,
        }
    }
}

impl<Req, Res> fmt::Debug for UnaryMethod<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnaryMethod")
            .field("method", &self.method.full_name())
            .finish()
    }
}

impl<Req, Res> UnaryMethod<Req, Res> {
    /// The schema name of the method (e.g. `QueryBalance`).
    pub fn name(&self) -> &str {
        self.method.name()
    }

    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.method
    }
}

impl<Req, Res> UnaryMethod<Req, Res>
where
    Req: Serialize,
    Res: DeserializeOwned,
{
    /// Invokes the method without deadline or extra metadata.
    pub async fn call(&self, request: Req) -> Result<Res, CallError> {
        self.call_with(request, CallOptions::default()).await
    }

    /// Invokes the method with explicit [`CallOptions`].
    ///
    /// # Returns
    ///
    /// * `Ok(Res)` - The engine answered. Business rejections land here too, with
    ///   `success == false`.
    /// * `Err(CallError::Transport)` - The call did not complete at the transport level.
    /// * `Err(CallError::Codec)` - The request or response did not fit the schema, or a
    ///   scaled decimal field was malformed.
    pub async fn call_with(&self, request: Req, options: CallOptions) -> Result<Res, CallError> {
        let message = self.encode(&request)?;
        let method = self.method.full_name();

        tracing::debug!(method, "dispatching unary call");

        let response = self
            .invoker
            .invoke(self.method.clone(), message, options)
            .await
            .inspect_err(|err| tracing::debug!(method, code = ?err.code(), "call rejected"))?;

        tracing::debug!(method, "call resolved");

        Ok(self.decode(&response)?)
    }

    fn encode(&self, request: &Req) -> Result<DynamicMessage, CodecError> {
        let value = serde_json::to_value(request).map_err(|source| CodecError::Serialize {
            method: self.method.full_name().to_string(),
            source,
        })?;

        codec::message_from_json(self.method.input(), value)
    }

    fn decode(&self, response: &DynamicMessage) -> Result<Res, CodecError> {
        codec::message_to_json(response)
            .and_then(serde_json::from_value)
            .map_err(|source| CodecError::Deserialize {
                method: self.method.full_name().to_string(),
                source,
            })
    }
}

/// Binds the methods of one service against a shared invoker.
pub(crate) struct ServiceBinder<'a> {
    invoker: &'a Arc<dyn Invoke>,
    registry: &'a SchemaRegistry,
    service: &'static str,
}

impl<'a> ServiceBinder<'a> {
    pub(crate) fn new(
        invoker: &'a Arc<dyn Invoke>,
        registry: &'a SchemaRegistry,
        service: &'static str,
    ) -> Result<Self, BindError> {
        registry.service(service)?;
        Ok(Self {
            invoker,
            registry,
            service,
        })
    }

    /// Resolves `method` in the schema and binds it.
    ///
    /// Fails eagerly when the method is missing or streaming, so a schema that does not
    /// match the façade is caught at construction rather than at first call.
    pub(crate) fn bind<Req, Res>(&self, method: &str) -> Result<UnaryMethod<Req, Res>, BindError> {
        let descriptor = self.registry.method(self.service, method)?;

        if descriptor.is_client_streaming() || descriptor.is_server_streaming() {
            return Err(BindError::NotUnary(descriptor.full_name().to_string()));
        }

        Ok(UnaryMethod {
            invoker: Arc::clone(self.invoker),
            method: descriptor,
            _types: PhantomData,
        })
    }
}
