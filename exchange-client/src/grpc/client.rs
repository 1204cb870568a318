//! # Generic gRPC Client
//!
//! This module wraps a standard `tonic` client to provide a generic interface for unary
//! gRPC calls. It is agnostic to the specific Protobuf messages being exchanged.
//!
//! ## How it works
//!
//! The [`GrpcClient`] utilizes the [`super::codec::DynamicCodec`] to handle serialization.
//! It does not need to know the structure of the data it is sending; it simply ensures the
//! service is ready and passes the `DynamicMessage` and `MethodDescriptor` to the codec.
//!
//! ## Features
//!
//! * **Dynamic Pathing**: Constructs the HTTP/2 path (e.g., `/exchange_service.Account/Alter`)
//!   at runtime.
//! * **Metadata & Deadlines**: Applies the [`CallOptions`] of each call. A timeout is sent to
//!   the server as `grpc-timeout` and also enforced locally.
//! * **Single outcome**: Every failure, whether the service was never ready, the server
//!   answered with a non-OK status or the deadline elapsed, becomes one [`TransportError`].
use super::codec::DynamicCodec;
use crate::{BoxError, binder::CallOptions, binder::Invoke, error::TransportError};
use futures_util::future::BoxFuture;
use http_body::Body as HttpBody;
use prost_reflect::{DynamicMessage, MethodDescriptor};
use std::{fmt, str::FromStr};
use tonic::{Status, client::GrpcService, transport::Channel};

/// A generic client for unary calls to any service described by a `MethodDescriptor`.
#[derive(Clone)]
pub(crate) struct GrpcClient<S = Channel> {
    client: tonic::client::Grpc<S>,
}

impl<S> fmt::Debug for GrpcClient<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrpcClient").finish_non_exhaustive()
    }
}

impl<S> GrpcClient<S>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError> + Send,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    pub(crate) fn new(service: S) -> Self {
        let client = tonic::client::Grpc::new(service);
        Self { client }
    }

    /// Performs a Unary gRPC call (Single Request -> Single Response).
    ///
    /// # Returns
    ///
    /// * `Ok(DynamicMessage)` - The decoded response.
    /// * `Err(TransportError)` - The service was not ready, the server returned a non-OK
    ///   status, the response could not be decoded or the deadline elapsed.
    pub(crate) async fn unary(
        &mut self,
        method: &MethodDescriptor,
        payload: DynamicMessage,
        options: CallOptions,
    ) -> Result<DynamicMessage, TransportError> {
        let path = http_path(method);
        let path_str = path.to_string();
        let timeout = options.timeout();

        let call = async {
            self.client
                .ready()
                .await
                .map_err(|e| {
                    let err: BoxError = e.into();
                    Status::unavailable(format!("Service was not ready: {}", err))
                })?;

            let codec = DynamicCodec::new(method.output());
            let request = build_request(payload, options);

            self.client
                .unary(request, path, codec)
                .await
                .map(tonic::Response::into_inner)
        };

        let result = match timeout {
            Some(deadline) => tokio::time::timeout(deadline, call)
                .await
                .unwrap_or_else(|_| {
                    Err(Status::deadline_exceeded(format!(
                        "No response within {:?}",
                        deadline
                    )))
                }),
            None => call.await,
        };

        result.map_err(|status| TransportError::new(path_str, status))
    }
}

impl<S> Invoke for GrpcClient<S>
where
    S: GrpcService<tonic::body::Body> + Clone + Send + Sync + 'static,
    S::Future: Send,
    S::Error: Into<BoxError> + Send,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    fn invoke(
        &self,
        method: MethodDescriptor,
        request: DynamicMessage,
        options: CallOptions,
    ) -> BoxFuture<'static, Result<DynamicMessage, TransportError>> {
        // Each call drives its own clone, the underlying service is shared.
        let mut client = self.clone();
        Box::pin(async move { client.unary(&method, request, options).await })
    }
}

fn http_path(method: &MethodDescriptor) -> http::uri::PathAndQuery {
    let path = format!("/{}/{}", method.parent_service().full_name(), method.name());
    http::uri::PathAndQuery::from_str(&path).expect("valid gRPC path")
}

fn build_request<T>(payload: T, options: CallOptions) -> tonic::Request<T> {
    let timeout = options.timeout();
    let mut request = tonic::Request::new(payload);
    *request.metadata_mut() = options.into_metadata();
    if let Some(timeout) = timeout {
        request.set_timeout(timeout);
    }
    request
}
