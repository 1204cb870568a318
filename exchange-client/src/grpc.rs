//! # Generic gRPC Transport
//!
//! Low-level building blocks for unary gRPC calls over messages whose shape is only known
//! at runtime through a [`prost_reflect::MethodDescriptor`].
//!
//! Unlike generated `tonic` clients, which are strongly typed (e.g. `BalanceQueryRequest`),
//! everything here works with [`prost_reflect::DynamicMessage`]. The typed surface lives one
//! layer up, in [`crate::binder`].
pub(crate) mod client;
pub(crate) mod codec;
