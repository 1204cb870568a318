//! # Error Taxonomy
//!
//! Errors are split by the moment they can happen:
//!
//! * **Construction** ([`ClientError`]): the address is invalid ([`ChannelError`]), the TLS
//!   material is malformed ([`CredentialError`]), the schema cannot be decoded
//!   ([`SchemaError`]) or lacks a method a façade needs ([`BindError`]). All of them fail
//!   before a single method is callable.
//! * **Invocation** ([`CallError`]): the transport failed ([`TransportError`]) or a message
//!   could not be mapped between the typed surface and the schema ([`CodecError`]).
//!
//! A business rejection from the engine is not an error at all: the call resolves with
//! `success == false` and a `code`. [`ApplicationError`] only exists for callers that opt
//! into treating it as one through [`crate::client::Outcome::into_result`].
use rustls_pki_types::pem;
use tonic::{Code, Status};

/// Errors that can occur when building a channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Invalid address '{0}': {1}")]
    InvalidAddress(String, #[source] tonic::transport::Error),
    #[error("TLS requested but address '{0}' does not use https")]
    PlaintextScheme(String),
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

/// Malformed TLS material supplied to the channel builder.
///
/// Never recovered from by falling back to plaintext.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Root certificates are not valid PEM: '{0}'")]
    InvalidRootCerts(#[source] pem::Error),
    #[error("Root certificate buffer contains no certificate")]
    EmptyRootCerts,
    #[error("Certificate chain is not valid PEM: '{0}'")]
    InvalidCertChain(#[source] pem::Error),
    #[error("Certificate chain contains no certificate")]
    EmptyCertChain,
    #[error("Private key is not valid PEM: '{0}'")]
    InvalidPrivateKey(#[source] pem::Error),
    #[error("A private key must be given together with a certificate chain")]
    IncompleteIdentity,
    #[error("Failed to configure TLS: '{0}'")]
    Tls(#[source] tonic::transport::Error),
}

/// Errors that can occur when loading a service schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Failed to decode file descriptor set: '{0}'")]
    Descriptor(#[from] prost_reflect::DescriptorError),
    #[error("Package '{0}' declares no services")]
    EmptyPackage(String),
}

/// Errors that can occur when binding a schema method to the transport.
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    #[error("Service '{0}' not found")]
    ServiceNotFound(String),
    #[error("Method '{method}' not found in service '{service}'")]
    MethodNotFound { service: String, method: String },
    #[error("Method '{0}' is streaming and cannot be bound as a unary call")]
    NotUnary(String),
}

/// Errors that can occur while creating the service façades.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Bind(#[from] BindError),
}

/// The call did not complete at the transport level.
///
/// Covers refused or dropped connections, unavailable servers, elapsed deadlines, malformed
/// frames and any non-OK gRPC status.
#[derive(Debug, thiserror::Error)]
#[error(
    "Transport failure on '{path}': code={:?} message={:?}",
    .status.code(),
    .status.message()
)]
pub struct TransportError {
    path: String,
    #[source]
    status: Status,
}

impl TransportError {
    pub(crate) fn new(path: impl Into<String>, status: Status) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }

    /// The gRPC path of the failed call (e.g. `/exchange_service.Account/QueryBalance`).
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn code(&self) -> Code {
        self.status.code()
    }

    pub fn status(&self) -> &Status {
        &self.status
    }
}

/// A value could not cross the boundary between the typed surface and the wire schema.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("'{0}' is not a scaled decimal integer string")]
    InvalidScaledDecimal(String),
    #[error("{0} cannot be represented as a scaled decimal")]
    NotRepresentable(String),
    #[error("Scaled decimal overflow in {0}")]
    Overflow(&'static str),
    #[error("Failed to serialize request for '{method}': '{source}'")]
    Serialize {
        method: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Request does not match the schema of '{message}': '{source}'")]
    SchemaMismatch {
        message: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to read the response of '{method}': '{source}'")]
    Deserialize {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that reject a bound method invocation.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl CallError {
    /// The gRPC status code, when the failure happened on the transport.
    pub fn code(&self) -> Option<Code> {
        match self {
            CallError::Transport(err) => Some(err.code()),
            CallError::Codec(_) => None,
        }
    }
}

/// A business rule rejection reported by the engine (`success == false`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Rejected by the exchange with code '{code}'")]
pub struct ApplicationError {
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_reports_path_and_code() {
        let err = TransportError::new(
            "/exchange_service.Account/QueryBalance",
            Status::unavailable("connection refused"),
        );

        assert_eq!(err.code(), Code::Unavailable);
        assert_eq!(err.path(), "/exchange_service.Account/QueryBalance");

        let rendered = err.to_string();
        assert!(rendered.contains("/exchange_service.Account/QueryBalance"));
        assert!(rendered.contains("Unavailable"));
        assert!(rendered.contains("connection refused"));
    }

    #[test]
    fn call_error_exposes_transport_code_only() {
        let transport: CallError =
            TransportError::new("/p/M", Status::deadline_exceeded("late")).into();
        assert_eq!(transport.code(), Some(Code::DeadlineExceeded));

        let codec: CallError = CodecError::InvalidScaledDecimal("1.5".into()).into();
        assert_eq!(codec.code(), None);
    }
}
