//! # Channel Builder
//!
//! Produces the single [`Channel`] shared by every façade of one
//! [`crate::ExchangeClients`].
//!
//! * `insecure` (the default) gives a plaintext HTTP/2 transport.
//! * `insecure == false` gives TLS. Root certificates, private key and certificate chain are
//!   taken from [`SslOptions`], and the platform roots are used when no root is supplied.
//!
//! All certificate material is parsed before the channel exists, so malformed PEM fails at
//! construction with a [`CredentialError`] instead of surfacing on the first call. The
//! channel itself is lazy: no network I/O happens until a method is invoked.
use crate::error::{ChannelError, CredentialError};
use rustls_pki_types::{CertificateDer, PrivateKeyDer, pem::PemObject};
use std::{fmt, time::Duration};
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint, Identity};

/// TLS material as raw PEM buffers.
#[derive(Clone, Default)]
pub struct SslOptions {
    pub root_certs: Option<Vec<u8>>,
    pub private_key: Option<Vec<u8>>,
    pub cert_chain: Option<Vec<u8>>,
}

impl fmt::Debug for SslOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SslOptions")
            .field("root_certs", &self.root_certs.as_ref().map(Vec::len))
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("cert_chain", &self.cert_chain.as_ref().map(Vec::len))
            .finish()
    }
}

/// Where and how to reach the exchange.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// `host:port`, or a full `http://` / `https://` URI.
    pub address: String,
    pub insecure: bool,
    pub ssl: Option<SslOptions>,
    /// Bounds the TCP/TLS connect only, never a call.
    pub connect_timeout: Option<Duration>,
}

impl ClientOptions {
    /// Plaintext options for `address`.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            insecure: true,
            ssl: None,
            connect_timeout: None,
        }
    }

    /// Switches to TLS with the given material.
    pub fn with_tls(mut self, ssl: SslOptions) -> Self {
        self.insecure = false;
        self.ssl = Some(ssl);
        self
    }

    /// Switches to TLS trusting the platform roots, without a client identity.
    pub fn with_platform_tls(self) -> Self {
        self.with_tls(SslOptions::default())
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

/// Builds the channel described by `options`.
///
/// Must be called within a Tokio runtime: the lazy channel spawns its connection driver.
///
/// # Returns
///
/// * `Ok(Channel)` - A channel that connects on first use.
/// * `Err(ChannelError)` - If the address is invalid or the TLS material is malformed.
pub fn build_channel(options: &ClientOptions) -> Result<Channel, ChannelError> {
    let endpoint = endpoint(options)?;

    tracing::info!(
        address = %endpoint.uri(),
        tls = !options.insecure,
        "exchange channel prepared"
    );

    Ok(endpoint.connect_lazy())
}

pub(crate) fn endpoint(options: &ClientOptions) -> Result<Endpoint, ChannelError> {
    let address = normalize_address(&options.address, options.insecure)?;

    let mut endpoint = Endpoint::from_shared(address.clone())
        .map_err(|e| ChannelError::InvalidAddress(address, e))?;

    if let Some(timeout) = options.connect_timeout {
        endpoint = endpoint.connect_timeout(timeout);
    }

    if options.insecure {
        if options.ssl.is_some() {
            tracing::warn!("TLS material supplied with insecure = true, it is ignored");
        }
        return Ok(endpoint);
    }

    let tls = tls_config(options.ssl.as_ref())?;
    let endpoint = endpoint.tls_config(tls).map_err(CredentialError::Tls)?;

    Ok(endpoint)
}

/// Prefixes a scheme matching the transport when `address` has none.
///
/// tonic only negotiates TLS for `https` URIs, so any other explicit scheme is refused
/// when TLS is requested.
fn normalize_address(address: &str, insecure: bool) -> Result<String, ChannelError> {
    match address.split_once("://") {
        Some((scheme, _)) if !insecure && !scheme.eq_ignore_ascii_case("https") => {
            Err(ChannelError::PlaintextScheme(address.to_string()))
        }
        Some(_) => Ok(address.to_string()),
        None => {
            let scheme = if insecure { "http" } else { "https" };
            Ok(format!("{scheme}://{address}"))
        }
    }
}

fn tls_config(ssl: Option<&SslOptions>) -> Result<ClientTlsConfig, CredentialError> {
    let mut config = ClientTlsConfig::new();
    let ssl = ssl.cloned().unwrap_or_default();

    match ssl.root_certs {
        Some(roots) => {
            validate_certificates(&roots).map_err(|e| match e {
                PemIssue::Invalid(e) => CredentialError::InvalidRootCerts(e),
                PemIssue::Empty => CredentialError::EmptyRootCerts,
            })?;
            config = config.ca_certificate(Certificate::from_pem(roots));
        }
        None => config = config.with_native_roots(),
    }

    match (ssl.private_key, ssl.cert_chain) {
        (Some(key), Some(chain)) => {
            validate_certificates(&chain).map_err(|e| match e {
                PemIssue::Invalid(e) => CredentialError::InvalidCertChain(e),
                PemIssue::Empty => CredentialError::EmptyCertChain,
            })?;
            PrivateKeyDer::from_pem_slice(&key).map_err(CredentialError::InvalidPrivateKey)?;
            config = config.identity(Identity::from_pem(chain, key));
        }
        (None, None) => {}
        _ => return Err(CredentialError::IncompleteIdentity),
    }

    Ok(config)
}

enum PemIssue {
    Invalid(rustls_pki_types::pem::Error),
    Empty,
}

fn validate_certificates(pem: &[u8]) -> Result<(), PemIssue> {
    let mut count = 0usize;
    for cert in CertificateDer::pem_slice_iter(pem) {
        cert.map_err(PemIssue::Invalid)?;
        count += 1;
    }

    if count == 0 {
        return Err(PemIssue::Empty);
    }
    Ok(())
}
