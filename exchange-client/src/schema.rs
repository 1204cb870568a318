//! # Schema Registry
//!
//! Immutable index of the services a client can bind, built from a protobuf
//! `FileDescriptorSet`:
//!
//! ```text
//! service name -> method name -> (request message, response message)
//! ```
//!
//! The registry is decoded once and then shared. Clones are cheap, the underlying
//! [`DescriptorPool`] is reference counted and never mutated after load.
use crate::error::{BindError, SchemaError};
use prost_reflect::{DescriptorPool, MethodDescriptor, ServiceDescriptor};
use std::sync::OnceLock;

static EMBEDDED: OnceLock<SchemaRegistry> = OnceLock::new();

/// Index of the services declared by one protobuf package.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    pool: DescriptorPool,
    package: String,
    services: Vec<ServiceDescriptor>,
}

impl SchemaRegistry {
    /// Returns the registry of the exchange schema compiled into this crate.
    ///
    /// The descriptor set is decoded on first use and cached for the rest of the process.
    pub fn embedded() -> Result<Self, SchemaError> {
        if let Some(registry) = EMBEDDED.get() {
            return Ok(registry.clone());
        }

        let registry = Self::from_file_descriptor_set(exchange_schema::FILE_DESCRIPTOR_SET)?;
        Ok(EMBEDDED.get_or_init(|| registry).clone())
    }

    /// Decodes a binary `FileDescriptorSet` and indexes the `exchange_service` package.
    ///
    /// # Returns
    ///
    /// * `Ok(SchemaRegistry)` - The loaded registry.
    /// * `Err(SchemaError)` - If the bytes are not a valid descriptor set, or the package
    ///   declares no services.
    pub fn from_file_descriptor_set(bytes: &[u8]) -> Result<Self, SchemaError> {
        Self::with_package(bytes, exchange_schema::PACKAGE)
    }

    /// Same as [`Self::from_file_descriptor_set`] but indexes an arbitrary package.
    pub fn with_package(bytes: &[u8], package: &str) -> Result<Self, SchemaError> {
        let pool = DescriptorPool::decode(bytes)?;

        let services: Vec<_> = pool
            .services()
            .filter(|s| s.package_name() == package)
            .collect();

        if services.is_empty() {
            return Err(SchemaError::EmptyPackage(package.to_string()));
        }

        Ok(Self {
            pool,
            package: package.to_string(),
            services,
        })
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// The underlying descriptor pool, for message level introspection.
    pub fn descriptor_pool(&self) -> &DescriptorPool {
        &self.pool
    }

    /// Services of the package, in declaration order.
    pub fn services(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.services.iter()
    }

    /// Looks up a service by short (`Account`) or fully qualified
    /// (`exchange_service.Account`) name.
    pub fn service(&self, name: &str) -> Result<&ServiceDescriptor, BindError> {
        self.services
            .iter()
            .find(|s| s.name() == name || s.full_name() == name)
            .ok_or_else(|| BindError::ServiceNotFound(name.to_string()))
    }

    /// Looks up a method of a service.
    pub fn method(&self, service: &str, method: &str) -> Result<MethodDescriptor, BindError> {
        let descriptor = self.service(service)?;

        descriptor
            .methods()
            .find(|m| m.name() == method)
            .ok_or_else(|| BindError::MethodNotFound {
                service: descriptor.full_name().to_string(),
                method: method.to_string(),
            })
    }
}
