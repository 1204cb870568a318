//! # Exchange Schema
//!
//! Protobuf contract of the exchange backend: the `Account` ledger, the `Market` matching
//! engine and the `Quotation` feed, all under the `exchange_service` package.
//!
//! The crate exports two things:
//!
//! * [`FILE_DESCRIPTOR_SET`]: the encoded `FileDescriptorSet` that the client loads into its
//!   schema registry at runtime.
//! * [`pb`]: the generated messages and tonic server traits, used to build in-process doubles
//!   of the engine for integration tests.
//!
//! Every amount, price, fee and funds field is a string carrying a scaled integer
//! (`value * 10^10`), never a floating point number.

pub mod pb {
    include!(concat!(env!("OUT_DIR"), "/exchange_service.rs"));
}

pub use pb::account_server::{Account, AccountServer};
pub use pb::market_server::{Market, MarketServer};
pub use pb::quotation_server::{Quotation, QuotationServer};

/// Name of the protobuf package holding the exchange services.
pub const PACKAGE: &str = "exchange_service";

pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("descriptors");
