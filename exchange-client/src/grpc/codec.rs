//! # Dynamic Protobuf Codec
//!
//! Two layers of conversion sit between a typed request and the wire:
//!
//! 1. **JSON <-> DynamicMessage** ([`message_from_json`], [`message_to_json`]):
//!    - Requests are validated against the input `MessageDescriptor` while being built, so
//!      a shape mismatch is caught before anything is sent.
//!    - Responses are rendered with proto field names, with every default value present and
//!      64-bit integers as JSON numbers, which is what the typed structs expect.
//!
//! 2. **DynamicMessage <-> bytes** ([`DynamicCodec`]): an implementation of
//!    `tonic::codec::Codec` that lets `tonic` carry reflected messages without generated
//!    Rust structs.
use crate::error::CodecError;
use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor, SerializeOptions};
use tonic::{
    Status,
    codec::{Codec, DecodeBuf, Decoder, EncodeBuf, Encoder},
};

/// Builds a message of type `desc` from a JSON value.
pub(crate) fn message_from_json(
    desc: MessageDescriptor,
    value: serde_json::Value,
) -> Result<DynamicMessage, CodecError> {
    let message = desc.full_name().to_string();
    // DynamicMessage::deserialize accepts any Serde Deserializer.
    // serde_json::Value implements IntoDeserializer, so we can pass it directly.
    DynamicMessage::deserialize(desc, value)
        .map_err(|source| CodecError::SchemaMismatch { message, source })
}

/// Renders a message as JSON keyed by the proto field names.
pub(crate) fn message_to_json(message: &DynamicMessage) -> serde_json::Result<serde_json::Value> {
    let options = SerializeOptions::new()
        .use_proto_field_name(true)
        .skip_default_fields(false)
        .stringify_64_bit_integers(false);

    message.serialize_with_options(serde_json::value::Serializer, &options)
}

/// A `tonic` codec for reflected messages.
///
/// Only the response descriptor is needed: requests arrive already built.
pub(crate) struct DynamicCodec {
    res_desc: MessageDescriptor,
}

impl DynamicCodec {
    pub(crate) fn new(res_desc: MessageDescriptor) -> Self {
        Self { res_desc }
    }
}

impl Codec for DynamicCodec {
    type Encode = DynamicMessage;
    type Decode = DynamicMessage;

    type Encoder = DynamicEncoder;
    type Decoder = DynamicDecoder;

    fn encoder(&mut self) -> Self::Encoder {
        DynamicEncoder
    }

    fn decoder(&mut self) -> Self::Decoder {
        DynamicDecoder(self.res_desc.clone())
    }
}

/// Writes a reflected message as Protobuf bytes.
pub(crate) struct DynamicEncoder;

impl Encoder for DynamicEncoder {
    type Item = DynamicMessage;
    type Error = Status;

    fn encode(&mut self, item: Self::Item, dst: &mut EncodeBuf<'_>) -> Result<(), Self::Error> {
        item.encode_raw(dst);
        Ok(())
    }
}

/// Reads Protobuf bytes into a reflected message.
pub(crate) struct DynamicDecoder(MessageDescriptor);

impl Decoder for DynamicDecoder {
    type Item = DynamicMessage;
    type Error = Status;

    fn decode(&mut self, src: &mut DecodeBuf<'_>) -> Result<Option<Self::Item>, Self::Error> {
        let mut msg = DynamicMessage::new(self.0.clone());
        msg.merge(src)
            .map_err(|e| Status::internal(format!("Failed to decode Protobuf bytes: {}", e)))?;

        Ok(Some(msg))
    }
}
