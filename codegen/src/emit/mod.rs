// Licensed under the Apache-2.0 license

//! Code emission: the generic value serializer and the
//! declaration-to-artifact emitter.

pub mod artifact;
pub mod serialize;

pub use artifact::{
    emit_category, emit_custom_header, Artifact, CUSTOM_TYPES_HEADER, DESCRIPTOR_HEADER,
};
pub use serialize::{is_symbolic_constant, serialize_value, SYMBOL_PREFIXES};
