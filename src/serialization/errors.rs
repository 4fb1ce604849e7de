use crate::virtual_machine::errors::HeapError;
use vm_interop_derive::Error;

/// Errors raised while serializing a stack item.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SerializeError {
    /// The graph contains a host reference.
    #[error("{0} items cannot be serialized")]
    UnsupportedValue(&'static str),
    /// A container contains itself.
    #[error("container contains itself")]
    CircularReference,
    /// The output grew past the item size limit.
    #[error("serialized item exceeds {limit} bytes")]
    ItemTooLarge { limit: usize },
    /// A container handle did not resolve in the heap.
    #[error("heap error: {0}")]
    Heap(#[from] HeapError),
}

/// Malformed input detected while deserializing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// Input ended before the value was complete.
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },
    /// Unknown or unsupported type tag.
    #[error("invalid type tag 0x{tag:02x} at offset {offset}")]
    InvalidTag { tag: u8, offset: usize },
    /// A var-int used more bytes than its value needs.
    #[error("non-canonical var-int at offset {offset}")]
    NonCanonicalVarInt { offset: usize },
    /// Bytes remained after the root item.
    #[error("{remaining} trailing bytes after item")]
    TrailingBytes { remaining: usize },
    /// A map key decoded to a container.
    #[error("{actual} cannot be used as a map key")]
    InvalidMapKey { actual: &'static str },
}

/// Errors raised while deserializing a stack item.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeserializeError {
    /// The input is not a valid encoding.
    #[error("malformed item: {0}")]
    Format(#[from] FormatError),
    /// A length or count in the input is larger than the configured limit.
    #[error("{what} of {actual} exceeds limit {limit}")]
    LimitExceeded {
        what: &'static str,
        limit: u64,
        actual: u64,
    },
    /// The heap could not hold the decoded containers.
    #[error("heap error: {0}")]
    Heap(#[from] HeapError),
}
