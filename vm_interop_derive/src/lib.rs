//! Derive macros for the vm_interop crate.
//!
//! Provides `#[derive(Error)]`, the in-house replacement for `thiserror` used by every
//! error enum in the interop layer.

mod error;

use proc_macro::TokenStream;

/// Implements `Display` and `std::error::Error` from `#[error("...")]` attributes.
///
/// Fields marked `#[from]` also get a `From` impl and are reported by `Error::source`,
/// as are fields marked `#[source]`.
#[proc_macro_derive(Error, attributes(error, source, from))]
pub fn derive_error(input: TokenStream) -> TokenStream {
    error::derive_error(input)
}
