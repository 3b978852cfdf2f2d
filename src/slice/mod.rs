//! Slices and the type-indexed registry that holds them.
//!
//! Each slice kind carries an [`Isolation`] strategy so that values handed in
//! and out of the registry never share mutable state with the stored copy.

mod isolation;
mod registry;

pub use isolation::{short_type_name, Isolation, Slice, Strategy};
pub use registry::SliceRegistry;
