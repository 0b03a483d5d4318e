//! C-linkage adapter over the NExC model boundary.
//!
//! Exposes tensor loading, model loading/evaluation, gradient evaluation,
//! and dictionary/list container access as a flat function set over opaque
//! handles, for callers (Fortran, C) that cannot link the tensor library's
//! native object model.
//!
//! ## Ownership contract
//!
//! Every allocating function transfers ownership of the returned handle to
//! the caller, who must release it exactly once through the matching
//! `_delete` function. Nothing is freed implicitly; use-after-delete is
//! undefined. Delete functions accept null and do nothing.
//!
//! ## Failure semantics
//!
//! There is no recoverable-error channel across this boundary. Every fault
//! (missing file, protocol mismatch, absent dictionary key, out-of-range
//! index, internal panic) prints `[ERROR]: <message>` to stderr and
//! terminates the process.

mod containers;
mod error;
mod handles;
mod model;
mod tensor;

pub use containers::*;
pub use model::*;
pub use tensor::*;
