//! # NExC Core Library
//!
//! Integration glue around serialized neural exchange-correlation (XC)
//! functionals: reference-data I/O, molecular quadrature grids, and the
//! evaluation pipeline that turns a density matrix pair into an XC energy
//! and potential matrices.
//!
//! ## Architectural Philosophy
//!
//! The crate keeps all numerically heavy machinery external and is organized
//! in layers with a clear delegation boundary:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Molecule`,
//!   `BasisSet`, `DensityPair`) and the HDF5 record reader/writer. Container
//!   I/O is delegated to libhdf5; this layer only defines record paths and
//!   compound layouts.
//!
//! - **[`grid`]: Quadrature.** Named grid sizes, radial quadrature maps,
//!   the angular sphere rule, pruning, and Becke partition weights. Every
//!   user-facing name goes through a case-normalized lookup table.
//!
//! - **[`functional`]: The Model Boundary.** Loading and validating
//!   TorchScript functionals (protocol version, feature vocabulary, optional
//!   hash pinning) and invoking them through `tch`. Tensor storage and
//!   automatic differentiation stay inside libtorch.
//!
//! - **[`integrator`]: The Contraction Layer.** Basis collocation, feature
//!   assembly, and the quadrature contraction that maps model gradients back
//!   to AO potential matrices.
//!
//! - **[`workflows`]: The Public API.** The complete driver sequence behind
//!   a single call, consumed by the `nexc` binary and foreign-language
//!   adapters.

pub mod core;
pub mod functional;
pub mod grid;
pub mod integrator;
pub mod workflows;
