pub mod basis;
pub mod density;
pub mod molecule;

pub use basis::{BasisSet, Shell};
pub use density::DensityPair;
pub use molecule::{Atom, Molecule};
