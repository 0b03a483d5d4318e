pub mod records;

pub use records::{IoError, read_basis, read_density, read_molecule, write_reference_file};
