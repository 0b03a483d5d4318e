//! Reference-file records.
//!
//! A reference file is an HDF5 container with four records: `/MOLECULE` and
//! `/BASIS` as 1-D compound datasets, and `/DENSITY_SCALAR` / `/DENSITY_Z`
//! as square 2-D float64 datasets. Container parsing is delegated entirely
//! to libhdf5; this module only registers the compound layouts and the
//! record paths.

use crate::core::models::basis::{BasisSet, MAX_PRIMITIVES, Shell};
use crate::core::models::density::{DensityError, DensityPair};
use crate::core::models::molecule::{Atom, Molecule};
use hdf5::{File, H5Type};
use nalgebra::Point3;
use std::path::Path;
use thiserror::Error;

pub const MOLECULE_RECORD: &str = "MOLECULE";
pub const BASIS_RECORD: &str = "BASIS";
pub const DENSITY_SCALAR_RECORD: &str = "DENSITY_SCALAR";
pub const DENSITY_Z_RECORD: &str = "DENSITY_Z";

#[derive(Debug, Error)]
pub enum IoError {
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    #[error("invalid {record} record: {reason}")]
    InvalidRecord {
        record: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Density(#[from] DensityError),
}

#[derive(H5Type, Clone, Copy, Debug, PartialEq)]
#[repr(C)]
struct MoleculeRecord {
    atomic_number: i32,
    x: f64,
    y: f64,
    z: f64,
}

#[derive(H5Type, Clone, Copy, Debug, PartialEq)]
#[repr(C)]
struct BasisRecord {
    nprim: i32,
    l: i32,
    pure: i32,
    alpha: [f64; MAX_PRIMITIVES],
    coeff: [f64; MAX_PRIMITIVES],
    origin: [f64; 3],
}

/// Load the `/MOLECULE` record.
pub fn read_molecule(path: &Path) -> Result<Molecule, IoError> {
    let file = File::open(path)?;
    let records: Vec<MoleculeRecord> = file.dataset(MOLECULE_RECORD)?.read_raw()?;

    let mut atoms = Vec::with_capacity(records.len());
    for record in records {
        if record.atomic_number <= 0 {
            return Err(IoError::InvalidRecord {
                record: MOLECULE_RECORD,
                reason: format!("non-positive atomic number {}", record.atomic_number),
            });
        }
        atoms.push(Atom {
            atomic_number: record.atomic_number as u32,
            position: Point3::new(record.x, record.y, record.z),
        });
    }
    Ok(Molecule::new(atoms))
}

/// Load the `/BASIS` record and apply `tolerance` to every shell.
pub fn read_basis(path: &Path, tolerance: f64) -> Result<BasisSet, IoError> {
    let file = File::open(path)?;
    let records: Vec<BasisRecord> = file.dataset(BASIS_RECORD)?.read_raw()?;

    let mut shells = Vec::with_capacity(records.len());
    for record in records {
        let nprim = record.nprim;
        if nprim < 1 || nprim as usize > MAX_PRIMITIVES {
            return Err(IoError::InvalidRecord {
                record: BASIS_RECORD,
                reason: format!("primitive count {nprim} outside 1..={MAX_PRIMITIVES}"),
            });
        }
        if record.l < 0 {
            return Err(IoError::InvalidRecord {
                record: BASIS_RECORD,
                reason: format!("negative angular momentum {}", record.l),
            });
        }
        let nprim = nprim as usize;
        shells.push(Shell::new(
            record.l as u32,
            record.pure != 0,
            record.alpha[..nprim].to_vec(),
            record.coeff[..nprim].to_vec(),
            Point3::new(record.origin[0], record.origin[1], record.origin[2]),
        ));
    }

    let mut basis = BasisSet::new(shells);
    basis.set_shell_tolerance(tolerance);
    Ok(basis)
}

/// Load the `/DENSITY_SCALAR` and `/DENSITY_Z` records.
pub fn read_density(path: &Path) -> Result<DensityPair, IoError> {
    let file = File::open(path)?;
    let scalar = file.dataset(DENSITY_SCALAR_RECORD)?.read_2d::<f64>()?;
    let z = file.dataset(DENSITY_Z_RECORD)?.read_2d::<f64>()?;
    Ok(DensityPair::new(scalar, z)?)
}

/// Write all four records, producing a file the readers above accept.
pub fn write_reference_file(
    path: &Path,
    molecule: &Molecule,
    basis: &BasisSet,
    density: &DensityPair,
) -> Result<(), IoError> {
    let file = File::create(path)?;

    let molecule_records: Vec<MoleculeRecord> = molecule
        .atoms()
        .iter()
        .map(|atom| MoleculeRecord {
            atomic_number: atom.atomic_number as i32,
            x: atom.position.x,
            y: atom.position.y,
            z: atom.position.z,
        })
        .collect();
    file.new_dataset_builder()
        .with_data(&molecule_records)
        .create(MOLECULE_RECORD)?;

    let basis_records: Vec<BasisRecord> = basis
        .shells()
        .iter()
        .map(|shell| {
            let mut alpha = [0.0; MAX_PRIMITIVES];
            let mut coeff = [0.0; MAX_PRIMITIVES];
            alpha[..shell.exponents.len()].copy_from_slice(&shell.exponents);
            coeff[..shell.coefficients.len()].copy_from_slice(&shell.coefficients);
            BasisRecord {
                nprim: shell.exponents.len() as i32,
                l: shell.l as i32,
                pure: shell.pure as i32,
                alpha,
                coeff,
                origin: [shell.origin.x, shell.origin.y, shell.origin.z],
            }
        })
        .collect();
    file.new_dataset_builder()
        .with_data(&basis_records)
        .create(BASIS_RECORD)?;

    file.new_dataset_builder()
        .with_data(density.scalar())
        .create(DENSITY_SCALAR_RECORD)?;
    file.new_dataset_builder()
        .with_data(density.z())
        .create(DENSITY_Z_RECORD)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::basis::normalize_contraction;
    use ndarray::array;

    fn sample_data() -> (Molecule, BasisSet, DensityPair) {
        let molecule = Molecule::new(vec![
            Atom {
                atomic_number: 2,
                position: Point3::new(0.0, 0.0, 0.0),
            },
            Atom {
                atomic_number: 1,
                position: Point3::new(0.0, 0.0, 1.4),
            },
        ]);
        let exponents = vec![6.36242139, 1.15892300, 0.31364979];
        let coefficients = normalize_contraction(0, &exponents, &[0.15432897, 0.53532814, 0.44463454]);
        let basis = BasisSet::new(vec![
            Shell::new(0, false, exponents.clone(), coefficients.clone(), Point3::origin()),
            Shell::new(0, false, exponents, coefficients, Point3::new(0.0, 0.0, 1.4)),
        ]);
        let density = DensityPair::new(
            array![[1.0, 0.3], [0.3, 0.5]],
            array![[0.2, 0.0], [0.0, -0.1]],
        )
        .unwrap();
        (molecule, basis, density)
    }

    #[test]
    fn reference_file_round_trips_all_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("he_h.h5");
        let (molecule, basis, density) = sample_data();

        write_reference_file(&path, &molecule, &basis, &density).unwrap();

        let mol = read_molecule(&path).unwrap();
        assert_eq!(mol, molecule);

        let read = read_basis(&path, 1e-12).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read.shells()[0].exponents, basis.shells()[0].exponents);
        // The requested tolerance overrides whatever the file carried.
        assert!((read.shells()[0].tolerance() - 1e-12).abs() < 1e-30);

        let dens = read_density(&path).unwrap();
        assert_eq!(dens.dim(), 2);
        assert_eq!(dens.scalar(), density.scalar());
        assert_eq!(dens.z(), density.z());
    }

    #[test]
    fn missing_file_is_an_hdf5_error() {
        let result = read_molecule(Path::new("/nonexistent/input.h5"));
        assert!(matches!(result, Err(IoError::Hdf5(_))));
    }
}
