use nalgebra::Point3;

/// Bohr per Ångström, CODATA 2018.
pub const ANGSTROM_TO_BOHR: f64 = 1.0 / 0.529_177_210_903;

/// A single nucleus: atomic number and Cartesian position in Bohr.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atom {
    pub atomic_number: u32,
    pub position: Point3<f64>,
}

/// A molecule as read from a reference file: nothing but nuclei.
///
/// Electronic structure lives entirely in the accompanying basis set and
/// density matrices; this type is deliberately inert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    atoms: Vec<Atom>,
}

impl Molecule {
    pub fn new(atoms: Vec<Atom>) -> Self {
        Self { atoms }
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Positions of all nuclei, in the order they appear in the file.
    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms.iter().map(|a| a.position).collect()
    }

    /// Bragg-Slater radius of atom `index`, in Bohr.
    pub fn bragg_radius(&self, index: usize) -> f64 {
        bragg_radius_bohr(self.atoms[index].atomic_number)
    }
}

// Slater (1964) covalent radii in Ångström, Z = 1..=36, with the
// conventional fill-ins for H and the noble gases used by quadrature codes.
const BRAGG_RADII_ANGSTROM: [f64; 36] = [
    0.35, 1.40, // H, He
    1.45, 1.05, 0.85, 0.70, 0.65, 0.60, 0.50, 0.45, // Li..Ne
    1.80, 1.50, 1.25, 1.10, 1.00, 1.00, 1.00, 1.00, // Na..Ar
    2.20, 1.80, // K, Ca
    1.60, 1.40, 1.35, 1.40, 1.40, 1.40, 1.35, 1.35, 1.35, 1.35, // Sc..Zn
    1.30, 1.25, 1.15, 1.15, 1.15, 1.10, // Ga..Kr
];

/// Bragg-Slater radius for a given atomic number, in Bohr.
///
/// Elements beyond the tabulated range fall back to a generic 1.5 Å.
pub fn bragg_radius_bohr(atomic_number: u32) -> f64 {
    let angstrom = BRAGG_RADII_ANGSTROM
        .get(atomic_number.saturating_sub(1) as usize)
        .copied()
        .unwrap_or(1.5);
    angstrom * ANGSTROM_TO_BOHR
}
