//! Named grid specifications.
//!
//! Every user-facing specification string is resolved through a static
//! lookup table after case normalization; a miss is a typed error that
//! callers treat as fatal.

use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("unknown {kind} specification '{value}'")]
    Unknown { kind: &'static str, value: String },
}

/// Named atomic grid sizes: (radial points, angular order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridSize {
    Fine,
    UltraFine,
    SuperFine,
    Gm3,
    Gm5,
}

static GRID_SIZES: Map<&'static str, GridSize> = phf_map! {
    "fine" => GridSize::Fine,
    "ultrafine" => GridSize::UltraFine,
    "superfine" => GridSize::SuperFine,
    "gm3" => GridSize::Gm3,
    "gm5" => GridSize::Gm5,
};

impl GridSize {
    /// Radial point count and angular order of the unpruned atomic grid.
    pub fn dimensions(self) -> (usize, usize) {
        match self {
            GridSize::Fine => (75, 12),
            GridSize::UltraFine => (99, 17),
            GridSize::SuperFine => (175, 21),
            GridSize::Gm3 => (70, 13),
            GridSize::Gm5 => (110, 17),
        }
    }
}

impl FromStr for GridSize {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(&GRID_SIZES, "grid size", s)
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GridSize::Fine => "fine",
            GridSize::UltraFine => "ultrafine",
            GridSize::SuperFine => "superfine",
            GridSize::Gm3 => "gm3",
            GridSize::Gm5 => "gm5",
        };
        f.write_str(name)
    }
}

/// Radial quadrature families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadialQuad {
    Becke,
    MuraKnowles,
    TreutlerAhlrichs,
    MurrayHandyLaming,
}

static RADIAL_QUADS: Map<&'static str, RadialQuad> = phf_map! {
    "becke" => RadialQuad::Becke,
    "muraknowles" => RadialQuad::MuraKnowles,
    "treutlerahlrichs" => RadialQuad::TreutlerAhlrichs,
    "murrayhandylaming" => RadialQuad::MurrayHandyLaming,
};

impl FromStr for RadialQuad {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(&RADIAL_QUADS, "radial quadrature", s)
    }
}

impl fmt::Display for RadialQuad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RadialQuad::Becke => "becke",
            RadialQuad::MuraKnowles => "muraknowles",
            RadialQuad::TreutlerAhlrichs => "treutlerahlrichs",
            RadialQuad::MurrayHandyLaming => "murrayhandylaming",
        };
        f.write_str(name)
    }
}

/// Angular pruning near the nucleus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PruningScheme {
    Unpruned,
    Robust,
    Treutler,
}

static PRUNING_SCHEMES: Map<&'static str, PruningScheme> = phf_map! {
    "unpruned" => PruningScheme::Unpruned,
    "robust" => PruningScheme::Robust,
    "treutler" => PruningScheme::Treutler,
};

impl FromStr for PruningScheme {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(&PRUNING_SCHEMES, "pruning scheme", s)
    }
}

impl fmt::Display for PruningScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PruningScheme::Unpruned => "unpruned",
            PruningScheme::Robust => "robust",
            PruningScheme::Treutler => "treutler",
        };
        f.write_str(name)
    }
}

/// Where a pipeline stage runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionSpace {
    Host,
    Device,
}

static EXECUTION_SPACES: Map<&'static str, ExecutionSpace> = phf_map! {
    "host" => ExecutionSpace::Host,
    "device" => ExecutionSpace::Device,
};

impl FromStr for ExecutionSpace {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(&EXECUTION_SPACES, "execution space", s)
    }
}

impl fmt::Display for ExecutionSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionSpace::Host => "host",
            ExecutionSpace::Device => "device",
        };
        f.write_str(name)
    }
}

fn lookup<T: Copy>(table: &Map<&'static str, T>, kind: &'static str, value: &str) -> Result<T, LookupError> {
    table
        .get(value.to_lowercase().as_str())
        .copied()
        .ok_or_else(|| LookupError::Unknown {
            kind,
            value: value.to_string(),
        })
}
