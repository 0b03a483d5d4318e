pub mod angular;
pub mod molgrid;
pub mod radial;
pub mod spec;
pub mod weights;

pub use molgrid::{GridError, GridPoint, MolGrid};
pub use spec::{ExecutionSpace, GridSize, LookupError, PruningScheme, RadialQuad};
