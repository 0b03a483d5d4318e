pub mod integrate;

pub use integrate::{IntegrationConfig, IntegrationSummary, WorkflowError, run};
