pub mod balance;
pub mod collocation;
pub mod xc;

pub use balance::LoadBalancer;
pub use xc::{IntegrateError, XcIntegrator, XcOutput};
