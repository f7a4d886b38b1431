//! Continuous distributions.

mod exponential;
mod log_normal;
mod normal;
mod triangular;
mod uniform;

pub use exponential::Exponential;
pub use log_normal::LogNormal;
pub use normal::Normal;
pub use triangular::Triangular;
pub use uniform::Uniform;
