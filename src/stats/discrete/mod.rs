//! Discrete distributions.

mod bernoulli;
mod discrete_uniform;
mod geometric;

pub use bernoulli::Bernoulli;
pub use discrete_uniform::DiscreteUniform;
pub use geometric::Geometric;
