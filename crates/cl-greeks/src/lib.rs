pub mod chain;
pub mod context;
pub mod contract;
pub mod engine;
pub mod greeks;

pub use chain::*;
pub use context::*;
pub use contract::*;
pub use engine::*;
pub use greeks::*;
