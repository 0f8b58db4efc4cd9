pub mod export;
pub mod providers;

pub use export::*;
pub use providers::*;
