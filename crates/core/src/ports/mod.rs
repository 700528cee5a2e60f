mod cache;
mod gateway;
mod rule;

pub use cache::*;
pub use gateway::*;
pub use rule::*;
