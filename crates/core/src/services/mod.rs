mod cache;
mod classifier;
mod history;
mod scanner;

#[cfg(test)]
mod testing;

pub use cache::*;
pub use classifier::*;
pub use history::*;
pub use scanner::*;
