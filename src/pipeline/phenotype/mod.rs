pub mod classify;
pub mod rules;

pub use classify::*;
pub use rules::*;
