pub mod enums;
pub mod report;
pub mod variant;

pub use enums::*;
pub use report::*;
pub use variant::*;
