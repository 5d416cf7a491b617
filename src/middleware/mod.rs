pub mod extraction_gate;
pub mod logging;

pub use extraction_gate::*;
pub use logging::*;
