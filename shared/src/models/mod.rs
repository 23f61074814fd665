//! Domain models for the Dining Waste Tracker

mod food;
mod gamification;
mod impact;
mod recommendation;
mod report;
mod scan;
mod scoring;
mod waste_level;

pub use food::*;
pub use gamification::*;
pub use impact::*;
pub use recommendation::*;
pub use report::*;
pub use scan::*;
pub use scoring::*;
pub use waste_level::*;
