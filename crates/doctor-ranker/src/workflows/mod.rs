pub mod import;
pub mod ranking;
pub mod recalculation;
pub mod roster;
pub mod scoring;
pub mod weights;
