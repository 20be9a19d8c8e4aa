//! Doctor roster: identity, raw metric sets and the storage seam the rest of
//! the ranking pipeline reads from.

pub mod domain;
pub mod repository;

pub use domain::{
    DoctorId, DoctorProfile, DoctorRecord, MetricSet, MetricWindow, QualityScores, WindowCounts,
};
pub use repository::{DoctorRepository, RepositoryError};
