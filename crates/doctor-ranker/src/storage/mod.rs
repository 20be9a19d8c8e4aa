//! In-process storage adapters used by the CLI, the server and tests.

mod memory;

pub use memory::{InMemoryDoctorRepository, InMemoryWeightStore};
