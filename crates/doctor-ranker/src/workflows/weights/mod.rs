//! Named weight configurations, their invariants and single-active management.

pub mod analysis;
pub mod domain;
pub mod manager;
pub mod repository;
pub mod validation;

pub use analysis::{analyze, presets, RiskLevel, WeightImpact, WeightPreset, WeightStrategy};
pub use domain::{
    ComponentKind, MedicalWeights, StandardWeights, WeightBounds, WeightConfigDraft,
    WeightConfigId, WeightConfigRecord, WeightConfiguration, WeightLimits, WeightShape,
    WeightSnapshot, SUM_TOLERANCE,
};
pub use manager::{WeightConfigError, WeightConfigManager};
pub use repository::{StoreError, WeightConfigStore};
pub use validation::{WeightCheck, WeightValidationError, WeightViolation};
