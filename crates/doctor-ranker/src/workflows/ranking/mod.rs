//! Ranking service and HTTP surface over weights, standings and imports.

pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use router::ranking_router;
pub use service::{
    ImportResult, RankingService, RankingServiceError, RecalculationReport, Standings,
};
