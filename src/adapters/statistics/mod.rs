//! Statistics Engine Adapters.
//!
//! - `RscriptEngine` - The BOIN R package through an `Rscript` subprocess
//! - `MockStatisticsEngine` - Scripted results for tests and offline runs

mod mock_engine;
mod rscript_engine;

pub use mock_engine::{
    canned_boundary_table, canned_operating_characteristics, EngineCall, MockStatisticsEngine,
};
pub use rscript_engine::RscriptEngine;
