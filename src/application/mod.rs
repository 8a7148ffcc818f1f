//! Application layer - Handlers and services.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;
mod statistics_gateway;

pub use handlers::conversation::{
    EngineErrorDisplay, GatingPolicy, SendTurnError, SendTurnHandler, TurnOutcome, TurnSettings,
};
pub use statistics_gateway::{GatewayConfig, GatewayError, StatisticsGateway};
