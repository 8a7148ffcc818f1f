//! BOIN Assistant - Conversational support for BOIN dose-finding trial design
//!
//! A clinician describes a phase I trial in free text; a hosted language
//! model answers with reference to the BOIN guidelines, and any design
//! parameters found in its reply are run through the BOIN statistics engine.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
