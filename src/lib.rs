//! trip-route core
//!
//! Assembles an ordered list of trip stops into a continuous, renderable
//! route: one routing query per leg, decoded polyline geometry, and a
//! fitted viewport.

pub mod traits;
pub mod geo;
pub mod error;
pub mod polyline;
pub mod waypoint;
pub mod provider;
pub mod haversine;
pub mod fetcher;
pub mod assembler;
pub mod bounds;
pub mod config;
pub mod planner;
