// ABOUTME: Root library module exposing all public modules
// ABOUTME: Provides access to config, bus, dispatch, server, and telegram modules

pub mod bus;
pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod metrics;
pub mod normalize;
pub mod orchestrator;
pub mod registry;
pub mod server;
pub mod telegram;
