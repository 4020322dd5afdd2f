//! Orbital Void arena server
//!
//! Authoritative two-seat rocket duels inside a circular arena:
//! - Fixed-step simulation of rockets, bullets and scripted opponents
//! - Named rooms with a waiting/playing/ended lifecycle
//! - WebSocket sessions broadcasting a snapshot every tick

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod session;
pub mod util;
pub mod ws;
