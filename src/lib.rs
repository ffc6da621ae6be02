//! Roomcast - Room-Scoped Real-Time Transaction Relay
//!
//! This crate relays producer-submitted transaction events to WebSocket
//! clients subscribed to the event's destination room, fanning events out
//! across a horizontally scaled fleet of relay processes via Redis pub/sub.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
