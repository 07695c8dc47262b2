//! Domain layer for the box office backend.
//!
//! Holds the event catalog, seat inventory and booking types, the typed
//! errors, and the booking lifecycle together with its storage and
//! notification ports. Nothing here touches a database directly.

pub mod booking;
pub mod catalog;
pub mod error;
pub mod inventory;
pub mod lifecycle;
pub mod roles;
pub mod status;
pub mod types;
