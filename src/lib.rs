//! Asteroid Run library
//!
//! A procedurally generated asteroid field that tiles space in every
//! direction, with a ship that races through it between checkpoint targets.
//! The field, its collision queries and the session rules are plain data and
//! functions; the Bevy plugins wire them into an app.

pub mod asteroid;
pub mod asteroid_rendering;
pub mod collision;
pub mod config;
pub mod constants;
pub mod error;
pub mod field;
pub mod game;
pub mod graphics;
pub mod noise_field;
pub mod placement;
pub mod player;
pub mod rendering;
pub mod spatial_partition;
pub mod sphere;
pub mod wrapping;
