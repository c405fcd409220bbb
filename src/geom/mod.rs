//! Geometry primitives for the battle field
//!
//! Flat 2D space: positions are `Vec2`, headings are radians
//! (0 = +x, counter-clockwise positive). Pick boundaries are the
//! closed regions that target picks are validated against; their
//! `closest_point` operation is exact, not approximated, because
//! pick legality depends on it.

pub mod boundary;
pub mod vec2;

pub use boundary::{FiringArc, PickBoundary};
pub use vec2::{normalize_angle, Vec2};
