//! The floating-point type used throughout the engine.
//!
//! Only one IEEE type is ever in play for a given build: `f64` by default,
//! or `f32` when the crate is built with the `f32` feature. Arbitrary or
//! extended precision is out of scope; deep zooms are a non-goal.

#[cfg(not(feature = "f32"))]
pub type Float = f64;

#[cfg(feature = "f32")]
pub type Float = f32;

pub const PI: Float = std::f64::consts::PI as Float;
