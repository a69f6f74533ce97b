//! # gravwell: interactive gravity-well particle field
//!
//! A real-time 2D particle simulation rendered with instanced GPU draws.
//! Bodies orbit and settle against a central "planet" attractor, collide
//! with each other and the canvas walls, and react to pointer shockwaves
//! and scroll input. The simulation and renderer run on a dedicated thread;
//! the main thread owns the window and input.
//!
//! ## Architecture
//!
//! - [`slabs`] - Structure-of-Arrays body buffer over one allocation,
//!   shared between the physics step and GPU upload.
//! - [`physics`] - fixed-timestep world: radial gravity with smoothstep
//!   falloff, tangential/radial damping, grid-accelerated collisions, wall
//!   and planet contacts, shockwave and scroll forces.
//! - [`render`] - one instanced draw of anti-aliased discs/polygons from
//!   two GPU buffers mirroring the slab layout.
//! - [`worker`] - the simulation thread plus the tagged command/event
//!   protocol the main thread drives it with.
//! - [`viewport`] - main-thread policies: mobile/desktop classification,
//!   resize debouncing, cursor coordinate conversion.
//! - [`settings`] - typed presets with explicit patch merging and an
//!   optional TOML override file.
//! - [`palette`] - cached angular-position color lookup tables.
//!
//! ## Data flow
//!
//! ```text
//! input events -> commands -> physics step -> slab upload -> draw
//! ```
//!
//! The worker processes commands in arrival order; force commands mutate
//! physics state cumulatively, so input bursts never queue work.

pub mod app;
pub mod error;
pub mod math;
pub mod palette;
pub mod physics;
pub mod render;
pub mod settings;
pub mod slabs;
pub mod viewport;
pub mod worker;

pub use error::HeroError;
