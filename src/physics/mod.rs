//! Fixed-timestep 2D physics: radial gravity well, inter-body collision,
//! wall and planet contacts, shockwave and scroll forces.

pub mod collision;
pub mod engine;
pub mod grid;

pub use engine::{PhysicsEngine, PIXELS_PER_METER, RESIZE_JITTER_PX};
pub use grid::{CollisionPair, SpatialGrid};
