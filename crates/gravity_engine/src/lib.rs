//! A gravitational lensing particle toy.
//!
//! Particles orbit, and fall into, a single black hole. The black hole's gravity follows the
//! Paczyński–Wiita potential, which has a real event horizon, and particles are integrated with
//! Velocity Verlet. Nothing may move faster than a fixed fraction of the speed of light. Each
//! frame is drawn onto a plain RGBA [`canvas::Canvas`], with a reference grid that bends around
//! the black hole as if its light were being lensed.
//!
//! The engine knows nothing about terminals, windows or the passage of real time. A host calls
//! [`simulation::Simulation::tick`] and [`simulation::Simulation::render`] once per frame and
//! feeds user input in as [`simulation::Command`]s.

pub mod attractor;
pub mod canvas;
pub mod config;
pub mod errors;
pub mod gravity;
pub mod lensing;
pub mod params;
pub mod particle;
pub mod pool;
pub mod renderer;
pub mod simulation;
pub mod spawn;
pub mod trail;

pub use errors::{EngineError, Result};
pub use simulation::{Command, Simulation};
