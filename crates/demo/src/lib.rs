//! Demo consumer of the opreg operation registry.
//!
//! Declares a three-type [`Entity`] hierarchy and two operation contexts:
//! - [`Testing`]: `EntityA -> 1`, `EntityB -> 2`, nothing for `EntityC`
//! - [`Describe`]: specialised for `EntityA` and `EntityB`, with a fallback for the rest
//!
//! A fallback only covers types whose table slot is created after it is installed. Types
//! first tagged after the registry is built always resolve to it.

use opreg_registry::{DispatchError, OperationRegistry};
use tracing::debug;
// Binary-only dependencies.
use {anyhow as _, clap as _, tracing_subscriber as _};
#[cfg(test)]
use rstest as _;

pub mod entities;
pub mod operations;

pub use entities::{Entity, EntityA, EntityB, EntityC, roster};
pub use operations::{Describe, Testing};

/// Outcome of the testing scenario for one entity.
#[derive(Debug)]
pub struct ScenarioResult {
	pub entity: &'static str,
	pub value: Result<i32, DispatchError>,
	pub description: Result<String, DispatchError>,
}

/// Runs both contexts over every entity of the [`roster`].
pub fn run_scenario(registry: &OperationRegistry) -> Vec<ScenarioResult> {
	roster()
		.iter()
		.map(|entity| {
			let entity: &dyn Entity = &**entity;
			let value = registry.call::<Testing, dyn Entity, i32>(entity);
			if let Err(err) = &value {
				debug!(entity = entity.name(), %err, "testing operation unavailable");
			}
			ScenarioResult {
				entity: entity.name(),
				value,
				description: registry.call::<Describe, dyn Entity, String>(entity),
			}
		})
		.collect()
}
