//! Demo entity hierarchy.

use std::any::Any;

use opreg_registry::{Tag, enable_vtable, hierarchy};

/// Root of the demo hierarchy.
pub trait Entity: Any + Send + Sync {
	/// Short display name.
	fn name(&self) -> &'static str;

	fn current_tag(&self) -> Tag;
}

hierarchy!(Entity);

#[derive(Debug, Default, Clone, Copy)]
pub struct EntityA;

#[derive(Debug, Default, Clone, Copy)]
pub struct EntityB;

/// Has no `Testing` operation; only the `Describe` fallback covers it.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntityC;

impl Entity for EntityA {
	fn name(&self) -> &'static str {
		"EntityA"
	}

	enable_vtable!(Entity);
}

impl Entity for EntityB {
	fn name(&self) -> &'static str {
		"EntityB"
	}

	enable_vtable!(Entity);
}

impl Entity for EntityC {
	fn name(&self) -> &'static str {
		"EntityC"
	}

	enable_vtable!(Entity);
}

/// One instance of every demo entity type.
pub fn roster() -> Vec<Box<dyn Entity>> {
	vec![Box::new(EntityA), Box::new(EntityB), Box::new(EntityC)]
}
