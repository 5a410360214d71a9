//! Operations registered over the demo hierarchy.

use opreg_macros::operation;
use opreg_registry::ApplyTo;

use crate::entities::{Entity, EntityA, EntityB};

/// Context of the two-entity testing scenario.
pub struct Testing;

#[derive(Debug, Default)]
pub struct OpOnA;

#[operation(context = Testing, root = dyn Entity)]
impl ApplyTo<EntityA> for OpOnA {
	type Output = i32;

	fn apply_to(&self, _entity: &EntityA) -> i32 {
		1
	}
}

#[derive(Debug, Default)]
pub struct OpOnB;

#[operation(context = Testing, root = dyn Entity)]
impl ApplyTo<EntityB> for OpOnB {
	type Output = i32;

	fn apply_to(&self, _entity: &EntityB) -> i32 {
		2
	}
}

/// Context producing a human readable line per entity.
pub struct Describe;

/// Describes any entity; specialised for the testing pair.
#[derive(Debug, Default)]
pub struct DescribeEntity;

#[operation(context = Describe)]
impl ApplyTo<dyn Entity> for DescribeEntity {
	type Output = String;

	fn apply_to(&self, entity: &dyn Entity) -> String {
		format!("{} (tag {}) has no dedicated description", entity.name(), entity.current_tag())
	}
}

#[operation(context = Describe, root = dyn Entity)]
impl ApplyTo<EntityA> for DescribeEntity {
	type Output = String;

	fn apply_to(&self, entity: &EntityA) -> String {
		format!("{}, first of the testing pair", entity.name())
	}
}

#[operation(context = Describe, root = dyn Entity)]
impl ApplyTo<EntityB> for DescribeEntity {
	type Output = String;

	fn apply_to(&self, entity: &EntityB) -> String {
		format!("{}, second of the testing pair", entity.name())
	}
}
