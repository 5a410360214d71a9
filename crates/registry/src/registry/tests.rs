use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use rstest::rstest;

use super::{OperationRegistry, RegistryBuilder};
use crate::config::{DuplicatePolicy, RegistryConfig};
use crate::error::DispatchError;
use crate::registration::ApplyTo;
use crate::tag::{root_tag, tag_of};
use crate::test_fixtures::{Const, hierarchy_fixture};

hierarchy_fixture!(Entity: EntityA, EntityB, EntityC);

struct Testing;
struct Physics;

fn testing_registry() -> OperationRegistry {
	let mut builder = RegistryBuilder::new();
	builder.register::<Testing, dyn Entity, Const<1>, i32, EntityA>();
	builder.register::<Testing, dyn Entity, Const<2>, i32, EntityB>();
	builder.build()
}

#[rstest]
#[case::entity_a(Box::new(EntityA) as Box<dyn Entity>, 1)]
#[case::entity_b(Box::new(EntityB) as Box<dyn Entity>, 2)]
fn dispatch_selects_operation_by_concrete_type(#[case] entity: Box<dyn Entity>, #[case] expected: i32) {
	let registry = testing_registry();
	assert_eq!(registry.call::<Testing, dyn Entity, i32>(&*entity), Ok(expected));
}

#[test]
fn unregistered_operand_without_fallback_is_reported() {
	let registry = testing_registry();

	let err = registry
		.call::<Testing, dyn Entity, i32>(&EntityC)
		.expect_err("EntityC has no handler");

	assert!(err.is_unregistered());
	let DispatchError::UnregisteredOperand { operand, tag, .. } = err else {
		panic!("unexpected error: {err}");
	};
	assert!(operand.ends_with("EntityC"), "operand was {operand}");
	assert_eq!(tag, tag_of::<EntityC, dyn Entity>());
	assert!(err.to_string().contains("no fallback"));
}

#[test]
fn unknown_context_is_reported() {
	let registry = testing_registry();

	let err = registry.call::<Physics, dyn Entity, i32>(&EntityA).unwrap_err();
	assert!(err.is_unregistered());

	let err = registry.call::<Testing, dyn Entity, u8>(&EntityA).unwrap_err();
	assert!(err.is_unregistered());
}

#[test]
fn contexts_and_return_types_use_separate_tables() {
	#[derive(Default)]
	struct Label;
	impl ApplyTo<EntityA> for Label {
		type Output = &'static str;

		fn apply_to(&self, _operand: &EntityA) -> &'static str {
			"a"
		}
	}

	let mut builder = RegistryBuilder::new();
	builder.register::<Testing, dyn Entity, Const<1>, i32, EntityA>();
	builder.register::<Physics, dyn Entity, Const<10>, i32, EntityA>();
	builder.register::<Testing, dyn Entity, Label, &'static str, EntityA>();
	let registry = builder.build();

	assert_eq!(registry.table_count(), 3);
	assert_eq!(registry.call::<Testing, dyn Entity, i32>(&EntityA), Ok(1));
	assert_eq!(registry.call::<Physics, dyn Entity, i32>(&EntityA), Ok(10));
	assert_eq!(registry.call::<Testing, dyn Entity, &'static str>(&EntityA), Ok("a"));
}

#[test]
fn fallback_registered_first_covers_later_types() {
	hierarchy_fixture!(Shape: Square, Circle);

	let mut builder = RegistryBuilder::new();
	let root = builder.register_fallback::<Testing, dyn Shape, Const<0>, i32>();
	builder.register::<Testing, dyn Shape, Const<1>, i32, Square>();
	let registry = builder.build();

	assert_eq!(registry.call::<Testing, dyn Shape, i32>(&Square), Ok(1));
	assert_eq!(registry.call::<Testing, dyn Shape, i32>(&Circle), Ok(0));

	let resolution = registry.resolve::<Testing, dyn Shape, i32>(&Circle).unwrap();
	assert!(resolution.is_inherited());
	assert_eq!(resolution.owner, root);
}

#[test]
fn fallback_is_copied_into_slots_created_by_growth() {
	hierarchy_fixture!(Shape: Square, Circle);

	let root = root_tag::<dyn Shape>();
	let circle = tag_of::<Circle, dyn Shape>();

	let mut builder = RegistryBuilder::new();
	builder.register_fallback::<Testing, dyn Shape, Const<0>, i32>();
	let square = builder.register::<Testing, dyn Shape, Const<1>, i32, Square>();
	assert!(circle < square);
	let registry = builder.build();

	let resolution = registry.resolve::<Testing, dyn Shape, i32>(&Circle).unwrap();
	assert_eq!(resolution.tag, circle);
	assert_eq!(resolution.owner, root);
	assert_eq!(registry.call::<Testing, dyn Shape, i32>(&Circle), Ok(0));
	assert!(!registry.is_registered::<Testing, dyn Shape, i32, Circle>());
	assert!(registry.is_registered::<Testing, dyn Shape, i32, Square>());
	assert!(registry.is_registered::<Testing, dyn Shape, i32, dyn Shape>());
}

#[test]
fn fallback_registered_late_skips_existing_slots() {
	hierarchy_fixture!(Shape: Square, Circle, Triangle);

	let circle = tag_of::<Circle, dyn Shape>();
	let root = root_tag::<dyn Shape>();
	assert!(circle < root);

	let mut builder = RegistryBuilder::new();
	builder.register::<Testing, dyn Shape, Const<1>, i32, Square>();
	builder.register_fallback::<Testing, dyn Shape, Const<0>, i32>();
	let registry = builder.build();

	let err = registry.call::<Testing, dyn Shape, i32>(&Circle).unwrap_err();
	assert!(err.is_unregistered());

	// Triangle is tagged only now, past the end of the table.
	assert_eq!(registry.call::<Testing, dyn Shape, i32>(&Triangle), Ok(0));
}

#[rstest]
#[case::last_wins(DuplicatePolicy::LastWins, 2)]
#[case::first_wins(DuplicatePolicy::FirstWins, 1)]
fn duplicate_registration_follows_policy(#[case] policy: DuplicatePolicy, #[case] expected: i32) {
	let mut builder = RegistryBuilder::with_config(RegistryConfig::default().with_duplicate_policy(policy));
	builder.register::<Testing, dyn Entity, Const<1>, i32, EntityA>();
	builder.register::<Testing, dyn Entity, Const<2>, i32, EntityA>();
	let registry = builder.build();

	assert_eq!(registry.call::<Testing, dyn Entity, i32>(&EntityA), Ok(expected));

	let [duplicate] = registry.duplicates() else {
		panic!("expected one duplicate, got {:?}", registry.duplicates());
	};
	assert!(duplicate.existing.ends_with("Const<1>"));
	assert!(duplicate.incoming.ends_with("Const<2>"));
	assert_eq!(duplicate.policy, policy);
	assert_eq!(duplicate.tag, tag_of::<EntityA, dyn Entity>());
}

#[test]
#[should_panic(expected = "duplicate operation registration")]
fn duplicate_registration_can_panic() {
	let mut builder =
		RegistryBuilder::with_config(RegistryConfig::default().with_duplicate_policy(DuplicatePolicy::Panic));
	builder.register::<Testing, dyn Entity, Const<1>, i32, EntityB>();
	builder.register::<Testing, dyn Entity, Const<2>, i32, EntityB>();
}

#[test]
fn inherited_slot_keeps_its_handler_when_root_is_replaced() {
	hierarchy_fixture!(Shape: Square, Circle, Triangle);

	let root = root_tag::<dyn Shape>();
	let _circle = tag_of::<Circle, dyn Shape>();

	let mut builder = RegistryBuilder::new();
	builder.register_fallback::<Testing, dyn Shape, Const<0>, i32>();
	builder.register::<Testing, dyn Shape, Const<1>, i32, Square>();
	builder.register_fallback::<Testing, dyn Shape, Const<5>, i32>();
	let registry = builder.build();

	assert_eq!(registry.call::<Testing, dyn Shape, i32>(&Circle), Ok(0));
	let resolution = registry.resolve::<Testing, dyn Shape, i32>(&Circle).unwrap();
	assert_eq!(resolution.owner, root);
	assert!(resolution.operation.ends_with("Const<0>"));

	// Tagged after the build, so it resolves to the current root slot.
	assert_eq!(registry.call::<Testing, dyn Shape, i32>(&Triangle), Ok(5));
	assert_eq!(registry.call::<Testing, dyn Shape, i32>(&Square), Ok(1));
}

#[test]
fn operand_reporting_a_foreign_tag_is_rejected() {
	trait Liar: std::any::Any {
		fn current_tag(&self) -> crate::Tag;
	}
	crate::hierarchy!(Liar);

	#[derive(Default)]
	struct Honest;
	impl Liar for Honest {
		crate::enable_vtable!(Liar);
	}

	struct Impostor;
	impl Liar for Impostor {
		fn current_tag(&self) -> crate::Tag {
			tag_of::<Honest, dyn Liar>()
		}
	}

	let mut builder = RegistryBuilder::new();
	let honest = builder.register::<Testing, dyn Liar, Const<1>, i32, Honest>();
	let registry = builder.build();

	assert_eq!(registry.call::<Testing, dyn Liar, i32>(&Honest), Ok(1));

	let err = registry.call::<Testing, dyn Liar, i32>(&Impostor).unwrap_err();
	let DispatchError::OperandMismatch { expected, tag } = err else {
		panic!("unexpected error: {err}");
	};
	assert!(expected.ends_with("Honest"), "expected was {expected}");
	assert_eq!(tag, honest);
	assert!(!err.is_unregistered());
}

#[test]
fn registrations_are_recorded_in_order() {
	hierarchy_fixture!(Shape: Square);

	let mut builder = RegistryBuilder::new();
	builder.register::<Testing, dyn Shape, Const<1>, i32, Square>();
	builder.register_fallback::<Testing, dyn Shape, Const<0>, i32>();
	let registry = builder.build();

	let recorded: Vec<(bool, bool)> = registry
		.registrations()
		.iter()
		.map(|r| (r.operand.ends_with("Square"), r.fallback))
		.collect();
	assert_eq!(recorded, vec![(true, false), (false, true)]);
	assert!(registry.registrations()[1].to_string().ends_with("[fallback]"));
}

static COUNTED_DROPS: AtomicUsize = AtomicUsize::new(0);

#[derive(Default)]
struct Counted;

impl Drop for Counted {
	fn drop(&mut self) {
		COUNTED_DROPS.fetch_add(1, Ordering::SeqCst);
	}
}

impl<D: ?Sized> ApplyTo<D> for Counted {
	type Output = i32;

	fn apply_to(&self, _operand: &D) -> i32 {
		-1
	}
}

#[test]
fn registry_drops_every_instance_once() {
	struct Teardown;

	let mut builder = RegistryBuilder::new();
	builder.register::<Teardown, dyn Entity, Counted, i32, EntityA>();
	builder.register::<Teardown, dyn Entity, Counted, i32, EntityB>();
	builder.register::<Teardown, dyn Entity, Counted, i32, EntityB>();
	assert_eq!(COUNTED_DROPS.load(Ordering::SeqCst), 1, "displaced instance dropped on overwrite");

	let registry = builder.build();
	assert_eq!(registry.call::<Teardown, dyn Entity, i32>(&EntityB), Ok(-1));

	drop(registry);
	assert_eq!(COUNTED_DROPS.load(Ordering::SeqCst), 3);
}
