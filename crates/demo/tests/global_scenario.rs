//! The testing scenario through the process-wide registry.

use opreg_demo::{Describe, Entity, EntityA, EntityB, EntityC, Testing, roster};
use opreg_registry::{InitError, RegistryConfig, call, current_tag_of, init, init_with};
use pretty_assertions::assert_eq;
use rstest::rstest;
use {anyhow as _, clap as _, opreg_macros as _, tracing as _, tracing_subscriber as _};

#[rstest]
#[case::entity_a(Box::new(EntityA) as Box<dyn Entity>, 1)]
#[case::entity_b(Box::new(EntityB) as Box<dyn Entity>, 2)]
fn testing_context_dispatches_per_type(#[case] entity: Box<dyn Entity>, #[case] expected: i32) {
	init();
	assert_eq!(call::<Testing, dyn Entity, i32>(&*entity), Ok(expected));
}

#[test]
fn unregistered_entity_fails_in_testing_and_falls_back_in_describe() {
	init();
	let entity: Box<dyn Entity> = Box::new(EntityC);

	let err = call::<Testing, dyn Entity, i32>(&*entity).unwrap_err();
	assert!(err.is_unregistered());

	let description = call::<Describe, dyn Entity, String>(&*entity).expect("fallback");
	assert_eq!(
		description,
		format!("EntityC (tag {}) has no dedicated description", current_tag_of(&*entity))
	);
}

#[test]
fn roster_tags_are_distinct_and_stable() {
	init();
	let first: Vec<_> = roster().iter().map(|entity| current_tag_of(&**entity)).collect();
	let second: Vec<_> = roster().iter().map(|entity| current_tag_of(&**entity)).collect();

	assert_eq!(first, second);
	assert_ne!(first[0], first[1]);
	assert_ne!(first[1], first[2]);
	assert_ne!(first[0], first[2]);
}

#[test]
fn reconfiguring_after_init_is_rejected() {
	init();
	assert_eq!(init_with(RegistryConfig::default()).unwrap_err(), InitError::AlreadyInitialized);
}
