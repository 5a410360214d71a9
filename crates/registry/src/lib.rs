//! Double-dispatch operation registry.
//!
//! Plugins define operations over the concrete types of an open hierarchy and the registry
//! runs the right one for a `&dyn Root` whose concrete type is only known at runtime. The
//! dispatch key is the pair {operation context, operand's concrete type}; it is resolved with
//! one virtual call (the operand reports its [`Tag`]) and two vector lookups.
//!
//! # Pieces
//!
//! | Item | Role |
//! |------|------|
//! | [`tag_of`] / [`TagAssigner`] | Lazily assigned, stable per-root type tags. |
//! | [`DispatchTable`] | Tag → bound callable, with root fallback copied on growth. |
//! | [`InstanceRegistry`] | Tag → owned operation object. |
//! | [`OperationReg`] / [`register_operation!`] | Declarative registration descriptors. |
//! | [`OperationRegistry::call`] / [`call`] | Lookup-and-invoke entry points. |
//!
//! # Usage
//!
//! ```ignore
//! pub trait Entity: Any {
//!     fn current_tag(&self) -> Tag;
//! }
//! hierarchy!(Entity);
//!
//! #[derive(Default)]
//! struct Robot;
//! impl Entity for Robot {
//!     enable_vtable!(Entity);
//! }
//!
//! struct Physics;
//!
//! #[derive(Default)]
//! struct StepRobot;
//! impl ApplyTo<Robot> for StepRobot {
//!     type Output = i32;
//!     fn apply_to(&self, _robot: &Robot) -> i32 { 1 }
//! }
//! register_operation!(Physics, dyn Entity, StepRobot, i32, Robot);
//!
//! let robot: Box<dyn Entity> = Box::new(Robot);
//! assert_eq!(call::<Physics, dyn Entity, i32>(&*robot), Ok(1));
//! ```
//!
//! # Phases
//!
//! Registration happens once, while the registry is built (explicitly through [`init`] or on
//! the first [`call`]). Afterwards every table is immutable and dispatch takes no locks.

pub mod config;
pub mod error;
pub mod hierarchy;
pub mod registration;
pub mod registry;
pub mod table;
pub mod tag;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use config::{DuplicatePolicy, RegistryConfig};
pub use error::{DispatchError, InitError};
pub use hierarchy::{Root, current_tag_of};
pub use registration::{ApplyTo, OperationReg, descriptors};
pub use registry::{
	DuplicateRegistration, OperationRegistry, Registration, RegistryBuilder, Resolution, TableKey, call, init,
	init_with, registry,
};
pub use table::{DispatchSlot, DispatchTable, Instance, InstanceKey, InstanceRegistry, Thunk};
pub use tag::{Tag, TagAssigner, root_tag, tag_of, type_name_of};

#[doc(hidden)]
pub mod __private {
	pub use inventory;
}
