//! Operation registration via `inventory`.
//!
//! Each `register_operation!` or `register_fallback!` invocation submits an
//! [`OperationReg`] descriptor. Nothing is installed at load time: the descriptors are
//! collected when the process-wide registry is first built (see [`crate::init`]), or pulled
//! into an explicit [`RegistryBuilder`] with [`RegistryBuilder::extend_inventory`].

use std::any::{Any, type_name};

use crate::error::DispatchError;
use crate::hierarchy::Root;
use crate::registry::RegistryBuilder;
use crate::tag::Tag;

/// Per-operand logic of an operation.
///
/// An operation type implements this once per concrete type it supports, and once for the
/// root itself (`ApplyTo<dyn Root>`) when it provides a fallback.
pub trait ApplyTo<D: ?Sized> {
	type Output;

	fn apply_to(&self, operand: &D) -> Self::Output;
}

/// Static registration descriptor collected via `inventory`.
pub struct OperationReg {
	/// Crate that submitted the descriptor.
	pub crate_name: &'static str,
	/// Operation type name.
	pub operation: fn() -> &'static str,
	/// Operand type name (the root's name for fallbacks).
	pub operand: fn() -> &'static str,
	/// Installs the slot and instance into a builder, returning the tag it landed on.
	pub install: fn(&mut RegistryBuilder) -> Tag,
}

inventory::collect!(OperationReg);

/// Every descriptor submitted through `inventory`, in link order.
pub fn descriptors() -> impl Iterator<Item = &'static OperationReg> {
	inventory::iter::<OperationReg>.into_iter()
}

impl OperationReg {
	/// Descriptor for `Op` handling the concrete operand `D`.
	pub const fn new<C, R, Op, Ret, D>(crate_name: &'static str) -> Self
	where
		C: 'static,
		R: Root + ?Sized,
		Op: ApplyTo<D, Output = Ret> + Default + Send + Sync + 'static,
		Ret: 'static,
		D: Any,
	{
		Self {
			crate_name,
			operation: type_name::<Op>,
			operand: type_name::<D>,
			install: RegistryBuilder::register::<C, R, Op, Ret, D>,
		}
	}

	/// Descriptor for `Op` handling the root `R` itself.
	pub const fn fallback<C, R, Op, Ret>(crate_name: &'static str) -> Self
	where
		C: 'static,
		R: Root + ?Sized,
		Op: ApplyTo<R, Output = Ret> + Default + Send + Sync + 'static,
		Ret: 'static,
	{
		Self {
			crate_name,
			operation: type_name::<Op>,
			operand: type_name::<R>,
			install: RegistryBuilder::register_fallback::<C, R, Op, Ret>,
		}
	}
}

impl std::fmt::Debug for OperationReg {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("OperationReg")
			.field("crate_name", &self.crate_name)
			.field("operation", &(self.operation)())
			.field("operand", &(self.operand)())
			.finish()
	}
}

fn downcast_operation<Op: 'static>(instance: &(dyn Any + Send + Sync), tag: Tag) -> Result<&Op, DispatchError> {
	instance.downcast_ref::<Op>().ok_or(DispatchError::OperationMismatch {
		expected: type_name::<Op>(),
		tag,
	})
}

pub(crate) fn apply_concrete<Op, R, D>(
	instance: &(dyn Any + Send + Sync),
	object: &R,
	tag: Tag,
) -> Result<Op::Output, DispatchError>
where
	Op: ApplyTo<D> + 'static,
	R: Root + ?Sized,
	D: Any,
{
	let operation = downcast_operation::<Op>(instance, tag)?;
	let operand = object
		.as_any()
		.downcast_ref::<D>()
		.ok_or(DispatchError::OperandMismatch {
			expected: type_name::<D>(),
			tag,
		})?;
	Ok(operation.apply_to(operand))
}

pub(crate) fn apply_root<Op, R>(
	instance: &(dyn Any + Send + Sync),
	object: &R,
	tag: Tag,
) -> Result<Op::Output, DispatchError>
where
	Op: ApplyTo<R> + 'static,
	R: Root + ?Sized,
{
	let operation = downcast_operation::<Op>(instance, tag)?;
	Ok(operation.apply_to(object))
}

/// Registers `$operation` for the concrete operand `$operand`.
///
/// ```ignore
/// register_operation!(Testing, dyn Entity, OpOnRobot, i32, Robot);
/// ```
#[macro_export]
macro_rules! register_operation {
	($context:ty, $root:ty, $operation:ty, $ret:ty, $operand:ty $(,)?) => {
		$crate::__private::inventory::submit! {
			$crate::OperationReg::new::<$context, $root, $operation, $ret, $operand>(
				env!("CARGO_PKG_NAME"),
			)
		}
	};
}

/// Registers `$operation` as the fallback for every operand of `$root` without a slot of
/// its own.
///
/// ```ignore
/// register_fallback!(Describe, dyn Entity, DescribeAny, String);
/// ```
#[macro_export]
macro_rules! register_fallback {
	($context:ty, $root:ty, $operation:ty, $ret:ty $(,)?) => {
		$crate::__private::inventory::submit! {
			$crate::OperationReg::fallback::<$context, $root, $operation, $ret>(env!("CARGO_PKG_NAME"))
		}
	};
}
