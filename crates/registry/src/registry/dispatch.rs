//! Lookup-and-invoke entry points.

use std::any::type_name;

use super::{OperationRegistry, OperationTable};
use crate::error::DispatchError;
use crate::hierarchy::Root;
use crate::table::DispatchSlot;
use crate::tag::{Tag, type_name_of};

/// Which slot a dispatch would run, without running it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
	/// Tag reported by the operand.
	pub tag: Tag,
	/// Tag the resolved callable was registered under.
	pub owner: Tag,
	pub operation: &'static str,
	pub operand: &'static str,
}

impl Resolution {
	/// True when the operand runs a handler inherited from the root.
	pub fn is_inherited(&self) -> bool {
		self.tag != self.owner
	}
}

impl OperationRegistry {
	/// Invokes the `C` operation registered for the concrete type behind `object`.
	///
	/// Resolves the object's tag once, picks the slot for it (or the root fallback), and runs
	/// the slot's callable against the instance the slot was bound to.
	pub fn call<C, R, Ret>(&self, object: &R) -> Result<Ret, DispatchError>
	where
		C: 'static,
		R: Root + ?Sized,
		Ret: 'static,
	{
		let tag = object.reported_tag();
		let (table, slot) = self.lookup::<C, R, Ret>(tag)?;
		let instance = table
			.instances
			.resolve(slot.instance())
			.ok_or_else(|| unregistered::<C, R, Ret>(tag))?;
		slot.invoke(instance, object, tag)
	}

	/// Reports which handler [`Self::call`] would run for `object`.
	pub fn resolve<C, R, Ret>(&self, object: &R) -> Result<Resolution, DispatchError>
	where
		C: 'static,
		R: Root + ?Sized,
		Ret: 'static,
	{
		let tag = object.reported_tag();
		let (_, slot) = self.lookup::<C, R, Ret>(tag)?;
		Ok(Resolution {
			tag,
			owner: slot.owner(),
			operation: slot.operation(),
			operand: slot.operand(),
		})
	}

	fn lookup<C, R, Ret>(&self, tag: Tag) -> Result<(&OperationTable<R, Ret>, &DispatchSlot<R, Ret>), DispatchError>
	where
		C: 'static,
		R: Root + ?Sized,
		Ret: 'static,
	{
		let table = self
			.table::<C, R, Ret>()
			.ok_or_else(|| unregistered::<C, R, Ret>(tag))?;
		let slot = table
			.dispatch
			.get(tag)
			.ok_or_else(|| unregistered::<C, R, Ret>(tag))?;
		Ok((table, slot))
	}
}

fn unregistered<C, R, Ret>(tag: Tag) -> DispatchError
where
	C: 'static,
	R: ?Sized + 'static,
	Ret: 'static,
{
	DispatchError::UnregisteredOperand {
		context: type_name::<C>(),
		root: type_name::<R>(),
		ret: type_name::<Ret>(),
		operand: type_name_of::<R>(tag).unwrap_or("<untagged>"),
		tag,
	}
}

/// Invokes the `C` operation for `object` through the process-wide registry.
#[inline]
pub fn call<C, R, Ret>(object: &R) -> Result<Ret, DispatchError>
where
	C: 'static,
	R: Root + ?Sized,
	Ret: 'static,
{
	super::registry().call::<C, R, Ret>(object)
}
