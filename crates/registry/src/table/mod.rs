//! Tag-indexed tables backing one (context, root, return type) triple.
//!
//! # Mental Model
//!
//! A [`DispatchTable`] maps tags to bound callables and an [`InstanceRegistry`] maps the
//! same tags to the operation objects those callables run against. Both are plain vectors
//! indexed by [`Tag::index`], written together during registration and read-only afterwards.
//!
//! # Fallback Contract
//!
//! When [`DispatchTable::put`] grows the table, every newly created slot is filled with a copy
//! of the slot currently stored at the root's own tag. A root handler registered before a
//! subtype's slot exists is therefore inherited by that subtype, while a root handler
//! registered later is not propagated into slots that already exist. Lookups past the end of
//! the table resolve to the root slot.

use std::any::Any;
use std::fmt;

use crate::error::DispatchError;
use crate::tag::{Tag, root_tag};

mod instances;

pub use instances::{Instance, InstanceKey, InstanceRegistry};


/// Bound callable stored in a dispatch slot.
///
/// Receives the stored operation instance, the root-typed operand and the operand's own tag
/// (for diagnostics), and performs both checked downcasts before running the operation.
pub type Thunk<R, Ret> = fn(&(dyn Any + Send + Sync), &R, Tag) -> Result<Ret, DispatchError>;

/// One entry of a [`DispatchTable`].
pub struct DispatchSlot<R: ?Sized, Ret> {
	thunk: Thunk<R, Ret>,
	owner: Tag,
	instance: InstanceKey,
	operation: &'static str,
	operand: &'static str,
}

impl<R: ?Sized, Ret> DispatchSlot<R, Ret> {
	pub fn new(thunk: Thunk<R, Ret>, owner: Tag, operation: &'static str, operand: &'static str) -> Self {
		Self {
			thunk,
			owner,
			instance: InstanceKey::Tag(owner),
			operation,
			operand,
		}
	}

	/// Tag the callable was registered under.
	///
	/// Differs from the slot's own position when the slot was filled with the root fallback.
	#[inline]
	pub fn owner(&self) -> Tag {
		self.owner
	}

	/// Instance the callable runs against.
	///
	/// The live instance at [`Self::owner`], unless the owner was re-registered after this slot
	/// inherited it.
	#[inline]
	pub fn instance(&self) -> InstanceKey {
		self.instance
	}

	/// Type name of the operation the callable runs.
	pub fn operation(&self) -> &'static str {
		self.operation
	}

	/// Type name of the operand the callable downcasts to.
	pub fn operand(&self) -> &'static str {
		self.operand
	}

	/// Runs the callable against `instance` and `object`.
	#[inline]
	pub fn invoke(&self, instance: &(dyn Any + Send + Sync), object: &R, tag: Tag) -> Result<Ret, DispatchError> {
		(self.thunk)(instance, object, tag)
	}
}

impl<R: ?Sized, Ret> Clone for DispatchSlot<R, Ret> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<R: ?Sized, Ret> Copy for DispatchSlot<R, Ret> {}

impl<R: ?Sized, Ret> fmt::Debug for DispatchSlot<R, Ret> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DispatchSlot")
			.field("owner", &self.owner)
			.field("instance", &self.instance)
			.field("operation", &self.operation)
			.field("operand", &self.operand)
			.finish()
	}
}

/// Sparse, growable map from tag to [`DispatchSlot`] for one call signature `&R -> Ret`.
pub struct DispatchTable<R: ?Sized + 'static, Ret> {
	slots: Vec<Option<DispatchSlot<R, Ret>>>,
}

impl<R: ?Sized + 'static, Ret> DispatchTable<R, Ret> {
	pub fn new() -> Self {
		Self { slots: Vec::new() }
	}

	/// Stores `slot` at `tag`, returning whatever was there before.
	///
	/// Growth fills the new slots with the current root slot (see the module docs).
	pub fn put(&mut self, tag: Tag, slot: DispatchSlot<R, Ret>) -> Option<DispatchSlot<R, Ret>> {
		let index = tag.index();
		if index >= self.slots.len() {
			let fallback = self.root_slot();
			self.slots.resize(index + 1, fallback);
		}
		self.slots[index].replace(slot)
	}

	/// Resolves the slot for `tag`, using the root slot for tags past the end of the table.
	#[inline]
	pub fn get(&self, tag: Tag) -> Option<&DispatchSlot<R, Ret>> {
		let index = if tag.index() < self.slots.len() {
			tag.index()
		} else {
			root_tag::<R>().index()
		};
		self.slots.get(index)?.as_ref()
	}

	/// Returns the slot stored at exactly `tag`, without the out-of-range fallback.
	pub fn slot_at(&self, tag: Tag) -> Option<&DispatchSlot<R, Ret>> {
		self.slots.get(tag.index())?.as_ref()
	}

	/// Returns the slot stored at `tag` only if it was registered under that tag.
	pub fn own_slot(&self, tag: Tag) -> Option<&DispatchSlot<R, Ret>> {
		self.slot_at(tag).filter(|slot| slot.owner == tag)
	}

	/// Points every slot inherited from `owner` at `instance`, leaving `owner`'s own slot alone.
	///
	/// Returns the number of slots updated.
	pub fn retarget_inherited(&mut self, owner: Tag, instance: InstanceKey) -> usize {
		let mut updated = 0;
		for (index, slot) in self.slots.iter_mut().enumerate() {
			if let Some(slot) = slot
				&& index != owner.index()
				&& slot.owner == owner
				&& slot.instance == InstanceKey::Tag(owner)
			{
				slot.instance = instance;
				updated += 1;
			}
		}
		updated
	}

	/// Returns true if any slot other than `owner`'s own runs `owner`'s live instance.
	pub fn has_inherited(&self, owner: Tag) -> bool {
		self.slots.iter().enumerate().any(|(index, slot)| {
			index != owner.index()
				&& slot.is_some_and(|slot| slot.owner == owner && slot.instance == InstanceKey::Tag(owner))
		})
	}

	fn root_slot(&self) -> Option<DispatchSlot<R, Ret>> {
		self.slots.get(root_tag::<R>().index()).copied().flatten()
	}

	/// Current capacity in slots, including empty ones.
	pub fn len(&self) -> usize {
		self.slots.len()
	}

	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	/// Iterates over occupied slots together with their position.
	pub fn iter(&self) -> impl Iterator<Item = (Tag, &DispatchSlot<R, Ret>)> {
		self.slots
			.iter()
			.enumerate()
			.filter_map(|(index, slot)| Some((Tag::new(u32::try_from(index).ok()?)?, slot.as_ref()?)))
	}
}

impl<R: ?Sized + 'static, Ret> Default for DispatchTable<R, Ret> {
	fn default() -> Self {
		Self::new()
	}
}

impl<R: ?Sized + 'static, Ret> fmt::Debug for DispatchTable<R, Ret> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.iter()).finish()
	}
}
