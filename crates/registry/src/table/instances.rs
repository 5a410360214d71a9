use std::any::Any;
use std::fmt;

use crate::tag::Tag;

/// Owned, type-erased operation object.
pub type Instance = Box<dyn Any + Send + Sync>;

/// Where a dispatch slot finds its operation instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstanceKey {
	/// The live instance stored at a tag.
	Tag(Tag),
	/// An instance displaced from its tag while inherited slots still ran against it.
	Retired(usize),
}

/// Tag-indexed owner of the operation objects a [`super::DispatchTable`] runs against.
///
/// Unlike the dispatch table, growth never copies a fallback: missing slots stay empty.
/// Every stored instance is dropped exactly once, when it is displaced or when the registry
/// itself is dropped. Retired instances live as long as the registry.
#[derive(Default)]
pub struct InstanceRegistry {
	slots: Vec<Option<Instance>>,
	retired: Vec<Instance>,
}

impl InstanceRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores `instance` at `tag` and returns the instance it displaced.
	pub fn put(&mut self, tag: Tag, instance: Instance) -> Option<Instance> {
		let index = tag.index();
		if index >= self.slots.len() {
			self.slots.resize_with(index + 1, || None);
		}
		self.slots[index].replace(instance)
	}

	#[inline]
	pub fn get(&self, tag: Tag) -> Option<&(dyn Any + Send + Sync)> {
		self.slots.get(tag.index())?.as_deref()
	}

	/// Keeps a displaced instance alive and returns the key that reaches it.
	pub fn retire(&mut self, instance: Instance) -> InstanceKey {
		self.retired.push(instance);
		InstanceKey::Retired(self.retired.len() - 1)
	}

	#[inline]
	pub fn resolve(&self, key: InstanceKey) -> Option<&(dyn Any + Send + Sync)> {
		match key {
			InstanceKey::Tag(tag) => self.get(tag),
			InstanceKey::Retired(index) => self.retired.get(index).map(|instance| &**instance),
		}
	}

	/// Number of occupied slots.
	pub fn len(&self) -> usize {
		self.slots.iter().filter(|slot| slot.is_some()).count()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl fmt::Debug for InstanceRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("InstanceRegistry")
			.field("capacity", &self.slots.len())
			.field("occupied", &self.len())
			.field("retired", &self.retired.len())
			.finish()
	}
}
