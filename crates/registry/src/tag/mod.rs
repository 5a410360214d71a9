//! Synthetic runtime type tags.
//!
//! Every (concrete type, root) pair receives a small non-zero integer the first time it is
//! queried. Tags index the dispatch and instance tables, so they stay dense per root but carry
//! no meaning beyond identity: values depend on the order in which types are first queried,
//! never on the types themselves.

use std::any::{TypeId, type_name};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::LazyLock;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;


/// Runtime identifier of a concrete type within one root hierarchy.
///
/// Zero is reserved as the "unassigned" sentinel and cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(NonZeroU32);

impl Tag {
	/// Wraps a raw tag value, rejecting the zero sentinel.
	pub const fn new(raw: u32) -> Option<Self> {
		match NonZeroU32::new(raw) {
			Some(raw) => Some(Self(raw)),
			None => None,
		}
	}

	/// Returns the raw tag value.
	pub const fn get(self) -> u32 {
		self.0.get()
	}

	/// Returns the table index addressed by this tag.
	#[inline]
	pub const fn index(self) -> usize {
		self.0.get() as usize
	}
}

impl fmt::Display for Tag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Tag bookkeeping for every root hierarchy.
///
/// Holds one counter per root and the tag already handed out to each
/// (derived, root) pair. The process-wide instance backs [`tag_of`]; standalone
/// instances are useful when tag numbering has to be reasoned about in isolation.
#[derive(Debug, Default)]
pub struct TagAssigner {
	next: FxHashMap<TypeId, NonZeroU32>,
	tags: FxHashMap<(TypeId, TypeId), Tag>,
	names: FxHashMap<(TypeId, Tag), &'static str>,
}

impl TagAssigner {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the tag already assigned to `derived` under `root`, if any.
	#[inline]
	pub fn lookup(&self, derived: TypeId, root: TypeId) -> Option<Tag> {
		self.tags.get(&(derived, root)).copied()
	}

	/// Returns the tag of `derived` under `root`, assigning the next free one on first use.
	///
	/// `name` is remembered for diagnostics and only recorded on first assignment.
	pub fn assign(&mut self, derived: TypeId, root: TypeId, name: &'static str) -> Tag {
		if let Some(tag) = self.lookup(derived, root) {
			return tag;
		}

		let next = self.next.entry(root).or_insert(NonZeroU32::MIN);
		let tag = Tag(*next);
		*next = next
			.checked_add(1)
			.unwrap_or_else(|| panic!("tag space exhausted for root {root:?}"));

		self.tags.insert((derived, root), tag);
		self.names.insert((root, tag), name);
		tag
	}

	/// Returns the name of the type that owns `tag` under `root`.
	pub fn name_of(&self, root: TypeId, tag: Tag) -> Option<&'static str> {
		self.names.get(&(root, tag)).copied()
	}

	/// Number of tags handed out under `root`.
	pub fn assigned(&self, root: TypeId) -> usize {
		self.next.get(&root).map_or(0, |next| next.get() as usize - 1)
	}
}

static TAGS: LazyLock<RwLock<TagAssigner>> = LazyLock::new(|| RwLock::new(TagAssigner::new()));

/// Returns the process-wide tag of `D` within the hierarchy rooted at `R`.
///
/// The first call for a pair assigns the next tag of `R`; every later call returns the
/// same value.
pub fn tag_of<D, R>() -> Tag
where
	D: ?Sized + 'static,
	R: ?Sized + 'static,
{
	let derived = TypeId::of::<D>();
	let root = TypeId::of::<R>();

	if let Some(tag) = TAGS.read().lookup(derived, root) {
		return tag;
	}

	let tag = TAGS.write().assign(derived, root, type_name::<D>());
	tracing::trace!(%tag, derived = type_name::<D>(), root = type_name::<R>(), "tag resolved");
	tag
}

/// Tag of the root type itself; indexes the fallback slot of every table over `R`.
#[inline]
pub fn root_tag<R>() -> Tag
where
	R: ?Sized + 'static,
{
	tag_of::<R, R>()
}

/// Name of the concrete type holding `tag` in the hierarchy rooted at `R`.
pub fn type_name_of<R>(tag: Tag) -> Option<&'static str>
where
	R: ?Sized + 'static,
{
	TAGS.read().name_of(TypeId::of::<R>(), tag)
}
