//! Registry construction and the process-wide accessor.
//!
//! # Lifecycle
//!
//! 1. **Registration:** a [`RegistryBuilder`] receives registrations in call order, either
//!    directly ([`RegistryBuilder::register`], [`RegistryBuilder::register_fallback`]) or from
//!    the `inventory` descriptors ([`RegistryBuilder::extend_inventory`]).
//! 2. **Freeze:** [`RegistryBuilder::build`] produces an immutable [`OperationRegistry`].
//! 3. **Dispatch:** lookups on the frozen registry take no locks.
//!
//! The process-wide registry is built once from every submitted descriptor, either explicitly
//! through [`init`] / [`init_with`] or implicitly by the first [`crate::call`].

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::OnceLock;

use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::config::{DuplicatePolicy, RegistryConfig};
use crate::error::InitError;
use crate::hierarchy::Root;
use crate::registration::{ApplyTo, OperationReg, apply_concrete, apply_root, descriptors};
use crate::table::{DispatchSlot, DispatchTable, Instance, InstanceRegistry};
use crate::tag::{Tag, root_tag, tag_of};

mod dispatch;

pub use dispatch::{Resolution, call};

#[cfg(test)]
mod tests;

/// Identity of one (context, root, return type) table pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TableKey {
	context: TypeId,
	root: TypeId,
	ret: TypeId,
}

impl TableKey {
	pub fn of<C, R, Ret>() -> Self
	where
		C: 'static,
		R: ?Sized + 'static,
		Ret: 'static,
	{
		Self {
			context: TypeId::of::<C>(),
			root: TypeId::of::<R>(),
			ret: TypeId::of::<Ret>(),
		}
	}
}

/// Dispatch table and instance registry for one [`TableKey`].
pub(crate) struct OperationTable<R: ?Sized + 'static, Ret> {
	pub(crate) dispatch: DispatchTable<R, Ret>,
	pub(crate) instances: InstanceRegistry,
}

impl<R: ?Sized + 'static, Ret> OperationTable<R, Ret> {
	fn new() -> Self {
		Self {
			dispatch: DispatchTable::new(),
			instances: InstanceRegistry::new(),
		}
	}
}

type ErasedTable = Box<dyn Any + Send + Sync>;

/// One installed slot, as recorded for introspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Registration {
	pub context: &'static str,
	pub root: &'static str,
	pub ret: &'static str,
	pub operation: &'static str,
	pub operand: &'static str,
	pub tag: Tag,
	pub fallback: bool,
}

impl fmt::Display for Registration {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} on {} -> {}: {} handles {} ({})",
			self.context, self.root, self.ret, self.operation, self.operand, self.tag
		)?;
		if self.fallback {
			write!(f, " [fallback]")?;
		}
		Ok(())
	}
}

/// A second registration for a slot that already had one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DuplicateRegistration {
	pub context: &'static str,
	pub root: &'static str,
	pub ret: &'static str,
	pub operand: &'static str,
	pub tag: Tag,
	/// Operation that held the slot.
	pub existing: &'static str,
	/// Operation that tried to take it.
	pub incoming: &'static str,
	pub policy: DuplicatePolicy,
}

impl fmt::Display for DuplicateRegistration {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} on {} -> {} for {} ({}): existing={} incoming={} policy={}",
			self.context, self.root, self.ret, self.operand, self.tag, self.existing, self.incoming, self.policy
		)
	}
}

/// Mutable registration phase of an [`OperationRegistry`].
pub struct RegistryBuilder {
	config: RegistryConfig,
	tables: FxHashMap<TableKey, ErasedTable>,
	registrations: Vec<Registration>,
	duplicates: Vec<DuplicateRegistration>,
}

impl RegistryBuilder {
	pub fn new() -> Self {
		Self::with_config(RegistryConfig::default())
	}

	pub fn with_config(config: RegistryConfig) -> Self {
		Self {
			config,
			tables: FxHashMap::default(),
			registrations: Vec::new(),
			duplicates: Vec::new(),
		}
	}

	/// Registers `Op` as the handler of concrete operand `D` under context `C`.
	pub fn register<C, R, Op, Ret, D>(&mut self) -> Tag
	where
		C: 'static,
		R: Root + ?Sized,
		Op: ApplyTo<D, Output = Ret> + Default + Send + Sync + 'static,
		Ret: 'static,
		D: Any,
	{
		let tag = tag_of::<D, R>();
		let slot = DispatchSlot::new(apply_concrete::<Op, R, D>, tag, type_name::<Op>(), type_name::<D>());
		self.install::<C, R, Ret>(tag, slot, Box::new(Op::default()), false)
	}

	/// Registers `Op` as the handler of the root `R` itself under context `C`.
	///
	/// Slots created after this call inherit the handler; slots that already exist do not.
	pub fn register_fallback<C, R, Op, Ret>(&mut self) -> Tag
	where
		C: 'static,
		R: Root + ?Sized,
		Op: ApplyTo<R, Output = Ret> + Default + Send + Sync + 'static,
		Ret: 'static,
	{
		let tag = root_tag::<R>();
		let slot = DispatchSlot::new(apply_root::<Op, R>, tag, type_name::<Op>(), type_name::<R>());
		self.install::<C, R, Ret>(tag, slot, Box::new(Op::default()), true)
	}

	/// Installs a descriptor submitted through `inventory`.
	pub fn submit(&mut self, reg: &OperationReg) -> Tag {
		(reg.install)(self)
	}

	/// Installs every descriptor submitted through `inventory`, in link order.
	pub fn extend_inventory(&mut self) -> &mut Self {
		for reg in descriptors() {
			self.submit(reg);
		}
		self
	}

	fn install<C, R, Ret>(&mut self, tag: Tag, slot: DispatchSlot<R, Ret>, instance: Instance, fallback: bool) -> Tag
	where
		C: 'static,
		R: Root + ?Sized,
		Ret: 'static,
	{
		let policy = self.config.duplicate_policy;
		let table = self
			.tables
			.entry(TableKey::of::<C, R, Ret>())
			.or_insert_with(|| Box::new(OperationTable::<R, Ret>::new()) as ErasedTable)
			.downcast_mut::<OperationTable<R, Ret>>()
			.expect("table type is determined by its key");

		if let Some(existing) = table.dispatch.own_slot(tag) {
			let duplicate = DuplicateRegistration {
				context: type_name::<C>(),
				root: type_name::<R>(),
				ret: type_name::<Ret>(),
				operand: slot.operand(),
				tag,
				existing: existing.operation(),
				incoming: slot.operation(),
				policy,
			};
			warn!(%duplicate, "duplicate operation registration");
			self.duplicates.push(duplicate);

			match policy {
				DuplicatePolicy::Panic => panic!("duplicate operation registration: {duplicate}"),
				DuplicatePolicy::FirstWins => return tag,
				DuplicatePolicy::LastWins => {}
			}
		}

		table.dispatch.put(tag, slot);
		if let Some(displaced) = table.instances.put(tag, instance)
			&& table.dispatch.has_inherited(tag)
		{
			let key = table.instances.retire(displaced);
			let inherited = table.dispatch.retarget_inherited(tag, key);
			debug!(%tag, inherited, "displaced instance kept for inherited slots");
		}

		let registration = Registration {
			context: type_name::<C>(),
			root: type_name::<R>(),
			ret: type_name::<Ret>(),
			operation: slot.operation(),
			operand: slot.operand(),
			tag,
			fallback,
		};
		debug!(%registration, "operation installed");
		self.registrations.push(registration);
		tag
	}

	/// Freezes the builder into an immutable registry.
	pub fn build(self) -> OperationRegistry {
		OperationRegistry {
			config: self.config,
			tables: self.tables,
			registrations: self.registrations,
			duplicates: self.duplicates,
		}
	}
}

impl Default for RegistryBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Frozen set of dispatch tables and the operation instances they own.
///
/// Dropping the registry drops every instance exactly once.
pub struct OperationRegistry {
	config: RegistryConfig,
	tables: FxHashMap<TableKey, ErasedTable>,
	registrations: Vec<Registration>,
	duplicates: Vec<DuplicateRegistration>,
}

impl OperationRegistry {
	pub(crate) fn table<C, R, Ret>(&self) -> Option<&OperationTable<R, Ret>>
	where
		C: 'static,
		R: ?Sized + 'static,
		Ret: 'static,
	{
		self.tables.get(&TableKey::of::<C, R, Ret>())?.downcast_ref()
	}

	/// Returns true if `D` has a slot of its own (not an inherited fallback) for
	/// (`C`, `R`, `Ret`).
	pub fn is_registered<C, R, Ret, D>(&self) -> bool
	where
		C: 'static,
		R: ?Sized + 'static,
		Ret: 'static,
		D: ?Sized + 'static,
	{
		self.table::<C, R, Ret>()
			.is_some_and(|table| table.dispatch.own_slot(tag_of::<D, R>()).is_some())
	}

	/// Installed slots in registration order.
	pub fn registrations(&self) -> &[Registration] {
		&self.registrations
	}

	/// Duplicate registrations seen while building.
	pub fn duplicates(&self) -> &[DuplicateRegistration] {
		&self.duplicates
	}

	/// Number of (context, root, return type) table pairs.
	pub fn table_count(&self) -> usize {
		self.tables.len()
	}

	pub fn config(&self) -> RegistryConfig {
		self.config
	}
}

impl fmt::Debug for OperationRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OperationRegistry")
			.field("config", &self.config)
			.field("tables", &self.tables.len())
			.field("registrations", &self.registrations.len())
			.field("duplicates", &self.duplicates.len())
			.finish()
	}
}

static REGISTRY: OnceLock<OperationRegistry> = OnceLock::new();

fn collect(config: RegistryConfig) -> OperationRegistry {
	let mut builder = RegistryBuilder::with_config(config);
	builder.extend_inventory();
	let registry = builder.build();
	info!(
		tables = registry.table_count(),
		registrations = registry.registrations().len(),
		duplicates = registry.duplicates().len(),
		"operation registry built"
	);
	registry
}

/// Builds the process-wide registry from every submitted descriptor, if not built yet.
pub fn init() -> &'static OperationRegistry {
	REGISTRY.get_or_init(|| collect(RegistryConfig::default()))
}

/// Builds the process-wide registry with `config`.
///
/// Fails if the registry was already built, explicitly or by an earlier dispatch.
pub fn init_with(config: RegistryConfig) -> Result<&'static OperationRegistry, InitError> {
	let mut built = false;
	let registry = REGISTRY.get_or_init(|| {
		built = true;
		collect(config)
	});
	if built { Ok(registry) } else { Err(InitError::AlreadyInitialized) }
}

/// Returns the process-wide registry, building it on first use.
#[inline]
pub fn registry() -> &'static OperationRegistry {
	init()
}
