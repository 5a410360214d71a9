//! Opting a type hierarchy into dispatch.
//!
//! A hierarchy is a root trait with [`Any`] as a supertrait that declares
//! `fn current_tag(&self) -> Tag`. Each concrete type fills that method in with
//! [`enable_vtable!`](crate::enable_vtable), and [`hierarchy!`](crate::hierarchy) implements
//! [`Root`] for the trait object once:
//!
//! ```ignore
//! pub trait Entity: Any {
//!     fn current_tag(&self) -> opreg_registry::Tag;
//! }
//! opreg_registry::hierarchy!(Entity);
//!
//! impl Entity for Robot {
//!     opreg_registry::enable_vtable!(Entity);
//! }
//! ```

use std::any::Any;

use crate::tag::Tag;

/// Root of a dispatchable hierarchy, usually a trait object type.
pub trait Root: 'static {
	/// Tag of the concrete type behind `self`, resolved through a virtual call.
	fn reported_tag(&self) -> Tag;

	/// Views the concrete value as [`Any`] for checked downcasts.
	fn as_any(&self) -> &dyn Any;
}

/// Returns the tag `object` reports for itself.
#[inline]
pub fn current_tag_of<R>(object: &R) -> Tag
where
	R: Root + ?Sized,
{
	object.reported_tag()
}

/// Implements `current_tag` for a concrete type inside its root trait impl.
#[macro_export]
macro_rules! enable_vtable {
	($($root:tt)+) => {
		fn current_tag(&self) -> $crate::Tag {
			$crate::tag_of::<Self, dyn $($root)+>()
		}
	};
}

/// Implements [`Root`](crate::Root) for `dyn $root`.
#[macro_export]
macro_rules! hierarchy {
	($($root:tt)+) => {
		impl $crate::Root for dyn $($root)+ {
			#[inline]
			fn reported_tag(&self) -> $crate::Tag {
				<Self as $($root)+>::current_tag(self)
			}

			fn as_any(&self) -> &dyn ::core::any::Any {
				self
			}
		}
	};
}
