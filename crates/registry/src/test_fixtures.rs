//! Shared operations and hierarchy builder for unit tests.
//!
//! Tags are process-wide, so tests that depend on tag numbering declare their own root with
//! [`hierarchy_fixture!`] inside the test body. A fresh root starts its own counter.

use crate::ApplyTo;

/// Operation returning `N` for any operand.
#[derive(Debug, Default)]
pub(crate) struct Const<const N: i32>;

impl<const N: i32, D: ?Sized> ApplyTo<D> for Const<N> {
	type Output = i32;

	fn apply_to(&self, _operand: &D) -> i32 {
		N
	}
}

/// Declares a root trait, its [`crate::Root`] impl and unit concrete types.
macro_rules! hierarchy_fixture {
	($root:ident: $($ty:ident),+ $(,)?) => {
		trait $root: ::std::any::Any {
			fn current_tag(&self) -> $crate::Tag;
		}

		$crate::hierarchy!($root);

		$(
			#[allow(dead_code)]
			#[derive(Debug, Default)]
			struct $ty;

			impl $root for $ty {
				$crate::enable_vtable!($root);
			}
		)+
	};
}

pub(crate) use hierarchy_fixture;
