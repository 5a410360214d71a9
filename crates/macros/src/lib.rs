//! Procedural macros for the opreg operation registry.
//!
//! Provides attribute macros:
//! - `#[operation]` - registers an `ApplyTo` impl with the process-wide registry

use proc_macro::TokenStream;

/// Operation attribute macro implementation.
mod operation;

/// Registers an `impl ApplyTo<Operand> for Operation` block.
///
/// `context` names the operation context. `root` names the hierarchy and may be omitted when
/// the operand is the root trait object itself, which registers the impl as the fallback.
///
/// ```ignore
/// #[operation(context = Testing, root = dyn Entity)]
/// impl ApplyTo<EntityA> for OpOnA {
///     type Output = i32;
///     fn apply_to(&self, _entity: &EntityA) -> i32 { 1 }
/// }
///
/// #[operation(context = Describe)]
/// impl ApplyTo<dyn Entity> for DescribeAny {
///     type Output = String;
///     fn apply_to(&self, entity: &dyn Entity) -> String { entity.type_description() }
/// }
/// ```
#[proc_macro_attribute]
pub fn operation(attr: TokenStream, item: TokenStream) -> TokenStream {
	operation::operation(attr, item)
}
