//! `#[operation]` attribute implementation.
//!
//! Keeps the annotated `impl ApplyTo<D> for Op` block as written and appends the matching
//! `register_operation!` (concrete operand) or `register_fallback!` (trait object operand)
//! invocation.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::parse::Parser;
use syn::{GenericArgument, ImplItem, ItemImpl, PathArguments, Type};

#[derive(Default)]
struct OperationArgs {
	context: Option<Type>,
	root: Option<Type>,
}

/// Entry point for the `#[operation]` attribute.
pub fn operation(attr: TokenStream, item: TokenStream) -> TokenStream {
	expand(attr.into(), item.into())
		.unwrap_or_else(syn::Error::into_compile_error)
		.into()
}

fn expand(attr: TokenStream2, item: TokenStream2) -> syn::Result<TokenStream2> {
	let args = parse_args(attr)?;
	let item: ItemImpl = syn::parse2(item)?;

	if !item.generics.params.is_empty() {
		return Err(syn::Error::new_spanned(
			&item.generics,
			"operations are registered for concrete types; remove the impl generics",
		));
	}

	let Some(context) = args.context else {
		return Err(syn::Error::new(Span::call_site(), "missing required 'context' attribute"));
	};

	let operand = operand_of(&item)?;
	let ret = output_of(&item)?;
	let operation = &item.self_ty;

	let registration = if matches!(operand, Type::TraitObject(_)) {
		let root = match args.root {
			Some(root) if !same_type(&root, operand) => {
				return Err(syn::Error::new_spanned(
					root,
					"a trait object operand registers a fallback and must be the root itself",
				));
			}
			Some(root) => root,
			None => operand.clone(),
		};
		quote! {
			::opreg_registry::register_fallback!(#context, #root, #operation, #ret);
		}
	} else {
		let Some(root) = args.root else {
			return Err(syn::Error::new(
				Span::call_site(),
				"missing required 'root' attribute for a concrete operand",
			));
		};
		quote! {
			::opreg_registry::register_operation!(#context, #root, #operation, #ret, #operand);
		}
	};

	Ok(quote! {
		#item
		#registration
	})
}

fn parse_args(attr: TokenStream2) -> syn::Result<OperationArgs> {
	let mut args = OperationArgs::default();
	let parser = syn::meta::parser(|meta| {
		if meta.path.is_ident("context") {
			args.context = Some(meta.value()?.parse()?);
			Ok(())
		} else if meta.path.is_ident("root") {
			args.root = Some(meta.value()?.parse()?);
			Ok(())
		} else {
			Err(meta.error("unknown operation attribute; expected 'context' or 'root'"))
		}
	});
	parser.parse2(attr)?;
	Ok(args)
}

/// The `D` of `impl ApplyTo<D> for Op`.
fn operand_of(item: &ItemImpl) -> syn::Result<&Type> {
	let expected = || syn::Error::new_spanned(&item.self_ty, "expected `impl ApplyTo<Operand> for Operation`");

	let Some((None, path, _)) = &item.trait_ else {
		return Err(expected());
	};
	let Some(segment) = path.segments.last().filter(|s| s.ident == "ApplyTo") else {
		return Err(expected());
	};
	let PathArguments::AngleBracketed(generics) = &segment.arguments else {
		return Err(expected());
	};

	let mut types = generics.args.iter().filter_map(|arg| match arg {
		GenericArgument::Type(ty) => Some(ty),
		_ => None,
	});
	match (types.next(), types.next()) {
		(Some(ty), None) => Ok(strip_group(ty)),
		_ => Err(syn::Error::new_spanned(generics, "ApplyTo takes exactly one operand type")),
	}
}

/// The `type Output = ...;` of the impl block.
fn output_of(item: &ItemImpl) -> syn::Result<&Type> {
	item.items
		.iter()
		.find_map(|item| match item {
			ImplItem::Type(ty) if ty.ident == "Output" => Some(&ty.ty),
			_ => None,
		})
		.ok_or_else(|| syn::Error::new_spanned(&item.self_ty, "missing `type Output = ...;`"))
}

fn strip_group(ty: &Type) -> &Type {
	match ty {
		Type::Group(group) => strip_group(&group.elem),
		Type::Paren(paren) => strip_group(&paren.elem),
		_ => ty,
	}
}

fn same_type(a: &Type, b: &Type) -> bool {
	quote!(#a).to_string() == quote!(#b).to_string()
}
