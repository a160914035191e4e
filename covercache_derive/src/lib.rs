//! Proc-macros for the covercache workspace.
//!
//! Provides the `#[context("...")]` attribute: it wraps the body of a
//! `Result`-returning function (sync or async) so that any error bubbling out
//! is annotated with a formatted context message. The format string may refer
//! to the function's parameters:
//!
//! ```ignore
//! #[context("Failed to build Envelope ({x_min}, {y_min}, {x_max}, {y_max})")]
//! pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Result<Envelope> { ... }
//! ```

use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use quote::{ToTokens, quote};
use syn::parse_macro_input;

#[proc_macro_attribute]
pub fn context(args: TokenStream, input: TokenStream) -> TokenStream {
	let format_args = TokenStream2::from(args);
	let mut func = parse_macro_input!(input as syn::ItemFn);

	let body = &func.block;
	let return_type = &func.sig.output;
	let err = Ident::new("err", Span::mixed_site());

	let new_body = if func.sig.asyncness.is_some() {
		let return_type = match return_type {
			syn::ReturnType::Default => {
				return syn::Error::new_spanned(func, "function should return Result")
					.to_compile_error()
					.into();
			}
			syn::ReturnType::Type(_, return_type) => return_type,
		};
		let result = Ident::new("result", Span::mixed_site());
		quote! {
			let #result: #return_type = async { #body }.await;
			#result.map_err(|#err| #err.context(format!(#format_args)).into())
		}
	} else {
		let force_fn_once = Ident::new("force_fn_once", Span::mixed_site());
		quote! {
			// Moving a non-`Copy` value into the closure tells borrowck to always treat the closure
			// as a `FnOnce`, preventing some borrowing errors.
			let #force_fn_once = ::core::iter::empty::<()>();
			(|| #return_type {
				::core::mem::drop(#force_fn_once);
				#body
			})().map_err(|#err| #err.context(format!(#format_args)).into())
		}
	};
	func.block.stmts = vec![syn::Stmt::Expr(syn::Expr::Verbatim(new_body), None)];

	func.into_token_stream().into()
}
