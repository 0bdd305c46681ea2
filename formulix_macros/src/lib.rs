use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, FnArg, ItemFn, Pat, PatType, ReturnType, Type};

fn formatted_arg_error_msg(arg_pos: usize, fn_name: &str) -> String {
    format!(
        "Expected argument {} of {} to be a plain f64 binding",
        arg_pos, fn_name
    )
}

fn is_f64(ty: &Type) -> bool {
    matches!(ty, Type::Path(type_path) if type_path.path.is_ident("f64"))
}

/// Turns `fn name(a: f64, b: f64) -> f64 { .. }` into `fn name() -> UserFunction`
/// with an exact arity equal to the number of parameters.
#[proc_macro_attribute]
pub fn formulix_fn(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    let vis = &input.vis;
    let fn_name = &input.sig.ident;
    let fn_body = &input.block;

    match &input.sig.output {
        ReturnType::Type(_, ty) if is_f64(ty) => {}
        _ => {
            return syn::Error::new_spanned(
                &input.sig,
                format!("{} must return f64", fn_name),
            )
            .to_compile_error()
            .into()
        }
    }

    let mut arg_extractions = Vec::new();

    for (i, arg) in input.sig.inputs.iter().enumerate() {
        let err_msg = formatted_arg_error_msg(i, &fn_name.to_string());
        let (pat, ty) = match arg {
            FnArg::Typed(PatType { pat, ty, .. }) => (pat, ty),
            FnArg::Receiver(receiver) => {
                return syn::Error::new_spanned(receiver, err_msg)
                    .to_compile_error()
                    .into()
            }
        };

        if !matches!(**pat, Pat::Ident(_)) || !is_f64(ty) {
            return syn::Error::new_spanned(arg, err_msg)
                .to_compile_error()
                .into();
        }

        arg_extractions.push(quote! {
            let #pat: f64 = args.get(#i).copied().unwrap_or(f64::NAN);
        });
    }

    let args_len = arg_extractions.len();
    let expanded = quote! {
        #vis fn #fn_name() -> ::formulix_rs::UserFunction {
            ::formulix_rs::UserFunction::native(
                ::formulix_rs::Arity::Exact(#args_len),
                |args: &[f64]| -> f64 {
                    #(#arg_extractions)*

                    #fn_body
                },
            )
        }
    };

    TokenStream::from(expanded)
}
