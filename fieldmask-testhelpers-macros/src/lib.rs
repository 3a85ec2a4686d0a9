#![doc = include_str!("../README.md")]

use unsynn::*;

keyword! {
    KFn = "fn";
}

unsynn! {
    // attributes, visibility and qualifiers up to `fn`
    struct Prefix {
        items: Any<Cons<Except<KFn>, TokenTree>>,
    }

    // generics, arguments and return type up to the body
    struct Signature {
        items: Any<Cons<Except<BraceGroup>, TokenTree>>,
    }

    struct TestFn {
        prefix: Prefix, _fn: KFn, name: Ident,
        signature: Signature, body: BraceGroup
    }
}

impl quote::ToTokens for Prefix {
    fn to_tokens(&self, tokens: &mut unsynn::TokenStream) {
        self.items.to_tokens(tokens)
    }
}

impl quote::ToTokens for Signature {
    fn to_tokens(&self, tokens: &mut unsynn::TokenStream) {
        self.items.to_tokens(tokens)
    }
}

/// Marks a test and runs `fieldmask_testhelpers::setup()` before its body.
///
/// ```ignore
/// #[fieldmask_testhelpers::test]
/// fn masks_nested_fields() {
///     // events from the mask engine reach the test subscriber
/// }
/// ```
///
/// Another test attribute can be named as the argument, e.g.
/// `#[fieldmask_testhelpers::test(bolero::test)]`.
#[proc_macro_attribute]
pub fn test(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let item = TokenStream::from(item);
    let TestFn {
        prefix,
        _fn,
        name,
        signature,
        body,
    } = match item.to_token_iter().parse::<TestFn>() {
        Ok(test_fn) => test_fn,
        Err(err) => {
            let message = format!("#[fieldmask_testhelpers::test] expects a function: {err:?}");
            return quote::quote! { ::core::compile_error!(#message); }.into();
        }
    };

    let test_attr = if attr.is_empty() {
        quote::quote! { #[::core::prelude::rust_2024::test] }
    } else {
        let attr = TokenStream::from(attr);
        quote::quote! { #[#attr] }
    };
    let body = body.0.stream();

    quote::quote! {
        #test_attr
        #prefix fn #name #signature {
            ::fieldmask_testhelpers::setup();

            #body
        }
    }
    .into()
}
