use min_dfa_transformer::to_minimized_dfa;
use quote::ToTokens;
use syn::{parse_macro_input, LitStr};

/// Compiles a pattern into a minimal DFA at build time.
///
/// `dfa!("(a|b)*abb")` expands to a value with a `const fn test(&self, s: &str) -> bool`
/// that reports whether the whole of `s` matches. Malformed patterns are
/// compile errors pointing at the literal.
#[proc_macro]
pub fn dfa(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let literal = parse_macro_input!(input as LitStr);

    match to_minimized_dfa(&literal.value()) {
        Ok(dfa) => dfa.into_token_stream().into(),
        Err(e) => syn::Error::new(literal.span(), e).to_compile_error().into(),
    }
}
