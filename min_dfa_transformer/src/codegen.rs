use crate::automata::MinimizedDfa;
use proc_macro2::TokenStream;
use quote::{quote, ToTokens};

/// Expands to a block evaluating to a unit struct whose `const fn test`
/// walks this automaton's transition table with `min_dfa_util::run_table`.
impl ToTokens for MinimizedDfa {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let dfa = self.dfa();
        let count = dfa.len();
        let start = *dfa.start();
        let accepting = dfa.states().iter().map(|state| *state.accepting());
        let transitions = dfa.states().iter().map(|state| {
            let edges = state.transitions().iter().map(|(&c, &target)| {
                let c = c as u32;
                quote! { (#c, #target) }
            });
            quote! { &[#(#edges),*] }
        });

        tokens.extend(quote! {
            {
                struct Matcher;
                impl Matcher {
                    const START: usize = #start;
                    const ACCEPTING: [bool; #count] = [#(#accepting),*];
                    const TRANSITIONS: [&'static [(u32, usize)]; #count] = [#(#transitions),*];

                    pub const fn test(&self, s: &str) -> bool {
                        min_dfa_util::run_table(s, Self::START, &Self::ACCEPTING, &Self::TRANSITIONS)
                    }
                }
                Matcher
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::automata::{minimize, Dfa, NfaBuilder};
    use quote::ToTokens;

    fn expand(pattern: &str) -> String {
        let dfa = Dfa::from_nfa(&NfaBuilder::new().build(pattern).unwrap());
        minimize(&dfa).to_token_stream().to_string()
    }

    #[test]
    fn emits_table_for_each_state() {
        let code = expand("a");
        assert!(code.contains("const START : usize = 0usize"), "{code}");
        assert!(code.contains("[false , true]"), "{code}");
        assert!(code.contains("(97u32 , 1usize)"), "{code}");
        assert!(code.contains("min_dfa_util :: run_table"), "{code}");
    }

    #[test]
    fn states_without_edges_get_empty_rows() {
        let code = expand("ab");
        assert!(code.contains("& []"), "{code}");
        assert!(code.contains("3usize"), "{code}");
    }

    #[test]
    fn non_ascii_symbols_use_code_points() {
        let code = expand("é");
        assert!(code.contains(&format!("({}u32", 'é' as u32)), "{code}");
    }
}
