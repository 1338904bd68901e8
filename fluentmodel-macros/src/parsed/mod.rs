mod field;
mod mapped;

use quote::ToTokens;

pub(crate) use mapped::{DerivedKind, ParsedMapped};

/// Render a type as compact source text, `Option < Vec < T > >` -> `Option<Vec<T>>`.
pub(crate) fn type_text(tokens: &impl ToTokens) -> String {
    let mut text = tokens.to_token_stream().to_string();
    for (from, to) in [(" <", "<"), ("< ", "<"), (" >", ">"), (" ::", "::"), (":: ", "::"), (" ,", ","), ("& ", "&")] {
        text = text.replace(from, to);
    }
    text
}
