use flare_chat_core::{tokenize, TokenKind};
use proptest::prelude::*;

// Characters that exercise every rule: quotes, escapes, comment markers,
// line breaks the comment and string rules treat specially, and non-ASCII.
fn source_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec![
            'a', 'f', 'i', 'l', 'e', 't', 'x', '0', '1', '9', '_', '$', '.', ',', ';', ':',
            '?', '(', ')', '{', '}', '[', ']', '\'', '"', '\\', '/', '*', '+', '-', ' ', '\t',
            '\n', '\r', '\u{2028}', 'é', '→', '🔥',
        ]),
        0..64,
    )
    .prop_map(|chars: Vec<char>| chars.into_iter().collect::<String>())
}

fn assert_covers(source: &str) {
    let tokens = tokenize(source);
    let joined: String = tokens.iter().map(|t| t.text).collect();
    assert_eq!(joined, source);
    assert!(tokens.iter().all(|t| !t.text.is_empty()));
    assert!(tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Default)
        .all(|t| t.text.chars().count() == 1));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn tokens_reassemble_any_string(source in any::<String>()) {
        assert_covers(&source);
    }

    #[test]
    fn tokens_reassemble_code_like_input(source in source_strategy()) {
        assert_covers(&source);
    }
}
