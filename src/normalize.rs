const QUOTE_CHARS: &[char] = &['"', '\''];

/// Characters a chat message tends to glue onto the end of a pasted link.
const TRAILING_NOISE: &[char] = &[
    '）', ')', ']', '】', '」', '》', '.', ',', '，', '。', '!', '！', '?', '？', ';', '；',
];

/// Strip whitespace, surrounding quotes and trailing sentence punctuation from a
/// raw link. Applied until nothing changes, so the result is a fixpoint.
pub fn normalize_link(raw: &str) -> String {
    let mut current = raw;
    loop {
        let next = current
            .trim()
            .trim_matches(QUOTE_CHARS)
            .trim_end_matches(TRAILING_NOISE);
        if next == current {
            return next.to_string();
        }
        current = next;
    }
}
