//! Identifier sanitization for schema `$id`s
//!
//! [`sanitize_identifier`] turns an arbitrary `$id` into a capitalized
//! identifier made of `[A-Za-z0-9_$]` that never starts with a digit. It is
//! used for type names in every backend, so it must stay pure and
//! deterministic: the same `$id` always names the same type.

use serde_json::Value;

fn is_leading(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_continuing(c: char) -> bool {
    is_leading(c) || c.is_ascii_digit()
}

/// Sanitize a JSON value holding an `$id`. Anything but a string yields `""`.
pub fn sanitize_value(value: &Value) -> String {
    match value {
        Value::String(s) => sanitize_identifier(s),
        _ => String::new(),
    }
}

/// Derive a capitalized identifier from `input`.
///
/// Steps run in order over the previous step's output:
///
/// 1. characters that cannot appear at their position become a space; until
///    the first valid leading character is seen, digits count as invalid too
/// 2. a leading `_` followed by a lowercase letter is dropped and the letter
///    upper-cased
/// 3. every other `_` followed by a lowercase letter likewise
/// 4. a letter right after a run of digits or `$` is upper-cased
/// 5. a letter right after a run of whitespace is upper-cased and the
///    whitespace dropped
/// 6. remaining whitespace is dropped
/// 7. the first character is upper-cased
///
/// ```
/// use schemagen_codegen::sanitize::sanitize_identifier;
///
/// assert_eq!(sanitize_identifier("solana_account"), "SolanaAccount");
/// assert_eq!(sanitize_identifier("abc123def"), "Abc123Def");
/// ```
pub fn sanitize_identifier(input: &str) -> String {
    let chars = replace_invalid(input);
    let chars = drop_leading_underscore(chars);
    let chars = camel_case_underscores(chars);
    let chars = upper_after_digits(chars);
    let chars = upper_after_whitespace(chars);

    let mut out: String = chars.into_iter().filter(|c| !c.is_whitespace()).collect();
    if let Some(first) = out.chars().next() {
        let upper = first.to_ascii_uppercase();
        out.replace_range(..first.len_utf8(), upper.encode_utf8(&mut [0; 4]));
    }
    out
}

fn replace_invalid(input: &str) -> Vec<char> {
    let mut seen_leading = false;
    input
        .chars()
        .map(|c| {
            if c.is_whitespace() {
                ' '
            } else if !seen_leading {
                if is_leading(c) {
                    seen_leading = true;
                    c
                } else {
                    ' '
                }
            } else if is_continuing(c) {
                c
            } else {
                ' '
            }
        })
        .collect()
}

fn drop_leading_underscore(mut chars: Vec<char>) -> Vec<char> {
    if chars.len() >= 2 && chars[0] == '_' && chars[1].is_ascii_lowercase() {
        chars.remove(0);
        chars[0] = chars[0].to_ascii_uppercase();
    }
    chars
}

fn camel_case_underscores(chars: Vec<char>) -> Vec<char> {
    let mut out = Vec::with_capacity(chars.len());
    let mut iter = chars.into_iter().peekable();
    while let Some(c) = iter.next() {
        match iter.peek() {
            Some(next) if c == '_' && next.is_ascii_lowercase() => {
                let next = next.to_ascii_uppercase();
                iter.next();
                out.push(next);
            }
            _ => out.push(c),
        }
    }
    out
}

fn upper_after_digits(mut chars: Vec<char>) -> Vec<char> {
    for i in 1..chars.len() {
        let prev = chars[i - 1];
        if (prev.is_ascii_digit() || prev == '$') && chars[i].is_ascii_alphabetic() {
            chars[i] = chars[i].to_ascii_uppercase();
        }
    }
    chars
}

fn upper_after_whitespace(chars: Vec<char>) -> Vec<char> {
    let mut out = Vec::with_capacity(chars.len());
    let mut pending_ws = 0usize;
    for c in chars {
        if c.is_whitespace() {
            pending_ws += 1;
            continue;
        }
        if pending_ws > 0 {
            if c.is_ascii_alphabetic() {
                out.push(c.to_ascii_uppercase());
                pending_ws = 0;
                continue;
            }
            out.extend(std::iter::repeat_n(' ', pending_ws));
            pending_ws = 0;
        }
        out.push(c);
    }
    out.extend(std::iter::repeat_n(' ', pending_ws));
    out
}
