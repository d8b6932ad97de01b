//! Lexical ground rules for assembly sources: the fixed character
//! classes and the numeric literal parser. The assembler drives a
//! [`Cursor`] over each line rather than producing a token stream,
//! because almost every construct is line-scoped.

pub mod cursor;
pub use cursor::Cursor;

pub fn is_whitespace(b: u8) -> bool {
    b == b' ' || b == b'\t' || b == b'\n' || b == b'\r'
}

/// First character of an identifier.
pub fn is_initial_ident(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'-' || b == b'$'
}

/// Continuation character of an identifier.
pub fn is_ident(b: u8) -> bool {
    is_initial_ident(b) || b.is_ascii_digit()
}

pub fn str_is_ident(s: &str) -> bool {
    let mut bytes = s.bytes();
    match bytes.next() {
        Some(b) if is_initial_ident(b) => bytes.all(is_ident),
        _ => false,
    }
}

/// Signed decimal: `[+-]?[0-9]+`.
pub fn str_is_numeric(s: &str) -> bool {
    let digits = s
        .strip_prefix(['-', '+'])
        .unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Base-10 accumulation with applied sign. Callers validate with
/// [`str_is_numeric`] first; out-of-range literals wrap rather than
/// fail, and get truncated to the operand width at the emit site.
pub fn parse_numeric(s: &str) -> i32 {
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1i32, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };

    let mut num = 0i32;
    for b in digits.bytes() {
        num = num.wrapping_mul(10);
        num = num.wrapping_add((b - b'0') as i32);
    }
    num.wrapping_mul(sign)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ident_classes() {
        assert!(str_is_ident("LOOP"));
        assert!(str_is_ident("_tmp$2"));
        assert!(str_is_ident("-dash"));
        assert!(!str_is_ident(""));
        assert!(!str_is_ident("2fast"));
        assert!(!str_is_ident("a b"));
        assert!(!str_is_ident("%X"));
    }

    #[test]
    fn numeric_classes() {
        assert!(str_is_numeric("0"));
        assert!(str_is_numeric("-128"));
        assert!(str_is_numeric("+42"));
        assert!(!str_is_numeric(""));
        assert!(!str_is_numeric("-"));
        assert!(!str_is_numeric("12a"));
    }

    #[test]
    fn parse_signs() {
        assert_eq!(parse_numeric("0"), 0);
        assert_eq!(parse_numeric("255"), 255);
        assert_eq!(parse_numeric("-1"), -1);
        assert_eq!(parse_numeric("+17"), 17);
    }

    #[test]
    fn cursor_scan() {
        let mut cur = Cursor::new("  MVA 5", 10);
        cur.skip_space();
        let start = cur.pos();
        cur.take_while(is_ident);
        assert_eq!(cur.get_range(start..cur.pos()), "MVA");
        let span = cur.span_from(start);
        assert_eq!(span.offs(), 12);
        assert_eq!(span.len(), 3);
        cur.skip_space();
        assert_eq!(cur.rest(), "5");
    }
}
