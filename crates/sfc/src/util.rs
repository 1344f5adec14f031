use phf::{phf_set, Set};
use std::fmt::{Result as Ret, Write};

const QU: char = '"';
const BS: char = '\\';
const BB: char = 'b';
const TT: char = 't';
const NN: char = 'n';
const FF: char = 'f';
const RR: char = 'r';
const UU: char = 'u';
const __: char = '_';

// escape table for the ASCII range, other bytes are written as is
static ESCAPED: [char; 128] = [
    // 0   1   2   3   4   5   6   7   8   9   A   B   C   D   E   F
    UU, UU, UU, UU, UU, UU, UU, UU, BB, TT, NN, UU, FF, RR, UU, UU, // 0
    UU, UU, UU, UU, UU, UU, UU, UU, UU, UU, UU, UU, UU, UU, UU, UU, // 1
    __, __, QU, __, __, __, __, __, __, __, __, __, __, __, __, __, // 2
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 3
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 4
    __, __, __, __, __, __, __, __, __, __, __, __, BS, __, __, __, // 5
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 6
    __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 7
];

fn escape_of(b: u8) -> char {
    if b < 128 {
        ESCAPED[b as usize]
    } else {
        __
    }
}

pub fn write_json_string<W: Write>(string: &str, mut w: W) -> Ret {
    w.write_char('"')?;
    let mut start = 0;
    for (index, ch) in string.bytes().enumerate() {
        let escape = escape_of(ch);
        if escape == __ {
            continue;
        }
        w.write_str(&string[start..index])?;
        w.write_char('\\')?;
        w.write_char(escape)?;
        if escape == UU {
            write!(w, "{:04x}", ch)?;
        }
        start = index + 1;
    }
    w.write_str(&string[start..])?;
    w.write_char('"')
}

/// `JSON.stringify` for strings.
pub fn json_string(s: &str) -> String {
    let mut ret = String::with_capacity(s.len() + 2);
    // writing to a String never fails
    let _ = write_json_string(s, &mut ret);
    ret
}

// identifiers left unprefixed in template expressions
const ALLOWED_GLOBALS: Set<&str> = phf_set! {
    "Infinity", "undefined", "NaN", "isFinite", "isNaN", "parseFloat", "parseInt",
    "decodeURI", "decodeURIComponent", "encodeURI", "encodeURIComponent", "Math", "Number",
    "Date", "Array", "Object", "Boolean", "String", "RegExp", "Map", "Set", "JSON", "Intl",
    "BigInt", "require", "arguments",
};

pub fn is_global_allow_listed(s: &str) -> bool {
    ALLOWED_GLOBALS.contains(s)
}

pub fn is_simple_identifier(s: &str) -> bool {
    let is_ident = |c: char| c == '$' || c == '_' || c.is_ascii_alphanumeric();
    !s.is_empty() && s.chars().all(is_ident) && !s.starts_with(|c: char| c.is_ascii_digit())
}
