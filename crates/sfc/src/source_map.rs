#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Position;

/// Source map v3 in its JSON shape.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RawSourceMap {
    pub version: u8,
    #[cfg_attr(feature = "serde", serde(default))]
    pub file: Option<String>,
    pub sources: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sources_content: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub names: Vec<String>,
    pub mappings: String,
}

impl RawSourceMap {
    /// A map without mappings. Hosts treat it as "no map".
    pub fn empty() -> Self {
        Self {
            version: 3,
            file: None,
            sources: vec![],
            sources_content: vec![],
            names: vec![],
            mappings: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Line-level map from a block's content back to its place in the file.
/// Line `i` of `content` maps to line `start.line + i` of `source`.
pub fn generate_block_map(
    filename: &str,
    source: &str,
    content: &str,
    start: &Position,
) -> RawSourceMap {
    let mut mappings = String::with_capacity(content.len() / 8);
    let mut prev_col = 0i64;
    for (i, _) in content.split('\n').enumerate() {
        if i > 0 {
            mappings.push(';');
        }
        let (line_delta, col) = if i == 0 {
            (start.line as i64 - 1, start.column as i64 - 1)
        } else {
            (1, 0)
        };
        encode_vlq(0, &mut mappings);
        encode_vlq(0, &mut mappings);
        encode_vlq(line_delta, &mut mappings);
        encode_vlq(col - prev_col, &mut mappings);
        prev_col = col;
    }
    RawSourceMap {
        version: 3,
        file: Some(filename.to_string()),
        sources: vec![filename.to_string()],
        sources_content: vec![source.to_string()],
        names: vec![],
        mappings,
    }
}

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn encode_vlq(value: i64, out: &mut String) {
    let mut vlq = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };
    loop {
        let mut digit = (vlq & 0b11111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b100000;
        }
        out.push(BASE64[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn vlq(v: i64) -> String {
        let mut s = String::new();
        encode_vlq(v, &mut s);
        s
    }

    #[test]
    fn test_vlq() {
        assert_eq!(vlq(0), "A");
        assert_eq!(vlq(1), "C");
        assert_eq!(vlq(-1), "D");
        assert_eq!(vlq(16), "gB");
    }

    #[test]
    fn test_block_map() {
        let start = Position {
            offset: 10,
            line: 2,
            column: 9,
        };
        let map = generate_block_map("a.vue", "src", "a\nb\nc", &start);
        // line 2 col 9, then next line col 0 (delta -8), then next line
        assert_eq!(map.mappings, "AACQ;AACR;AACA");
        assert_eq!(map.sources, vec!["a.vue"]);
    }
}
