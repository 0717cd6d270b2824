use std::collections::BTreeMap;
use std::fmt::Write as _;

use drift_core::{canonical_digest, deterministic_hash, normalize_and_hash, normalize_json, JsonValue, Number};
use proptest::prelude::*;

// Logical document, independent of how it is written out.
#[derive(Debug, Clone)]
enum Tree {
    Null,
    Bool(bool),
    Num(i64, i8),
    Str(String),
    Arr(Vec<Tree>),
    Obj(BTreeMap<String, Tree>),
}

fn tree() -> impl Strategy<Value = Tree> {
    let leaf = prop_oneof![
        Just(Tree::Null),
        any::<bool>().prop_map(Tree::Bool),
        (-1_000_000i64..1_000_000, -4i8..4).prop_map(|(m, e)| Tree::Num(m, e)),
        "[a-zé😀 \"\\\\\n\t]{0,6}".prop_map(Tree::Str),
    ];
    leaf.prop_recursive(4, 48, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Tree::Arr),
            prop::collection::btree_map("[a-c]{0,3}", inner, 0..5).prop_map(Tree::Obj),
        ]
    })
}

fn to_value(t: &Tree) -> JsonValue {
    match t {
        Tree::Null => JsonValue::Null,
        Tree::Bool(b) => JsonValue::Bool(*b),
        Tree::Num(m, e) => JsonValue::Number(format!("{m}e{e}").parse::<Number>().unwrap()),
        Tree::Str(s) => JsonValue::String(s.clone()),
        Tree::Arr(items) => JsonValue::Array(items.iter().map(to_value).collect()),
        Tree::Obj(map) => JsonValue::Object(map.iter().map(|(k, v)| (k.clone(), to_value(v))).collect()),
    }
}

/// Picks whitespace, number spelling, string escaping and key order from a seed.
struct Style(u64);

impl Style {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn ws(&mut self) -> &'static str {
        ["", " ", "\n", "\t ", "\r\n  "][(self.next() % 5) as usize]
    }

    fn string(&mut self, s: &str, out: &mut String) {
        if self.next() % 2 == 0 {
            out.push_str(&serde_json::to_string(s).unwrap());
        } else {
            out.push('"');
            for unit in s.encode_utf16() {
                write!(out, "\\u{unit:04X}").unwrap();
            }
            out.push('"');
        }
    }

    fn render(&mut self, t: &Tree, out: &mut String) {
        out.push_str(self.ws());
        match t {
            Tree::Null => out.push_str("null"),
            Tree::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Tree::Num(0, _) => out.push_str(["0", "0.0", "-0", "0e5"][(self.next() % 4) as usize]),
            Tree::Num(m, e) => {
                let e = i64::from(*e);
                match self.next() % 3 {
                    0 => write!(out, "{m}e{e}").unwrap(),
                    1 => write!(out, "{m}0e{}", e - 1).unwrap(),
                    _ => write!(out, "{m}.000E{e}").unwrap(),
                }
            }
            Tree::Str(s) => self.string(s, out),
            Tree::Arr(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    self.render(item, out);
                    out.push_str(self.ws());
                }
                out.push_str(self.ws());
                out.push(']');
            }
            Tree::Obj(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                if self.next() % 2 == 0 {
                    entries.reverse();
                }
                out.push('{');
                for (i, (k, v)) in entries.into_iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(self.ws());
                    self.string(k, out);
                    out.push_str(self.ws());
                    out.push(':');
                    self.render(v, out);
                    out.push_str(self.ws());
                }
                out.push_str(self.ws());
                out.push('}');
            }
        }
        out.push_str(self.ws());
    }
}

fn render(t: &Tree, seed: u64) -> String {
    let mut out = String::new();
    Style(seed).render(t, &mut out);
    out
}

proptest! {
    #[test]
    fn formatting_does_not_change_output(t in tree(), s1 in any::<u64>(), s2 in any::<u64>()) {
        let (a, b) = (render(&t, s1), render(&t, s2));
        let expected = canonical_digest(&to_value(&t)).0.to_string();

        prop_assert_eq!(normalize_json(&a).unwrap(), expected.clone());
        prop_assert_eq!(normalize_json(&b).unwrap(), expected);
        prop_assert_eq!(deterministic_hash(&a).unwrap(), deterministic_hash(&b).unwrap());
    }

    #[test]
    fn normalization_is_idempotent(t in tree(), seed in any::<u64>()) {
        let once = normalize_json(&render(&t, seed)).unwrap();
        prop_assert_eq!(normalize_json(&once).unwrap(), once.clone());
        prop_assert_eq!(deterministic_hash(&once).unwrap(), deterministic_hash(&render(&t, seed)).unwrap());
    }

    #[test]
    fn combined_call_is_consistent(t in tree(), seed in any::<u64>()) {
        let text = render(&t, seed);
        let both = normalize_and_hash(&text).unwrap();
        prop_assert_eq!(&both.normalized_json, &normalize_json(&text).unwrap());
        prop_assert_eq!(&both.deterministic_hash, &deterministic_hash(&text).unwrap());
        prop_assert_eq!(both.deterministic_hash.len(), 64);
        prop_assert!(both.deterministic_hash.bytes().all(|c| matches!(c, b'0'..=b'9' | b'a'..=b'f')));
    }
}
