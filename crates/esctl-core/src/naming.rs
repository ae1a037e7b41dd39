// crates/esctl-core/src/naming.rs - Column Naming
//
// Turns machine field paths ("disk.percent", "index.gc_deletes") into the
// labels shown in table headers ("Disk %", "Index GC Deletes").
//
// TOKENIZATION RULES:
// - Dots separate structural segments, each segment yields one or more words
// - Underscores separate words inside a segment, unless the segment starts
//   with an underscore ("_source" stays one word and keeps its marker)
// - Hyphens are never delimiters ("foo-bar" is a single word)
//
// WORD RULES:
// - "percent", "gc", "id" and "uuid" are replaced whatever their case
// - An all-lowercase word is title-cased
// - A word with any uppercase letter keeps its casing, only its first
//   letter (after a leading underscore) is forced to uppercase

/// Words that are substituted instead of being title-cased
const SPECIAL_WORDS: [(&str, &str); 4] = [
    ("percent", "%"),
    ("gc", "GC"),
    ("id", "ID"),
    ("uuid", "UUID"),
];

/// Derive a display label from a field path
///
/// With `pretty` set to false the identifier is returned untouched, which is
/// what machine-oriented outputs want.
///
/// ```
/// use esctl_core::naming::display_name;
///
/// assert_eq!(display_name("disk.percent", true), "Disk %");
/// assert_eq!(display_name("index.uuid", true), "Index UUID");
/// assert_eq!(display_name("disk.percent", false), "disk.percent");
/// ```
pub fn display_name(id: &str, pretty: bool) -> String {
    if !pretty {
        return id.to_string();
    }

    id.split('.')
        .flat_map(segment_words)
        .map(render_word)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split one dot-segment into its words
fn segment_words(segment: &str) -> Vec<&str> {
    if segment.starts_with('_') {
        return vec![segment];
    }

    segment.split('_').filter(|word| !word.is_empty()).collect()
}

/// Render a single word according to the special-word and casing rules
fn render_word(word: &str) -> String {
    let (marker, body) = match word.strip_prefix('_') {
        Some(rest) => ("_", rest),
        None => ("", word),
    };

    if let Some((_, replacement)) = SPECIAL_WORDS
        .iter()
        .find(|(special, _)| body.eq_ignore_ascii_case(special))
    {
        return format!("{marker}{replacement}");
    }

    let mut chars = body.chars();
    let Some(first) = chars.next() else {
        return marker.to_string();
    };

    let rest: String = if body.chars().any(char::is_uppercase) {
        chars.collect()
    } else {
        chars.flat_map(char::to_lowercase).collect()
    };

    format!("{marker}{}{rest}", first.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_literal_names() {
        let cases = [
            ("foobar", "Foobar"),
            ("foo_bar", "Foo Bar"),
            ("foo.bar", "Foo Bar"),
            ("foo-bar", "Foo-bar"),
            ("foo.percent", "Foo %"),
            ("index.uuid", "Index UUID"),
            ("index.gc_deletes", "Index GC Deletes"),
            ("FooBar", "FooBar"),
            ("_source._metadata.createTime", "_Source _Metadata CreateTime"),
        ];

        for (input, expected) in cases {
            assert_eq!(display_name(input, true), expected, "input: {input}");
        }
    }

    #[test]
    fn test_cat_api_columns() {
        assert_eq!(display_name("heap.percent", true), "Heap %");
        assert_eq!(display_name("load_1m", true), "Load 1m");
        assert_eq!(display_name("node.role", true), "Node Role");
        assert_eq!(display_name("pri.store.size", true), "Pri Store Size");
        assert_eq!(display_name("parent_task_id", true), "Parent Task ID");
    }

    #[test]
    fn test_special_words_ignore_case() {
        assert_eq!(display_name("PERCENT", true), "%");
        assert_eq!(display_name("Uuid", true), "UUID");
        assert_eq!(display_name("_id", true), "_ID");
    }

    #[test]
    fn test_degenerate_ids() {
        assert_eq!(display_name("", true), "");
        assert_eq!(display_name("foo__bar", true), "Foo Bar");
        assert_eq!(display_name("_", true), "_");
    }

    proptest! {
        #[test]
        fn raw_names_are_identity(id in "[a-zA-Z0-9_.\\-]{0,40}") {
            prop_assert_eq!(display_name(&id, false), id);
        }

        #[test]
        fn pretty_names_are_deterministic(id in "[a-zA-Z0-9_.\\-]{0,40}") {
            prop_assert_eq!(display_name(&id, true), display_name(&id, true));
        }
    }
}
