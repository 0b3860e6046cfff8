use std::sync::LazyLock;

use regex::Regex;

static TAG_PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[\s*([A-Za-z0-9_]+)\s+"((?:[^"\\]|\\.)*)"\s*\]"#).expect("valid tag pair regex")
});

/// Any bracket group on one line, well-formed tag or not. Brackets inside a
/// quoted value do not close the group; an unbalanced quote falls back to the
/// first `]`.
static TAG_GROUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[(?:[^\]"\n]|"(?:[^"\\\n]|\\.)*")*\]|\[[^\]\n]*\]"#)
        .expect("valid tag group regex")
});

static TRAILING_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)(?:\*|1-0|0-1|1/2-1/2)\s*$").expect("valid trailing marker regex")
});

static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid blank run regex"));

/// Tag pairs in file order. Duplicate names keep the first value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet(Vec<(String, String)>);

impl TagSet {
    fn insert(&mut self, name: &str, value: String) {
        if self.get(name).is_none() {
            self.0.push((name.to_string(), value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Value of `name`, or the empty string when the tag is absent.
    pub fn value(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Tags and free-text annotation of one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub tags: TagSet,
    pub annotation: String,
}

impl Metadata {
    pub fn extract(record: &str) -> Self {
        let mut tags = TagSet::default();
        for caps in TAG_PAIR_RE.captures_iter(record) {
            tags.insert(&caps[1], unescape(&caps[2]));
        }

        Self {
            tags,
            annotation: annotation_text(record),
        }
    }

    /// Event, falling back to a `Title` tag.
    pub fn title(&self) -> &str {
        self.tags
            .get("Event")
            .or_else(|| self.tags.get("Title"))
            .unwrap_or_default()
    }

    pub fn white(&self) -> &str {
        self.tags.value("White")
    }

    pub fn black(&self) -> &str {
        self.tags.value("Black")
    }

    pub fn annotator(&self) -> &str {
        self.tags.value("Annotator")
    }

    pub fn result(&self) -> &str {
        self.tags.value("Result")
    }

    pub fn fen(&self) -> Option<&str> {
        self.tags.get("FEN").filter(|fen| !fen.trim().is_empty())
    }
}

/// The record with every bracket group removed. This is what the movetext
/// parser reads.
pub fn strip_tags(record: &str) -> String {
    TAG_GROUP_RE.replace_all(record, " ").into_owned()
}

fn annotation_text(record: &str) -> String {
    let stripped = TAG_GROUP_RE.replace_all(record, "");
    let stripped = TRAILING_MARKER_RE.replace(&stripped, "");
    BLANK_RUN_RE
        .replace_all(&stripped, "\n")
        .trim()
        .to_string()
}

fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}
