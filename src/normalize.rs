use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z0-9+.\-]*://\S+").expect("url pattern"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+@\S+").expect("email pattern"));
// word chars, CJK unified ideographs, whitespace, and . , ! ? ，。！？
static DISALLOWED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\w\x{4E00}-\x{9FFF}\s.,!?，。！？]").expect("charset pattern")
});
static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("space pattern"));

/// Clean one raw chat line down to words and basic punctuation.
pub fn normalize_line(line: &str) -> String {
    let s = URL_RE.replace_all(line, "");
    let s = EMAIL_RE.replace_all(&s, "");
    let s = DISALLOWED_RE.replace_all(&s, "");
    let s = SPACE_RE.replace_all(&s, " ");
    s.trim().to_string()
}
