//! Natural ordering for version strings.
//!
//! Versions are split on `.` and compared segment by segment. Inside a
//! segment, runs of digits compare numerically and runs of anything else
//! compare bytewise, so `9 < 10`, `1.9 < 1.10` and `8u41 < 8u382`.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

fn chunk_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+|\D+").expect("static regex"))
}

#[derive(Debug)]
enum Chunk<'a> {
    Number(&'a str),
    Text(&'a str),
}

impl PartialEq for Chunk<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Chunk<'_> {}

impl Ord for Chunk<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Chunk::Number(a), Chunk::Number(b)) => compare_digits(a, b),
            (Chunk::Text(a), Chunk::Text(b)) => a.cmp(b),
            (Chunk::Number(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Chunk<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn chunks(segment: &str) -> impl Iterator<Item = Chunk<'_>> {
    chunk_pattern().find_iter(segment).map(|m| {
        let s = m.as_str();
        if s.as_bytes()[0].is_ascii_digit() {
            Chunk::Number(s)
        } else {
            Chunk::Text(s)
        }
    })
}

// Digit runs can exceed u64, so compare them as strings.
fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_segments(a: &str, b: &str) -> Ordering {
    chunks(a).cmp(chunks(b))
}

/// Total order over version strings. Missing trailing segments sort lower,
/// so `1.2 < 1.2.1`. Strings that tie numerically (`01` vs `1`) fall back
/// to byte order.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (Some(x), Some(y)) => match compare_segments(x, y) {
                Ordering::Equal => continue,
                other => return other,
            },
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (None, None) => return a.cmp(b),
        }
    }
}

pub fn highest<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    versions
        .into_iter()
        .max_by(|a, b| compare_versions(a, b))
        .map(String::as_str)
}

/// Whether `name` can be a version directory directly inside a tool
/// directory: non-empty, not hidden, no path separators.
pub fn is_valid_version_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('.') && !name.contains(['/', '\\'])
}

/// Whether an on-disk directory name reads as a version rather than hook
/// scratch space such as `cache` or `src`: a digit first, optionally after
/// a leading `v`.
pub fn looks_like_version(name: &str) -> bool {
    let rest = name.strip_prefix(|c: char| c == 'v' || c == 'V').unwrap_or(name);
    is_valid_version_name(name) && rest.starts_with(|c: char| c.is_ascii_digit())
}
