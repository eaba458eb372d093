//! Name-to-record matching against the planner's collections.
//!
//! Matching is case-insensitive substring containment in either direction:
//! "Ali" finds "Ali Zarei" and "Ali Zarei Jr" finds "Ali Zarei" too.
//! The first candidate in collection order wins. There is no scoring, so
//! ambiguous queries resolve to whichever record the snapshot lists first.

use crate::domain::{CollaboratorRecord, ProjectRecord, TaskRecord};

/// Anything the resolver can match by name.
pub trait Named {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
}

impl Named for ProjectRecord {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for CollaboratorRecord {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for TaskRecord {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.title
    }
}

/// Symmetric containment test. Blank inputs never match.
pub fn names_match(query: &str, name: &str) -> bool {
    let q = query.trim().to_lowercase();
    let n = name.trim().to_lowercase();
    if q.is_empty() || n.is_empty() {
        return false;
    }
    n.contains(&q) || q.contains(&n)
}

/// First candidate whose name matches `query`.
pub fn resolve<'a, T, I>(query: &str, candidates: I) -> Option<&'a T>
where
    T: Named + 'a,
    I: IntoIterator<Item = &'a T>,
{
    candidates.into_iter().find(|c| names_match(query, c.name()))
}

/// Exact id lookup.
pub fn resolve_id<'a, T, I>(id: &str, candidates: I) -> Option<&'a T>
where
    T: Named + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let id = id.trim();
    if id.is_empty() {
        return None;
    }
    candidates.into_iter().find(|c| c.id() == id)
}

/// Id first, then name. Ids from the classifier are advisory, so a stale
/// id falls through to the name instead of failing the lookup.
pub fn resolve_ref<'a, T, I>(id: Option<&str>, name: Option<&str>, candidates: I) -> Option<&'a T>
where
    T: Named + 'a,
    I: IntoIterator<Item = &'a T> + Clone,
{
    if let Some(found) = id.and_then(|id| resolve_id(id, candidates.clone())) {
        return Some(found);
    }
    name.and_then(|name| resolve(name, candidates))
}

/// Last-resort scan: the first candidate whose full name, or whose first
/// name token (3+ chars), appears as a word in free text.
pub fn find_in_text<'a, T, I>(text: &str, candidates: I) -> Option<&'a T>
where
    T: Named + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let text = text.to_lowercase();
    let words: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric() && c != '\u{200c}')
        .filter(|w| !w.is_empty())
        .collect();

    candidates.into_iter().find(|c| {
        let name = c.name().trim().to_lowercase();
        if name.is_empty() {
            return false;
        }
        if text.contains(&name) {
            return true;
        }
        match name.split_whitespace().next() {
            Some(first) if first.chars().count() > 2 => words.iter().any(|w| *w == first),
            _ => false,
        }
    })
}
