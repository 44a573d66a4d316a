//! Collision-free titles.

use std::collections::HashSet;

/// `title` if unused, else the first free `title1`, `title2`, ...
pub fn unique_title<'a, I>(title: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: HashSet<&str> = existing.into_iter().collect();
    if !taken.contains(title) {
        return title.to_string();
    }

    (1u32..)
        .map(|n| format!("{}{}", title, n))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or_else(|| title.to_string())
}
