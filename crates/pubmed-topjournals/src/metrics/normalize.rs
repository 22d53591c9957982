//! Journal name normalization shared by the index and the matcher.

/// Normalize a journal name into a lookup key.
///
/// Lower-cases, turns every character that is neither alphanumeric nor
/// whitespace into a space, collapses whitespace runs, and trims.
/// `"N. Engl. J. Med."` becomes `"n engl j med"`.
#[must_use]
pub fn normalize_journal_name(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut pending_space = false;

    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_space && !key.is_empty() {
                key.push(' ');
            }
            pending_space = false;
            // Lower-casing can emit combining marks (e.g. 'İ'); keep the key idempotent.
            key.extend(ch.to_lowercase().filter(|c| c.is_alphanumeric()));
        } else {
            pending_space = true;
        }
    }

    key
}
