//! Version numbering for migration keys
//!
//! Registration order is the canonical numbering scheme: the Nth
//! registered migration gets version N. `next_migration_number` is a
//! helper for computing a prefix out-of-band (e.g. naming a migration by
//! hand from what a database already recorded); it is never consulted by
//! the registry, and mixing the two schemes can produce keys that disagree.

/// Format a version as at least three digits ("001", "042", "1000")
pub fn format_version(version: usize) -> String {
    format!("{:03}", version)
}

/// Next free version after the highest numeric prefix in `keys`.
///
/// The prefix is the token before the first `_`. Keys whose prefix is not
/// all ASCII digits are ignored. Returns "001" when nothing parses.
/// Prefixes are compared as decimal strings, so any length works.
pub fn next_migration_number<I, S>(keys: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut highest: Option<String> = None;
    for key in keys {
        if let Some(digits) = leading_digits(key.as_ref()) {
            if highest.as_deref().map_or(true, |h| greater(digits, h)) {
                highest = Some(digits.to_string());
            }
        }
    }

    match highest {
        Some(digits) => format!("{:0>3}", increment(&digits)),
        None => format_version(1),
    }
}

/// Leading digits of the prefix with zeros stripped ("0" for all zeros)
fn leading_digits(key: &str) -> Option<&str> {
    let prefix = key.split('_').next()?;
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let trimmed = prefix.trim_start_matches('0');
    Some(if trimmed.is_empty() { "0" } else { trimmed })
}

/// `a > b` for zero-stripped decimal strings
fn greater(a: &str, b: &str) -> bool {
    (a.len(), a) > (b.len(), b)
}

fn increment(digits: &str) -> String {
    let mut out: Vec<u8> = digits.bytes().collect();
    for b in out.iter_mut().rev() {
        if *b == b'9' {
            *b = b'0';
        } else {
            *b += 1;
            return String::from_utf8_lossy(&out).into_owned();
        }
    }
    // All nines carried out
    format!("1{}", String::from_utf8_lossy(&out))
}
