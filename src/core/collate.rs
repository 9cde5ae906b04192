//! Name ordering for listings.
//!
//! Secrets are listed in natural, case-insensitive order: digit runs compare
//! by numeric value, so `var2` sorts before `var10`, and `Var1` sits next to
//! `var1` instead of ahead of every lowercase name.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

use crate::core::domain::SecretEntry;

/// Compare two names in listing order.
///
/// Primary comparison ignores letter case and treats digit runs as numbers.
/// Names equal under that rule fall back to lowercase-first, then to byte
/// order, so the result is a total order.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    natural_cmp(a, b)
        .then_with(|| case_cmp(a, b))
        .then_with(|| a.cmp(b))
}

/// Sort entries in place by [`compare_names`].
pub fn sort_entries(entries: &mut [SecretEntry]) {
    entries.sort_by(|a, b| compare_names(&a.name, &b.name));
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let ord = cmp_digit_runs(&take_digits(&mut left), &take_digits(&mut right));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                let ord = weight(l).cmp(&weight(r));
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

// Punctuation before digits before letters, letters without case.
fn weight(c: char) -> (u8, char) {
    if c.is_ascii_digit() {
        (1, c)
    } else if c.is_alphabetic() {
        (2, c.to_ascii_lowercase())
    } else {
        (0, c)
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        run.push(c);
        chars.next();
    }
    run
}

fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
        // "01" after "1"
        .then_with(|| a.len().cmp(&b.len()))
}

// Tie-break on case: lowercase before uppercase at the first difference.
fn case_cmp(a: &str, b: &str) -> Ordering {
    for (l, r) in a.chars().zip(b.chars()) {
        if l != r {
            return match (l.is_lowercase(), r.is_lowercase()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => Ordering::Equal,
            };
        }
    }
    Ordering::Equal
}
