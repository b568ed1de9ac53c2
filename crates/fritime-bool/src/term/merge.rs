//! Merging of overlapping terms into combined busy intervals.

use super::clock::clock_offset_minutes;
use super::Term;

/// Merges overlapping same-day terms.
///
/// Terms are stably sorted by `(day, start)` and folded into an accumulator: a
/// term that starts strictly before the end of the last accumulated term on the
/// same day replaces it with a synthesized term, anything else is appended.
/// Back-to-back terms stay separate.
///
/// End times follow [`super::wrapped_end`], so intervals whose minutes wrap or
/// that run past midnight can end "before" they start and will not absorb later
/// terms they actually overlap.
pub fn merge_overlapping_terms(terms: Vec<Term>) -> Vec<Term> {
    let mut sorted = terms;
    sorted.sort_by_key(|term| (term.day, term.start));

    let mut merged: Vec<Term> = Vec::with_capacity(sorted.len());

    for current in sorted {
        match merged.pop() {
            None => merged.push(current),
            Some(last) if overlaps(&last, &current) => merged.push(combine(&last, &current)),
            Some(last) => {
                merged.push(last);
                merged.push(current);
            }
        }
    }

    merged
}

fn overlaps(last: &Term, current: &Term) -> bool {
    current.day == last.day && current.start < last.end()
}

fn combine(last: &Term, current: &Term) -> Term {
    let extended =
        i64::from(current.duration_minutes) + clock_offset_minutes(last.start, current.start);
    let duration = extended.max(i64::from(last.duration_minutes));

    Term::merged(
        last.day,
        last.start.min(current.start),
        u32::try_from(duration).unwrap_or(u32::MAX),
    )
}
