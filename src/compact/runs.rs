//! Interval-run encoding of sorted residue lists.
//!
//! `[2, 3, 4, 7, 9, 10]` encodes as `2-4+7+9-10`: consecutive integers
//! collapse to `a-b`, lone values stand alone, runs are joined by `+`.

use std::ops::RangeInclusive;

/// Separator between runs.
pub const RUN_SEPARATOR: char = '+';

/// Collapse ascending, deduplicated values into inclusive runs.
#[must_use]
pub fn to_runs<I>(sorted: I) -> Vec<RangeInclusive<u32>>
where
    I: IntoIterator<Item = u32>,
{
    let mut runs: Vec<RangeInclusive<u32>> = Vec::new();
    for value in sorted {
        match runs.last_mut() {
            Some(run) if run.end().checked_add(1) == Some(value) => {
                *run = *run.start()..=value;
            }
            _ => runs.push(value..=value),
        }
    }
    runs
}

/// Text of a single run: `a` or `a-b`.
#[must_use]
pub fn format_run(run: &RangeInclusive<u32>) -> String {
    if run.start() == run.end() {
        run.start().to_string()
    } else {
        format!("{}-{}", run.start(), run.end())
    }
}

/// Text of a run list, joined by [`RUN_SEPARATOR`].
#[must_use]
pub fn format_runs(runs: &[RangeInclusive<u32>]) -> String {
    let mut out = String::new();
    for run in runs {
        if !out.is_empty() {
            out.push(RUN_SEPARATOR);
        }
        out.push_str(&format_run(run));
    }
    out
}

/// Parse run text back into inclusive runs. `None` on malformed input or a
/// descending run.
#[must_use]
pub fn parse_runs(text: &str) -> Option<Vec<RangeInclusive<u32>>> {
    if text.is_empty() {
        return Some(Vec::new());
    }
    text.split(RUN_SEPARATOR)
        .map(|part| match part.split_once('-') {
            Some((a, b)) => {
                let a: u32 = a.parse().ok()?;
                let b: u32 = b.parse().ok()?;
                (a <= b).then_some(a..=b)
            }
            None => part.parse::<u32>().ok().map(|v| v..=v),
        })
        .collect()
}

/// Split runs into consecutive chunks whose joined text fits in `budget`
/// bytes. A single run longer than the budget still gets its own chunk.
#[must_use]
pub fn chunk_runs(
    runs: &[RangeInclusive<u32>],
    budget: usize,
) -> Vec<Vec<RangeInclusive<u32>>> {
    let mut chunks = Vec::new();
    let mut current: Vec<RangeInclusive<u32>> = Vec::new();
    let mut current_len = 0;
    for run in runs {
        let len = format_run(run).len();
        if !current.is_empty() && current_len + 1 + len > budget {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current_len += usize::from(!current.is_empty()) + len;
        current.push(run.clone());
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_values_collapse() {
        let runs = to_runs([2, 3, 4, 7, 9, 10]);
        assert_eq!(runs, vec![2..=4, 7..=7, 9..=10]);
        assert_eq!(format_runs(&runs), "2-4+7+9-10");
    }

    #[test]
    fn single_value_is_a_singleton_run() {
        assert_eq!(format_runs(&to_runs([5])), "5");
        assert!(to_runs(std::iter::empty()).is_empty());
    }

    #[test]
    fn max_value_does_not_overflow() {
        let runs = to_runs([u32::MAX - 1, u32::MAX]);
        assert_eq!(runs, vec![u32::MAX - 1..=u32::MAX]);
    }

    #[test]
    fn parse_accepts_formatted_text() {
        assert_eq!(
            parse_runs("2-1001+1005"),
            Some(vec![2..=1001, 1005..=1005])
        );
        assert_eq!(parse_runs(""), Some(Vec::new()));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_runs("3-1"), None);
        assert_eq!(parse_runs("a-b"), None);
        assert_eq!(parse_runs("1++2"), None);
    }

    #[test]
    fn chunks_respect_budget() {
        let runs = to_runs((0..40).map(|v| v * 2));
        let chunks = chunk_runs(&runs, 20);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(format_runs(chunk).len() <= 20);
        }
        let rejoined: Vec<_> = chunks.into_iter().flatten().collect();
        assert_eq!(rejoined, runs);
    }

    #[test]
    fn oversized_run_gets_own_chunk() {
        let runs = vec![100_000..=200_000, 3..=3];
        let chunks = chunk_runs(&runs, 4);
        assert_eq!(chunks, vec![vec![100_000..=200_000], vec![3..=3]]);
    }
}
