//! Substring-tolerant string similarity.
//!
//! Scores are on a 0–100 scale built from the indel distance (insertions and
//! deletions only): `ratio = 200 * lcs / (len_a + len_b)`. The partial ratio
//! slides the shorter string over every alignment with the longer one,
//! including alignments that hang off either end, and keeps the best ratio.
//! Strings are compared per Unicode scalar value, so Thai combining marks
//! count as characters of their own.

/// Similarity of two whole strings, 0–100
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Best similarity of the shorter string against any window of the longer
/// one, 0–100. Empty input on either side scores 0.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    let mut best = best_window(shorter, longer);
    if shorter.len() == longer.len() && best < 100.0 {
        best = best.max(best_window(longer, shorter));
    }

    best
}

fn best_window(shorter: &[char], longer: &[char]) -> f64 {
    let m = shorter.len();
    let n = longer.len();
    let mut best: f64 = 0.0;

    // Windows clipped at the start of the longer string
    for end in 1..m {
        best = best.max(ratio_chars(shorter, &longer[..end]));
    }

    for start in 0..=(n - m) {
        best = best.max(ratio_chars(shorter, &longer[start..start + m]));
        if best >= 100.0 {
            return 100.0;
        }
    }

    // Windows clipped at the end of the longer string
    for start in (n - m + 1)..n {
        best = best.max(ratio_chars(shorter, &longer[start..]));
    }

    best
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

/// Longest common subsequence length, two-row dynamic programming
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
