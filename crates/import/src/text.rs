/// Levenshtein edit distance using the two-row O(min(m,n)) space algorithm.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a = s1.as_bytes();
    let b = s2.as_bytes();
    let (m, n) = (a.len(), b.len());

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    // Keep the shorter string in the inner loop to minimise allocation.
    let (a, b, m, n) = if m <= n { (a, b, m, n) } else { (b, a, n, m) };

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Normalises a description to lowercase alphanumeric words and computes
/// Levenshtein similarity in the range [0.0, 1.0].
pub fn description_similarity(s1: &str, s2: &str) -> f32 {
    let a = normalize(s1);
    let b = normalize(s2);

    if a == b {
        return 1.0;
    }

    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }

    1.0 - (levenshtein_distance(&a, &b) as f32 / max_len as f32)
}

fn normalize(s: &str) -> String {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapses a statement description to a stable merchant key: trailing
/// reference tokens (store numbers, POS ids, card suffixes) are stripped,
/// then the first three remaining tokens are uppercased and joined.
///
/// "NETFLIX.COM 866-579-7172 CA #4821" and "NETFLIX.COM 866-579-7172 CA"
/// both key to "NETFLIX.COM 866-579-7172 CA".
pub fn merchant_key(description: &str) -> String {
    let mut tokens: Vec<&str> = description.split_whitespace().collect();
    while tokens.len() > 1 && is_reference_token(tokens[tokens.len() - 1]) {
        tokens.pop();
    }
    tokens
        .iter()
        .take(3)
        .map(|t| t.to_uppercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A token is a reference if, once `#` and `*` prefixes are dropped, only
/// digits, dashes, and slashes remain.
fn is_reference_token(token: &str) -> bool {
    let body = token.trim_start_matches(['#', '*']);
    !body.is_empty() && body.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '/')
}
