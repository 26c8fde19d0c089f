/// Candidates close enough to `input` to be worth suggesting, closest first.
///
/// A candidate qualifies when its edit distance is at most
/// `floor(len * 0.4) + 1` where `len` is the length of `input`. Differences
/// in case alone count as distance 1.
#[must_use]
pub fn suggestion_list<'a>(input: &str, options: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let threshold = input.len() * 2 / 5 + 1;
    let lowered = input.to_lowercase();

    let mut scored: Vec<(usize, &str)> = options
        .into_iter()
        .filter(|option| *option != input)
        .filter_map(|option| {
            let candidate = option.to_lowercase();
            let distance = if candidate == lowered {
                1
            } else {
                strsim::osa_distance(&lowered, &candidate)
            };
            (distance <= threshold).then_some((distance, option))
        })
        .collect();

    scored.sort_unstable();
    scored.dedup();
    scored.into_iter().map(|(_, option)| option.to_string()).collect()
}

const MAX_SUGGESTIONS: usize = 5;

/// `Did you mean "a", "b", or "c"?`, or `None` without suggestions.
#[must_use]
pub fn did_you_mean(suggestions: &[String]) -> Option<String> {
    let quoted: Vec<String> = suggestions
        .iter()
        .take(MAX_SUGGESTIONS)
        .map(|s| format!("\"{s}\""))
        .collect();
    let list = match quoted.as_slice() {
        [] => return None,
        [one] => one.clone(),
        [first, second] => format!("{first} or {second}"),
        [rest @ .., last] => format!("{}, or {last}", rest.join(", ")),
    };
    Some(format!("Did you mean {list}?"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold() {
        assert_eq!(suggestion_list("nam", ["name", "id"]), vec!["name"]);
        // distance 4 is over the threshold of 3 for a five letter input
        assert!(suggestion_list("email", ["name", "id"]).is_empty());
        assert_eq!(suggestion_list("emial", ["email"]), vec!["email"]);
    }

    #[test]
    fn test_case_difference_counts_as_one() {
        assert_eq!(suggestion_list("Name", ["name", "names"]), vec!["name", "names"]);
    }

    #[test]
    fn test_did_you_mean() {
        assert_eq!(did_you_mean(&[]), None);
        assert_eq!(
            did_you_mean(&["a".to_string()]).as_deref(),
            Some("Did you mean \"a\"?")
        );
        assert_eq!(
            did_you_mean(&["a".to_string(), "b".to_string(), "c".to_string()]).as_deref(),
            Some("Did you mean \"a\", \"b\", or \"c\"?")
        );
    }
}
