//! Successor rules for individual version segments.

use crate::error::VerlogError;

/// Greek letter names in alphabet order, used as pre-release labels.
pub const GREEK_LETTERS: [&str; 24] = [
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu", "nu", "xi", "omicron", "pi", "rho", "sigma", "tau", "upsilon", "phi", "chi",
    "psi", "omega",
];

/// Returns the position of `segment` in [`GREEK_LETTERS`], ignoring case.
pub fn greek_index(segment: &str) -> Option<usize> {
    let lower = segment.to_ascii_lowercase();
    GREEK_LETTERS.iter().position(|name| *name == lower)
}

/// Returns the segment that follows `segment`.
///
/// Greek letter names advance to the next letter (`beta` -> `gamma`) and keep
/// the input's case style. Everything else is incremented from the right with
/// carry: digits roll over within digits, letters within letters of the same
/// case, and a carry out of the leftmost character prepends a new one
/// (`9` -> `10`, `Z` -> `AA`, `rc1` -> `rc2`, `02` -> `03`).
pub fn successor(segment: &str) -> Result<String, VerlogError> {
    if let Some(index) = greek_index(segment) {
        let next = GREEK_LETTERS
            .get(index + 1)
            .ok_or_else(|| VerlogError::SuccessorOverflow(segment.to_string()))?;
        return Ok(match_case(segment, next));
    }

    increment_alphanumeric(segment)
}

/// Applies the case style of `template` (lower, Capitalized, UPPER) to `name`.
fn match_case(template: &str, name: &str) -> String {
    if template.len() > 1 && template.chars().all(|c| c.is_ascii_uppercase()) {
        name.to_ascii_uppercase()
    } else if template.starts_with(|c: char| c.is_ascii_uppercase()) {
        let mut chars = name.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_ascii_uppercase().to_string() + chars.as_str()
        })
    } else {
        name.to_string()
    }
}

fn increment_alphanumeric(segment: &str) -> Result<String, VerlogError> {
    let mut chars: Vec<char> = segment.chars().collect();
    let mut leftmost = None;

    for i in (0..chars.len()).rev() {
        let c = chars[i];
        if !c.is_ascii_alphanumeric() {
            continue;
        }
        leftmost = Some(i);
        match c {
            '9' => chars[i] = '0',
            'z' => chars[i] = 'a',
            'Z' => chars[i] = 'A',
            _ => {
                chars[i] = char::from(c as u8 + 1);
                return Ok(chars.into_iter().collect());
            }
        }
    }

    // Every alphanumeric character rolled over; grow on the left.
    let index = leftmost.ok_or_else(|| {
        VerlogError::Format(format!("segment '{segment}' has nothing to increment"))
    })?;
    let carry = match chars[index] {
        '0' => '1',
        'a' => 'a',
        _ => 'A',
    };
    chars.insert(index, carry);
    Ok(chars.into_iter().collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn numeric_segments_increment() {
        assert_eq!(successor("3").unwrap(), "4");
        assert_eq!(successor("9").unwrap(), "10");
        assert_eq!(successor("199").unwrap(), "200");
    }

    #[test]
    fn numeric_segments_keep_padding() {
        assert_eq!(successor("02").unwrap(), "03");
        assert_eq!(successor("09").unwrap(), "10");
    }

    #[test]
    fn letters_advance_and_carry() {
        assert_eq!(successor("B").unwrap(), "C");
        assert_eq!(successor("Z").unwrap(), "AA");
        assert_eq!(successor("az").unwrap(), "ba");
        assert_eq!(successor("zz").unwrap(), "aaa");
    }

    #[test]
    fn mixed_segments_increment_trailing_counter() {
        assert_eq!(successor("rc1").unwrap(), "rc2");
        assert_eq!(successor("number19").unwrap(), "number20");
        assert_eq!(successor("a9").unwrap(), "b0");
    }

    #[test]
    fn greek_letters_advance_by_name() {
        assert_eq!(successor("alpha").unwrap(), "beta");
        assert_eq!(successor("beta").unwrap(), "gamma");
        assert_eq!(successor("psi").unwrap(), "omega");
    }

    #[test]
    fn greek_letters_keep_case_style() {
        assert_eq!(successor("Beta").unwrap(), "Gamma");
        assert_eq!(successor("BETA").unwrap(), "GAMMA");
    }

    #[test]
    fn omega_has_no_successor() {
        let err = successor("omega").unwrap_err();
        assert!(matches!(err, VerlogError::SuccessorOverflow(ref s) if s == "omega"));
    }

    #[test]
    fn greek_lookup_ignores_case() {
        assert_eq!(greek_index("Gamma"), Some(2));
        assert_eq!(greek_index("gamma1"), None);
    }

    #[test]
    fn empty_segment_is_rejected() {
        assert!(successor("").is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn numbers_follow_integer_successor(n in 0u64..1_000_000) {
                prop_assert_eq!(successor(&n.to_string()).unwrap(), (n + 1).to_string());
            }

            #[test]
            fn successor_of_alphanumeric_stays_alphanumeric(s in "[a-zA-Z0-9]{1,8}") {
                let next = successor(&s);
                if greek_index(&s) == Some(GREEK_LETTERS.len() - 1) {
                    prop_assert!(next.is_err());
                } else {
                    let next = next.unwrap();
                    prop_assert!(next.chars().all(|c| c.is_ascii_alphanumeric()));
                    prop_assert_ne!(next, s);
                }
            }
        }
    }
}
