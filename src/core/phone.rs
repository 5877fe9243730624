use std::sync::LazyLock;

use regex::Regex;

/// Input mask used by the contact form, in the usual mask notation:
/// `9` is a digit slot, every other character is a literal.
pub const DEFAULT_MASK: &str = "+1 999.999.9999";

static DEFAULT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+1 \d{3}\.\d{3}\.\d{4}$").expect("static mask pattern is valid")
});

/// A fixed-width phone input mask.
#[derive(Debug, Clone)]
pub struct PhoneMask {
    mask: String,
    pattern: Regex,
}

impl Default for PhoneMask {
    fn default() -> Self {
        Self {
            mask: DEFAULT_MASK.to_string(),
            pattern: DEFAULT_PATTERN.clone(),
        }
    }
}

impl PhoneMask {
    /// Build a mask from its notation. Returns `None` for a mask with no
    /// digit slots.
    pub fn new(mask: &str) -> Option<Self> {
        if !mask.contains('9') {
            return None;
        }
        let mut pattern = String::from("^");
        for c in mask.chars() {
            if c == '9' {
                pattern.push_str(r"\d");
            } else {
                pattern.push_str(&regex::escape(&c.to_string()));
            }
        }
        pattern.push('$');
        let pattern = Regex::new(&pattern).ok()?;
        Some(Self {
            mask: mask.to_string(),
            pattern,
        })
    }

    pub fn mask(&self) -> &str {
        &self.mask
    }

    /// Number of digits a complete value holds.
    pub fn slots(&self) -> usize {
        self.mask.chars().filter(|c| *c == '9').count()
    }

    /// Re-mask input as the user types.
    ///
    /// A value that already starts with the mask's literal prefix (`+1 `) is
    /// a previously masked value and only the digits after the prefix count.
    /// Otherwise the input is raw, and a typed country code matching the
    /// prefix digits is dropped when it would overflow the slots. Output
    /// stops after the last filled slot, so partial input stays partial.
    pub fn apply(&self, input: &str) -> String {
        let prefix: String = self.mask.chars().take_while(|c| *c != '9').collect();
        if !prefix.is_empty() && prefix.starts_with(input) {
            return String::new();
        }

        let mut digits: String = match input.strip_prefix(prefix.as_str()) {
            Some(rest) if !prefix.is_empty() => digits_of(rest),
            _ => {
                let prefix_digits = digits_of(&prefix);
                let mut raw = digits_of(input);
                if !prefix_digits.is_empty()
                    && raw.len() > self.slots()
                    && raw.starts_with(&prefix_digits)
                {
                    raw.drain(..prefix_digits.len());
                }
                raw
            }
        };
        digits.truncate(self.slots());

        let mut out = String::new();
        let mut digits = digits.chars().peekable();
        if digits.peek().is_none() {
            return out;
        }
        for c in self.mask.chars() {
            if c == '9' {
                match digits.next() {
                    Some(d) => out.push(d),
                    None => break,
                }
            } else {
                if digits.peek().is_none() {
                    break;
                }
                out.push(c);
            }
        }
        out
    }

    /// True when `value` fills every slot of the mask.
    pub fn is_complete(&self, value: &str) -> bool {
        self.pattern.is_match(value)
    }
}

fn digits_of(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_ten_digits() {
        let mask = PhoneMask::default();
        assert_eq!(mask.apply("1234567890"), "+1 123.456.7890");
        assert!(mask.is_complete("+1 123.456.7890"));
    }

    #[test]
    fn remasks_already_masked_value() {
        let mask = PhoneMask::default();
        assert_eq!(mask.apply("+1 123.456.7890"), "+1 123.456.7890");
    }

    #[test]
    fn typing_one_digit_at_a_time() {
        let mask = PhoneMask::default();
        let mut value = String::new();
        for d in "5551234567".chars() {
            value.push(d);
            value = mask.apply(&value);
        }
        assert_eq!(value, "+1 555.123.4567");
        assert!(mask.is_complete(&value));
    }

    #[test]
    fn deleting_from_masked_value() {
        let mask = PhoneMask::default();
        assert_eq!(mask.apply("+1 123.456.789"), "+1 123.456.789");
        assert_eq!(mask.apply("+1 123.456."), "+1 123.456");
        assert_eq!(mask.apply("+1 123456.7890"), "+1 123.456.7890");
        assert_eq!(mask.apply("+1 "), "");
        assert_eq!(mask.apply("+1"), "");
    }

    #[test]
    fn drops_typed_country_code() {
        let mask = PhoneMask::default();
        assert_eq!(mask.apply("1 (123) 456-7890"), "+1 123.456.7890");
    }

    #[test]
    fn partial_input_stays_partial() {
        let mask = PhoneMask::default();
        assert_eq!(mask.apply("1234"), "+1 123.4");
        assert!(!mask.is_complete("+1 123.4"));
        assert_eq!(mask.apply(""), "");
    }

    #[test]
    fn extra_digits_are_ignored() {
        let mask = PhoneMask::default();
        assert_eq!(mask.apply("98765432109999"), "+1 987.654.3210");
    }

    #[test]
    fn custom_mask_builds_matching_pattern() {
        let mask = PhoneMask::new("+44 9999 999999").unwrap();
        assert_eq!(mask.slots(), 10);
        assert_eq!(mask.apply("7700900123"), "+44 7700 900123");
        assert!(mask.is_complete("+44 7700 900123"));
        assert!(PhoneMask::new("+1").is_none());
    }
}
