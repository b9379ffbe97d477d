//! Heuristics for values that look machine-generated.
//!
//! Generated ids and classes (build hashes, CSS-in-JS names, framework ids)
//! change between deploys or even page loads, so the selector generator must
//! not anchor on them. The numeric thresholds come from `DynamicValueRules`.

use std::sync::LazyLock;

use regex::Regex;

use crate::dom::{self, NodeRef};
use crate::options::DynamicValueRules;

/// `name-a8f3k2`, `title_x9Yz1`, `Header__3xYz9`
#[allow(clippy::expect_used)]
static HASH_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-_]{1,3}([A-Za-z0-9]{5,})$").expect("valid regex")
});

/// React `useId` (`:r1:`, `:R2sm:`), Radix, Headless UI, MUI, Ember and rc-* ids.
#[allow(clippy::expect_used)]
static FRAMEWORK_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(:[r][0-9a-z]*:|radix-.*|headlessui-.*|mui-\d+|ember\d+|rc-[a-z]+-\d+|react-select-\d+-.*|downshift-\d+-.*)$")
        .expect("valid regex")
});

#[allow(clippy::expect_used)]
static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .expect("valid regex")
});

/// styled-components, emotion, styled-jsx, JSS and CSS-module class names.
#[allow(clippy::expect_used)]
static CSS_IN_JS_CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(css-[a-z0-9]+(-.*)?|sc-[A-Za-z0-9]+|jsx-\d+|emotion-\d+|makeStyles-.*|jss\d+|svelte-[a-z0-9]+|_[A-Za-z0-9]{5,}|[A-Za-z]+_[A-Za-z]+__[A-Za-z0-9]{5}|[A-Za-z0-9]+-module__[A-Za-z0-9_-]+)$")
        .expect("valid regex")
});

/// Interaction-state classes toggled at runtime.
const STATE_CLASSES: &[&str] = &[
    "active", "hover", "focus", "focused", "selected", "open", "opened", "closed",
    "visible", "hidden", "show", "disabled", "current", "expanded", "collapsed",
];

/// Whether an id, class or attribute value looks generated.
#[must_use]
pub fn is_dynamic(value: &str, rules: &DynamicValueRules) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }

    if value.len() >= rules.min_hex_len
        && value.chars().all(|c| c.is_ascii_hexdigit())
        && (!rules.hex_requires_digit || value.chars().any(|c| c.is_ascii_digit()))
    {
        return true;
    }

    let numeric = if rules.embedded_numeric_runs {
        longest_digit_run(value) >= rules.min_numeric_len
    } else {
        value.len() >= rules.min_numeric_len && value.chars().all(|c| c.is_ascii_digit())
    };
    if numeric {
        return true;
    }

    if FRAMEWORK_ID_RE.is_match(value) || UUID_RE.is_match(value) {
        return true;
    }

    if let Some(caps) = HASH_SUFFIX_RE.captures(value) {
        if let Some(suffix) = caps.get(1) {
            if looks_like_hash(suffix.as_str()) {
                return true;
            }
        }
    }

    false
}

/// Whether a class name is safe to build a selector from.
#[must_use]
pub fn is_stable_class(class: &str, rules: &DynamicValueRules) -> bool {
    if class.is_empty() || class.len() > 40 {
        return false;
    }
    // Tailwind arbitrary values and variants: `w-[300px]`, `hover:underline`, `w-1/2`
    if class.contains(['[', ']', ':', '/', '!', '@', '#', '(', ')', '%', '.']) {
        return false;
    }
    let lower = class.to_ascii_lowercase();
    if STATE_CLASSES.contains(&lower.as_str())
        || lower.starts_with("is-")
        || lower.starts_with("has-")
    {
        return false;
    }
    !CSS_IN_JS_CLASS_RE.is_match(class) && !is_dynamic(class, rules)
}

/// Stable classes of a node, in source order, deduplicated.
#[must_use]
pub fn stable_classes(node: &NodeRef, rules: &DynamicValueRules) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for class in dom::classes(node) {
        if is_stable_class(&class, rules) && !out.contains(&class) {
            out.push(class);
        }
    }
    out
}

/// A suffix reads as a hash when it mixes digits with letters, or mixes
/// letter case in the middle of the token.
fn looks_like_hash(suffix: &str) -> bool {
    let has_digit = suffix.chars().any(|c| c.is_ascii_digit());
    let has_alpha = suffix.chars().any(|c| c.is_ascii_alphabetic());
    let inner_upper = suffix.chars().skip(1).any(|c| c.is_ascii_uppercase());
    let has_lower = suffix.chars().any(|c| c.is_ascii_lowercase());
    (has_digit && has_alpha) || (inner_upper && has_lower)
}

fn longest_digit_run(value: &str) -> usize {
    let mut best = 0;
    let mut run = 0;
    for c in value.chars() {
        if c.is_ascii_digit() {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best
}
