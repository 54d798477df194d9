//! Policy grammar. A policy is either a bare attribute name or a threshold gate
//! `{<sub-policy>,<sub-policy>,...,[n,t]}` with `n` sub-policies of which at least `t` must be
//! satisfied. Sub-policies nest arbitrarily and whitespace is ignored, so
//! `{a, {b, c, [2, 1]}, [2, 2]}` needs `a` and one of `b` or `c`.

use crate::{error::ABSError, polynomial::ShareId};
use ark_std::{
    collections::BTreeSet,
    fmt,
    str::FromStr,
    string::{String, ToString},
    vec::Vec,
};

/// Maximum nesting of threshold gates
pub const MAX_POLICY_DEPTH: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Policy {
    Attribute(String),
    Threshold {
        n: ShareId,
        t: ShareId,
        children: Vec<Policy>,
    },
}

impl Policy {
    pub fn parse(text: &str) -> Result<Self, ABSError> {
        let text = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>();
        if text.is_empty() {
            return Err(ABSError::EmptyPolicy);
        }
        check_balanced(&text)?;
        Self::parse_node(&text)
    }

    fn parse_node(text: &str) -> Result<Self, ABSError> {
        if !text.starts_with('{') {
            return Self::parse_attribute(text);
        }
        if !text.ends_with('}') {
            return Err(ABSError::UnbalancedBraces(text.to_string()));
        }
        let inner = &text[1..text.len() - 1];
        if inner.is_empty() {
            return Err(ABSError::EmptyPolicy);
        }

        let mut items = split_top_level(inner);
        // Last item is always the threshold block
        let block = items.pop().unwrap_or_default();
        let (n, t) = parse_threshold_block(block)?;
        if t == 0 || t > n {
            return Err(ABSError::InvalidThresholdOrTotal(t, n));
        }
        if items.len() != n as usize {
            return Err(ABSError::ChildCountMismatch(n, items.len()));
        }

        let mut children = Vec::with_capacity(items.len());
        let mut seen = BTreeSet::new();
        for item in items {
            if item.is_empty() {
                return Err(ABSError::EmptySubPolicy(text.to_string()));
            }
            let child = Self::parse_node(item)?;
            let label = child.to_string();
            if !seen.insert(label.clone()) {
                return Err(ABSError::DuplicateSubPolicy(label));
            }
            children.push(child);
        }
        Ok(Self::Threshold { n, t, children })
    }

    fn parse_attribute(text: &str) -> Result<Self, ABSError> {
        if text.is_empty() {
            return Err(ABSError::EmptySubPolicy(text.to_string()));
        }
        if text.contains(&['{', '}', '[', ']', ','][..]) {
            return Err(ABSError::InvalidAttributeName(text.to_string()));
        }
        Ok(Self::Attribute(text.to_string()))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Attribute(_))
    }

    /// `(n, t)` of the gate. A bare attribute behaves as a `1`-of-`1` gate.
    pub fn threshold(&self) -> (ShareId, ShareId) {
        match self {
            Self::Attribute(_) => (1, 1),
            Self::Threshold { n, t, .. } => (*n, *t),
        }
    }

    pub fn children(&self) -> &[Policy] {
        match self {
            Self::Attribute(_) => &[],
            Self::Threshold { children, .. } => children,
        }
    }

    /// Distinct attribute names used anywhere in the policy, in order of first occurrence
    pub fn attributes(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_attributes(&mut names);
        names
    }

    fn collect_attributes<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Attribute(a) => {
                if !names.contains(&a.as_str()) {
                    names.push(a)
                }
            }
            Self::Threshold { children, .. } => {
                for c in children {
                    c.collect_attributes(names)
                }
            }
        }
    }

    /// Plain boolean evaluation of the policy against a set of attribute names
    pub fn is_satisfied_by<S: AsRef<str>>(&self, attributes: &[S]) -> bool {
        match self {
            Self::Attribute(a) => attributes.iter().any(|s| s.as_ref() == a),
            Self::Threshold { t, children, .. } => {
                children
                    .iter()
                    .filter(|c| c.is_satisfied_by(attributes))
                    .count()
                    >= *t as usize
            }
        }
    }

    /// Number of gates and leaves
    pub fn num_nodes(&self) -> usize {
        1 + self.children().iter().map(|c| c.num_nodes()).sum::<usize>()
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute(a) => f.write_str(a),
            Self::Threshold { n, t, children } => {
                f.write_str("{")?;
                for c in children {
                    write!(f, "{},", c)?;
                }
                write!(f, "[{},{}]}}", n, t)
            }
        }
    }
}

impl FromStr for Policy {
    type Err = ABSError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Braces and brackets must match in count and never close before they open. Gates may not nest
/// deeper than `MAX_POLICY_DEPTH`.
fn check_balanced(text: &str) -> Result<(), ABSError> {
    let mut braces = 0i64;
    let mut brackets = 0i64;
    for c in text.chars() {
        match c {
            '{' => {
                braces += 1;
                if braces as usize > MAX_POLICY_DEPTH {
                    return Err(ABSError::PolicyTooDeep(MAX_POLICY_DEPTH));
                }
            }
            '}' => braces -= 1,
            '[' => brackets += 1,
            ']' => brackets -= 1,
            _ => (),
        }
        if braces < 0 {
            return Err(ABSError::UnbalancedBraces(text.to_string()));
        }
        if brackets < 0 {
            return Err(ABSError::UnbalancedBrackets(text.to_string()));
        }
    }
    if braces != 0 {
        return Err(ABSError::UnbalancedBraces(text.to_string()));
    }
    if brackets != 0 {
        return Err(ABSError::UnbalancedBrackets(text.to_string()));
    }
    Ok(())
}

/// Split on the commas not nested inside braces or brackets
fn split_top_level(text: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0i64;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '{' | '[' => depth += 1,
            '}' | ']' => depth -= 1,
            ',' if depth == 0 => {
                items.push(&text[start..i]);
                start = i + 1;
            }
            _ => (),
        }
    }
    items.push(&text[start..]);
    items
}

fn parse_threshold_block(block: &str) -> Result<(ShareId, ShareId), ABSError> {
    let invalid = || ABSError::InvalidThresholdBlock(block.to_string());
    let numbers = block
        .strip_prefix('[')
        .and_then(|b| b.strip_suffix(']'))
        .ok_or_else(invalid)?;
    let mut parts = numbers.split(',');
    let (n, t) = match (parts.next(), parts.next(), parts.next()) {
        (Some(n), Some(t), None) => (n, t),
        _ => return Err(invalid()),
    };
    let n = n.parse::<ShareId>().map_err(|_| invalid())?;
    let t = t.parse::<ShareId>().map_err(|_| invalid())?;
    Ok((n, t))
}
