//! # Code Sets
//!
//! [`CodeSet`] is a set of integer codes stored as a sorted array of interval
//! boundaries. Consecutive pairs `(lo, hi)` denote half-open intervals `[lo, hi)`;
//! the intervals are disjoint and never adjacent, so every set has exactly one
//! representation and structural equality is set equality.
//!
//! The code domain covers more than characters:
//!
//! | Range                        | Meaning                               |
//! |------------------------------|---------------------------------------|
//! | `0 .. CODE_MAX`              | Unicode scalar values (and surrogates) |
//! | `EPSILON`                    | the empty-string transition            |
//! | `CODE_MIN .. EPSILON`        | token-id markers, see [`token_label`] |
//!
//! Every edge label of every automaton built by this crate is a `CodeSet`.

use crate::error::RangeError;
use std::fmt;

/// Label of an epsilon (no input consumed) transition
pub const EPSILON: i32 = -1;

/// One past the largest character code
pub const CODE_MAX: i32 = 0x11_0000;

/// Smallest code in the domain; bounds the token-id marker range
pub const CODE_MIN: i32 = -10_000;

/// Token id reported for input that matches no definition
pub const UNKNOWN_TOKEN: i32 = -1;

/// Largest token id that still has a marker code inside the domain
pub const MAX_TOKEN_ID: i32 = EPSILON - 1 - CODE_MIN;

/// Edge label code marking the end of token `id`
///
/// Markers sort below epsilon, and higher ids get lower codes. The mapping
/// is its own inverse, see [`label_token`].
#[must_use]
pub const fn token_label(id: i32) -> i32 {
    EPSILON - 1 - id
}

/// Token id carried by a marker code
#[must_use]
pub const fn label_token(code: i32) -> i32 {
    EPSILON - 1 - code
}

/// Whether `code` is a token-id marker
#[must_use]
pub const fn is_token_label(code: i32) -> bool {
    code >= CODE_MIN && code < EPSILON
}

/// Disjoint sorted set of half-open code intervals
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CodeSet {
    elements: Vec<i32>,
}

#[derive(Clone, Copy)]
enum Combine {
    Intersect,
    Difference,
}

impl CodeSet {
    /// Create an empty set
    #[must_use]
    pub const fn new() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    /// Create a set holding the single interval `[lower, upper)`
    pub fn with_range(lower: i32, upper: i32) -> Result<Self, RangeError> {
        let mut set = Self::new();
        set.add(lower, upper)?;
        Ok(set)
    }

    /// Create a set holding one code
    #[must_use]
    pub fn single(value: i32) -> Self {
        Self {
            elements: vec![value, value + 1],
        }
    }

    /// The set containing only [`EPSILON`]
    #[must_use]
    pub fn epsilon() -> Self {
        Self::single(EPSILON)
    }

    /// Every character code, `[0, CODE_MAX)`
    #[must_use]
    pub fn all_chars() -> Self {
        Self {
            elements: vec![0, CODE_MAX],
        }
    }

    /// The whole domain, `[CODE_MIN, CODE_MAX)`
    #[must_use]
    pub fn domain() -> Self {
        Self {
            elements: vec![CODE_MIN, CODE_MAX],
        }
    }

    /// Build a set from a raw boundary array
    ///
    /// Returns `None` unless the array has even length and strictly increasing values.
    #[must_use]
    pub fn from_elements(elements: Vec<i32>) -> Option<Self> {
        let valid =
            elements.len() % 2 == 0 && elements.windows(2).all(|pair| pair[0] < pair[1]);
        valid.then_some(Self { elements })
    }

    /// The boundary array
    #[must_use]
    pub fn elements(&self) -> &[i32] {
        &self.elements
    }

    /// Iterate over the intervals as `(lower, upper)` pairs
    pub fn ranges(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.elements.chunks_exact(2).map(|pair| (pair[0], pair[1]))
    }

    /// Smallest code in the set
    #[must_use]
    pub fn first(&self) -> Option<i32> {
        self.elements.first().copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Number of codes in the set
    #[must_use]
    pub fn cardinality(&self) -> i64 {
        self.ranges()
            .map(|(lower, upper)| i64::from(upper) - i64::from(lower))
            .sum()
    }

    #[must_use]
    pub fn contains(&self, value: i32) -> bool {
        // Number of boundaries <= value; odd means inside an interval.
        let index = self.elements.partition_point(|&b| b <= value);
        index % 2 == 1
    }

    /// The code held by a set of exactly one unit interval
    #[must_use]
    pub fn single_value(&self) -> Option<i32> {
        match self.elements.as_slice() {
            [lower, upper] if *upper == *lower + 1 => Some(*lower),
            _ => None,
        }
    }

    /// Add the interval `[lower, upper)`
    pub fn add(&mut self, lower: i32, upper: i32) -> Result<(), RangeError> {
        if lower >= upper {
            return Err(RangeError::new(lower, upper));
        }
        let elements = &self.elements;
        let mut out = Vec::with_capacity(elements.len() + 2);
        let mut i = 0;
        while i < elements.len() && elements[i] < lower {
            out.push(elements[i]);
            i += 1;
        }
        if i % 2 == 0 {
            out.push(lower);
        }
        while i < elements.len() && elements[i] <= upper {
            i += 1;
        }
        if i % 2 == 0 {
            out.push(upper);
        }
        out.extend_from_slice(&elements[i..]);
        self.elements = out;
        Ok(())
    }

    /// Add one code
    pub fn add_value(&mut self, value: i32) {
        let index = self.elements.partition_point(|&b| b <= value);
        if index % 2 == 1 {
            return;
        }
        let joins_left = index > 0 && self.elements[index - 1] == value;
        let joins_right = self.elements.get(index) == Some(&(value + 1));
        match (joins_left, joins_right) {
            (true, true) => {
                self.elements.drain(index - 1..=index);
            }
            (true, false) => self.elements[index - 1] = value + 1,
            (false, true) => self.elements[index] = value,
            (false, false) => {
                self.elements.splice(index..index, [value, value + 1]);
            }
        }
    }

    /// Add every code of `other`
    pub fn add_set(&mut self, other: &Self) {
        if self.is_empty() {
            self.elements.clone_from(&other.elements);
            return;
        }
        for (lower, upper) in other.ranges() {
            // Intervals of a valid set are never empty.
            let _ = self.add(lower, upper);
        }
    }

    /// Remove the interval `[lower, upper)`
    pub fn remove(&mut self, lower: i32, upper: i32) -> Result<(), RangeError> {
        if lower >= upper {
            return Err(RangeError::new(lower, upper));
        }
        let elements = &self.elements;
        let mut out = Vec::with_capacity(elements.len() + 2);
        let mut i = 0;
        while i < elements.len() && elements[i] < lower {
            out.push(elements[i]);
            i += 1;
        }
        if i % 2 == 1 {
            out.push(lower);
        }
        while i < elements.len() && elements[i] <= upper {
            i += 1;
        }
        if i % 2 == 1 {
            out.push(upper);
        }
        out.extend_from_slice(&elements[i..]);
        self.elements = out;
        Ok(())
    }

    /// Remove every code of `other`
    pub fn remove_set(&mut self, other: &Self) {
        *self = self.difference(other);
    }

    /// Toggle membership of every code in `[lower, upper)`
    ///
    /// Only the two boundary points are touched; interior structure is kept.
    pub fn negate(&mut self, lower: i32, upper: i32) -> Result<(), RangeError> {
        if lower >= upper {
            return Err(RangeError::new(lower, upper));
        }
        let elements = &self.elements;
        let mut out = Vec::with_capacity(elements.len() + 2);
        let mut i = 0;
        while i < elements.len() && elements[i] <= lower {
            out.push(elements[i]);
            i += 1;
        }
        if out.last() == Some(&lower) {
            out.pop();
        } else {
            out.push(lower);
        }
        while i < elements.len() && elements[i] <= upper {
            out.push(elements[i]);
            i += 1;
        }
        if out.last() == Some(&upper) {
            out.pop();
        } else {
            out.push(upper);
        }
        out.extend_from_slice(&elements[i..]);
        self.elements = out;
        Ok(())
    }

    /// Toggle membership of every character code, `[0, CODE_MAX)`
    pub fn negate_chars(&mut self) {
        let _ = self.negate(0, CODE_MAX);
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.add_set(other);
        out
    }

    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        self.combine(other, Combine::Intersect)
    }

    /// Codes of `self` that are not in `other`
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        self.combine(other, Combine::Difference)
    }

    /// Linear merge of both boundary arrays, tracking the parity of each operand
    fn combine(&self, other: &Self, op: Combine) -> Self {
        let (a, b) = (&self.elements, &other.elements);
        let (mut i, mut j) = (0, 0);
        let mut out = Vec::new();
        let mut was_inside = false;

        while i < a.len() || j < b.len() {
            let v = match (a.get(i), b.get(j)) {
                (Some(&x), Some(&y)) => x.min(y),
                (Some(&x), None) => x,
                (None, Some(&y)) => y,
                (None, None) => break,
            };
            if a.get(i) == Some(&v) {
                i += 1;
            }
            if b.get(j) == Some(&v) {
                j += 1;
            }
            let in_a = i % 2 == 1;
            let in_b = j % 2 == 1;
            let inside = match op {
                Combine::Intersect => in_a && in_b,
                Combine::Difference => in_a && !in_b,
            };
            if inside != was_inside {
                out.push(v);
                was_inside = inside;
            }
        }
        Self { elements: out }
    }
}

/// Debug rendering of a single code
fn describe_code(code: i32) -> String {
    if code == EPSILON {
        "(e)".to_string()
    } else if is_token_label(code) {
        format!("<{}>", label_token(code))
    } else if code == CODE_MAX - 1 {
        "MAX".to_string()
    } else {
        match u32::try_from(code).ok().and_then(char::from_u32) {
            Some(c) if c.is_ascii_graphic() && !"'\"\\[]{}()".contains(c) => c.to_string(),
            _ => code.to_string(),
        }
    }
}

impl fmt::Display for CodeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (lower, upper)) in self.ranges().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            f.write_str(&describe_code(lower))?;
            if upper != lower + 1 {
                write!(f, "..{}", describe_code(upper - 1))?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CodeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CodeSet{:?}", self.elements)
    }
}
