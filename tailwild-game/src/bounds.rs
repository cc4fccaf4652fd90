//! Inclusive integer ranges shared by catalog tuning, previews and results.
use serde::{Deserialize, Serialize};

/// Inclusive `[min, max]` range, serialized as a two element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Bounds {
    pub min: u32,
    pub max: u32,
}

impl Bounds {
    /// Build a range, swapping the ends when given in the wrong order.
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    #[must_use]
    pub const fn fixed(value: u32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    #[must_use]
    pub const fn contains(self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Multiply both ends by a per-unit rate.
    #[must_use]
    pub const fn scale(self, rate: u32) -> Self {
        Self {
            min: self.min.saturating_mul(rate),
            max: self.max.saturating_mul(rate),
        }
    }

    /// Element-wise sum of two ranges.
    #[must_use]
    pub const fn plus(self, other: Self) -> Self {
        Self {
            min: self.min.saturating_add(other.min),
            max: self.max.saturating_add(other.max),
        }
    }

    /// Apply a monotone mapping to both ends.
    #[must_use]
    pub fn map(self, f: impl Fn(u32) -> u32) -> Self {
        Self::new(f(self.min), f(self.max))
    }
}

impl From<[u32; 2]> for Bounds {
    fn from(value: [u32; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<Bounds> for [u32; 2] {
    fn from(value: Bounds) -> Self {
        [value.min, value.max]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_pair_and_normalizes_order() {
        let parsed: Bounds = serde_json::from_str("[5, 2]").unwrap();
        assert_eq!(parsed, Bounds::new(2, 5));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "[2,5]");
    }

    #[test]
    fn arithmetic_helpers() {
        let steps = Bounds::new(3, 6);
        assert_eq!(steps.scale(2), Bounds::new(6, 12));
        assert_eq!(steps.plus(Bounds::fixed(1)), Bounds::new(4, 7));
        assert!(steps.contains(3) && steps.contains(6) && !steps.contains(7));
        assert_eq!(steps.map(|v| v.saturating_sub(4)), Bounds::new(0, 2));
    }
}
