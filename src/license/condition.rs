use std::fmt;

use serde::{Serialize, Serializer};

/// A single license obligation.
///
/// The universe of conditions is closed: each variant owns one bit of a
/// [`ConditionSet`], and bit order defines the total order of conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum LicenseCondition {
    Unencumbered = 0x0001,
    Permissive = 0x0002,
    Notice = 0x0004,
    Reciprocal = 0x0008,
    Restricted = 0x0010,
    /// Restricted, except across dynamic linkage (LGPL style).
    RestrictedAllowsDynamicLinking = 0x0020,
    Proprietary = 0x0040,
    ByExceptionOnly = 0x0080,
    NotAllowed = 0x0100,
}

impl LicenseCondition {
    /// Every recognized condition in bit order.
    pub const ALL: [LicenseCondition; 9] = [
        LicenseCondition::Unencumbered,
        LicenseCondition::Permissive,
        LicenseCondition::Notice,
        LicenseCondition::Reciprocal,
        LicenseCondition::Restricted,
        LicenseCondition::RestrictedAllowsDynamicLinking,
        LicenseCondition::Proprietary,
        LicenseCondition::ByExceptionOnly,
        LicenseCondition::NotAllowed,
    ];

    pub fn bit(self) -> u16 {
        self as u16
    }

    /// The name used for this condition in metadata records.
    pub fn name(self) -> &'static str {
        match self {
            LicenseCondition::Unencumbered => "unencumbered",
            LicenseCondition::Permissive => "permissive",
            LicenseCondition::Notice => "notice",
            LicenseCondition::Reciprocal => "reciprocal",
            LicenseCondition::Restricted => "restricted",
            LicenseCondition::RestrictedAllowsDynamicLinking => "restricted_allows_dynamic_linking",
            LicenseCondition::Proprietary => "proprietary",
            LicenseCondition::ByExceptionOnly => "by_exception_only",
            LicenseCondition::NotAllowed => "not_allowed",
        }
    }

    /// Look up a condition by its record name. Unrecognized names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "unencumbered" => Some(LicenseCondition::Unencumbered),
            "permissive" => Some(LicenseCondition::Permissive),
            "notice" => Some(LicenseCondition::Notice),
            "reciprocal" => Some(LicenseCondition::Reciprocal),
            "restricted" => Some(LicenseCondition::Restricted),
            "restricted_allows_dynamic_linking" => {
                Some(LicenseCondition::RestrictedAllowsDynamicLinking)
            }
            "proprietary" => Some(LicenseCondition::Proprietary),
            "by_exception_only" => Some(LicenseCondition::ByExceptionOnly),
            "not_allowed" => Some(LicenseCondition::NotAllowed),
            _ => None,
        }
    }
}

impl fmt::Display for LicenseCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

const MASK: u16 = 0x01ff;

/// A subset of the recognized license conditions, stored as a bitmask.
///
/// Equality is value equality, so two sets holding the same conditions are
/// interchangeable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConditionSet(u16);

impl ConditionSet {
    pub const fn empty() -> Self {
        ConditionSet(0)
    }

    pub const fn all() -> Self {
        ConditionSet(MASK)
    }

    pub const fn from_bits(bits: u16) -> Self {
        ConditionSet(bits & MASK)
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn of(conditions: &[LicenseCondition]) -> Self {
        conditions
            .iter()
            .fold(Self::empty(), |set, &lc| set.plus(lc))
    }

    /// Build a set from condition names, silently dropping unrecognized ones.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|n| LicenseCondition::from_name(n.as_ref()))
            .fold(Self::empty(), |set, lc| set.plus(lc))
    }

    pub fn plus(self, condition: LicenseCondition) -> Self {
        ConditionSet(self.0 | condition.bit())
    }

    pub fn minus(self, condition: LicenseCondition) -> Self {
        ConditionSet(self.0 & !condition.bit())
    }

    pub fn union(self, other: ConditionSet) -> Self {
        ConditionSet(self.0 | other.0)
    }

    pub fn difference(self, other: ConditionSet) -> Self {
        ConditionSet(self.0 & !other.0)
    }

    pub fn intersection(self, other: ConditionSet) -> Self {
        ConditionSet(self.0 & other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, condition: LicenseCondition) -> bool {
        self.0 & condition.bit() != 0
    }

    /// True when `self` and `other` share at least one condition.
    pub fn matches_any(self, other: ConditionSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_subset_of(self, other: ConditionSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = LicenseCondition> {
        LicenseCondition::ALL
            .into_iter()
            .filter(move |lc| self.contains(*lc))
    }

    /// Condition names, sorted alphabetically.
    pub fn names(self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.iter().map(LicenseCondition::name).collect();
        names.sort_unstable();
        names
    }
}

impl From<LicenseCondition> for ConditionSet {
    fn from(condition: LicenseCondition) -> Self {
        ConditionSet(condition.bit())
    }
}

impl FromIterator<LicenseCondition> for ConditionSet {
    fn from_iter<T: IntoIterator<Item = LicenseCondition>>(iter: T) -> Self {
        iter.into_iter().fold(Self::empty(), |set, lc| set.plus(lc))
    }
}

impl std::ops::BitOr for ConditionSet {
    type Output = ConditionSet;

    fn bitor(self, rhs: ConditionSet) -> ConditionSet {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for ConditionSet {
    fn bitor_assign(&mut self, rhs: ConditionSet) {
        *self = self.union(rhs);
    }
}

impl std::ops::BitAnd for ConditionSet {
    type Output = ConditionSet;

    fn bitand(self, rhs: ConditionSet) -> ConditionSet {
        self.intersection(rhs)
    }
}

impl fmt::Display for ConditionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().join("|"))
    }
}

impl Serialize for ConditionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}

// Condition groupings used by the policy and the query helpers.

/// Conditions that oblige the distributor to ship notices.
pub const IMPLIES_NOTICE: ConditionSet = ConditionSet::from_bits(
    LicenseCondition::Unencumbered as u16
        | LicenseCondition::Permissive as u16
        | LicenseCondition::Notice as u16
        | LicenseCondition::Reciprocal as u16
        | LicenseCondition::Restricted as u16
        | LicenseCondition::RestrictedAllowsDynamicLinking as u16
        | LicenseCondition::Proprietary as u16
        | LicenseCondition::ByExceptionOnly as u16,
);

/// The restricted family: infectious across derivation.
pub const IMPLIES_RESTRICTED: ConditionSet = ConditionSet::from_bits(
    LicenseCondition::Restricted as u16 | LicenseCondition::RestrictedAllowsDynamicLinking as u16,
);

/// Conditions that require sharing source.
pub const IMPLIES_SHARED: ConditionSet = ConditionSet::from_bits(
    LicenseCondition::Reciprocal as u16
        | LicenseCondition::Restricted as u16
        | LicenseCondition::RestrictedAllowsDynamicLinking as u16,
);

/// Conditions that require keeping source private.
pub const IMPLIES_PRIVATE: ConditionSet =
    ConditionSet::from_bits(LicenseCondition::Proprietary as u16);

pub const IMPLIES_BY_EXCEPTION_ONLY: ConditionSet = ConditionSet::from_bits(
    LicenseCondition::Proprietary as u16 | LicenseCondition::ByExceptionOnly as u16,
);
