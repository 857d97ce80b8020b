use serde::{Deserialize, Serialize};

/// Number of table columns, one per dependent count 0..=5.
pub const DEPENDENT_COLUMNS: usize = 6;

/// Number of persons the debtor is legally obligated to support.
///
/// The statutory table stops at five; every larger count shares the
/// "5 or more" column, so values are capped rather than rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DependentCount(u8);

impl DependentCount {
    pub const MAX: u8 = 5;

    /// Returns `None` when `count` is outside `0..=5`.
    pub fn new(count: u8) -> Option<Self> {
        (count <= Self::MAX).then_some(Self(count))
    }

    /// Clamps any integer into `0..=5`.
    pub fn clamped(count: i64) -> Self {
        Self(count.clamp(0, i64::from(Self::MAX)) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Column index into [`GarnishmentRow::amounts`](crate::GarnishmentRow).
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// Persisted column name (`pfand_0` .. `pfand_5`).
    pub fn column_name(self) -> &'static str {
        match self.0 {
            0 => "pfand_0",
            1 => "pfand_1",
            2 => "pfand_2",
            3 => "pfand_3",
            4 => "pfand_4",
            _ => "pfand_5",
        }
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (0..=Self::MAX).map(Self)
    }
}

impl TryFrom<u8> for DependentCount {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("dependent count must be 0..=5, got {value}"))
    }
}

impl From<DependentCount> for u8 {
    fn from(value: DependentCount) -> Self {
        value.0
    }
}

impl std::fmt::Display for DependentCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 == Self::MAX {
            write!(f, "{}+", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}
