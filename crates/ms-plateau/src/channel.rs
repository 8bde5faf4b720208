//! Detector wiring.
//!
//! Each scintillator's efficiency is measured as the three-fold coincidence
//! rate over the two-fold coincidence of the other paddles in the telescope.
//! The column names encode which paddles are wired into each coincidence unit.

use std::fmt;

use ms_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Scintillator paddle whose voltage was varied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scintillator {
    /// Paddle 1.
    One,
    /// Paddle 2.
    Two,
    /// Paddle 3.
    Three,
    /// Paddle 4.
    Four,
    /// Paddle 5.
    Five,
}

impl Scintillator {
    /// All paddles in id order.
    pub const ALL: [Scintillator; 5] = [
        Scintillator::One,
        Scintillator::Two,
        Scintillator::Three,
        Scintillator::Four,
        Scintillator::Five,
    ];

    /// Look up a paddle by its numeric id (1..=5).
    pub fn from_id(id: u32) -> Result<Self> {
        match id {
            1 => Ok(Scintillator::One),
            2 => Ok(Scintillator::Two),
            3 => Ok(Scintillator::Three),
            4 => Ok(Scintillator::Four),
            5 => Ok(Scintillator::Five),
            other => Err(Error::MalformedInput(format!(
                "unknown scintillator id {} (expected 1..=5)",
                other
            ))),
        }
    }

    /// Numeric id.
    pub fn id(self) -> u32 {
        match self {
            Scintillator::One => 1,
            Scintillator::Two => 2,
            Scintillator::Three => 3,
            Scintillator::Four => 4,
            Scintillator::Five => 5,
        }
    }

    /// Zero-based index (for per-paddle config arrays).
    pub fn index(self) -> usize {
        self.id() as usize - 1
    }

    /// Three-fold coincidence column.
    pub fn three_fold_column(self) -> &'static str {
        match self {
            Scintillator::One | Scintillator::Two | Scintillator::Three => "C1C2C3",
            Scintillator::Four => "C2C3C4",
            Scintillator::Five => "C2C3C5",
        }
    }

    /// Two-fold coincidence column.
    pub fn two_fold_column(self) -> &'static str {
        match self {
            Scintillator::One | Scintillator::Four | Scintillator::Five => "C2C3",
            Scintillator::Two => "C1C3",
            Scintillator::Three => "C1C2",
        }
    }

    /// Per-paddle voltage column in the coincidence sheet.
    pub fn voltage_column(self) -> &'static str {
        match self {
            Scintillator::One => "V1",
            Scintillator::Two => "V2",
            Scintillator::Three => "V3",
            Scintillator::Four => "V4",
            Scintillator::Five => "V5",
        }
    }
}

impl fmt::Display for Scintillator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl TryFrom<u32> for Scintillator {
    type Error = Error;

    fn try_from(id: u32) -> Result<Self> {
        Self::from_id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wiring_table() {
        let expect = [
            (1, "C1C2C3", "C2C3", "V1"),
            (2, "C1C2C3", "C1C3", "V2"),
            (3, "C1C2C3", "C1C2", "V3"),
            (4, "C2C3C4", "C2C3", "V4"),
            (5, "C2C3C5", "C2C3", "V5"),
        ];
        for (id, three, two, v) in expect {
            let s = Scintillator::from_id(id).unwrap();
            assert_eq!(s.id(), id);
            assert_eq!(s.three_fold_column(), three);
            assert_eq!(s.two_fold_column(), two);
            assert_eq!(s.voltage_column(), v);
        }
    }

    #[test]
    fn unknown_id_fails_loudly() {
        for id in [0, 6, 42] {
            let err = Scintillator::from_id(id).unwrap_err();
            assert!(matches!(err, Error::MalformedInput(_)));
            assert!(err.to_string().contains(&id.to_string()));
        }
    }

    #[test]
    fn all_in_order() {
        let ids: Vec<u32> = Scintillator::ALL.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(Scintillator::Four.index(), 3);
    }
}
