//! The four fixed buckets of the urgency/importance matrix.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};

/// One of the four matrix quadrants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quadrant {
    /// Urgent and important.
    DoFirst = 1,
    /// Important, not urgent.
    Schedule = 2,
    /// Urgent, not important.
    Delegate = 3,
    /// Neither urgent nor important.
    Eliminate = 4,
}

/// Static display metadata for a quadrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuadrantInfo {
    pub number: u8,
    pub name: &'static str,
    pub short_name: &'static str,
    pub description: &'static str,
    pub color: &'static str,
    pub style_class: &'static str,
}

const QUADRANT_INFO: [QuadrantInfo; 4] = [
    QuadrantInfo {
        number: 1,
        name: "Urgent & Important",
        short_name: "Do First",
        description: "Critical tasks that require immediate attention",
        color: "red",
        style_class: "urgent-important",
    },
    QuadrantInfo {
        number: 2,
        name: "Important, Not Urgent",
        short_name: "Schedule",
        description: "Long-term goals and strategic planning",
        color: "yellow",
        style_class: "important-not-urgent",
    },
    QuadrantInfo {
        number: 3,
        name: "Urgent, Not Important",
        short_name: "Delegate",
        description: "Tasks that need to be done but can be delegated",
        color: "blue",
        style_class: "urgent-not-important",
    },
    QuadrantInfo {
        number: 4,
        name: "Not Urgent, Not Important",
        short_name: "Eliminate",
        description: "Distractions and time-wasters to minimize",
        color: "green",
        style_class: "not-urgent-not-important",
    },
];

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::DoFirst,
        Quadrant::Schedule,
        Quadrant::Delegate,
        Quadrant::Eliminate,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn info(self) -> &'static QuadrantInfo {
        &QUADRANT_INFO[usize::from(self.number() - 1)]
    }

    /// Category label used by calendar exports.
    pub fn calendar_name(self) -> &'static str {
        match self {
            Quadrant::DoFirst => "Important & Urgent",
            Quadrant::Schedule => "Important & Not Urgent",
            Quadrant::Delegate => "Not Important & Urgent",
            Quadrant::Eliminate => "Not Important & Not Urgent",
        }
    }

    /// Key used for this quadrant in the JSON store (`"1"`..`"4"`).
    pub fn store_key(self) -> String {
        self.number().to_string()
    }
}

impl TryFrom<u8> for Quadrant {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Quadrant::DoFirst),
            2 => Ok(Quadrant::Schedule),
            3 => Ok(Quadrant::Delegate),
            4 => Ok(Quadrant::Eliminate),
            other => Err(Error::InvalidQuadrant(other.to_string())),
        }
    }
}

/// Accepts `1`..`4` and `q1`..`q4` (case-insensitive).
impl FromStr for Quadrant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('q')
            .or_else(|| trimmed.strip_prefix('Q'))
            .unwrap_or(trimmed);
        let number: u8 = digits
            .parse()
            .map_err(|_| Error::InvalidQuadrant(trimmed.to_string()))?;
        Quadrant::try_from(number)
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl Serialize for Quadrant {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}
