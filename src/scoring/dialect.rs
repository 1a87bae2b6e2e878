use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Regional speech variety the player practices in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Central,
    Northern,
    Isan,
    Southern,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [
        Dialect::Central,
        Dialect::Northern,
        Dialect::Isan,
        Dialect::Southern,
    ];

    /// Identifier used in lesson JSON and on the wire
    pub fn id(self) -> &'static str {
        match self {
            Dialect::Central => "central",
            Dialect::Northern => "northern",
            Dialect::Isan => "isan",
            Dialect::Southern => "southern",
        }
    }

    /// Display label in Thai
    pub fn label(self) -> &'static str {
        match self {
            Dialect::Central => "กลาง",
            Dialect::Northern => "เหนือ (คำเมือง)",
            Dialect::Isan => "อีสาน",
            Dialect::Southern => "ใต้",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Dialect {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Dialect::ALL
            .into_iter()
            .find(|d| d.id() == wanted)
            .ok_or_else(|| anyhow::anyhow!("Unknown dialect: {}", s))
    }
}
