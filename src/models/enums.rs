use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A string that does not name any member of a closed value set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid enum value for {field}: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The wire form is exactly the declared string.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(RiskLabel {
    Safe => "Safe",
    AdjustDosage => "Adjust Dosage",
    Toxic => "Toxic",
    Ineffective => "Ineffective",
    Unknown => "Unknown",
});

str_enum!(Severity {
    None => "none",
    Low => "low",
    Moderate => "moderate",
    High => "high",
    Critical => "critical",
});

/// Metabolizer status. Serialized as the full label, e.g. `"Poor Metabolizer (PM)"`;
/// the bare code (`"PM"`) is accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phenotype {
    #[serde(rename = "Poor Metabolizer (PM)", alias = "PM")]
    Poor,
    #[serde(rename = "Intermediate Metabolizer (IM)", alias = "IM")]
    Intermediate,
    #[serde(rename = "Normal Metabolizer (NM)", alias = "NM")]
    Normal,
    #[serde(rename = "Rapid Metabolizer (RM)", alias = "RM")]
    Rapid,
    #[serde(rename = "Ultrarapid Metabolizer (URM)", alias = "URM")]
    Ultrarapid,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl Phenotype {
    pub const ALL: &'static [Phenotype] = &[
        Self::Poor,
        Self::Intermediate,
        Self::Normal,
        Self::Rapid,
        Self::Ultrarapid,
        Self::Unknown,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Poor => "PM",
            Self::Intermediate => "IM",
            Self::Normal => "NM",
            Self::Rapid => "RM",
            Self::Ultrarapid => "URM",
            Self::Unknown => "Unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Poor => "Poor Metabolizer (PM)",
            Self::Intermediate => "Intermediate Metabolizer (IM)",
            Self::Normal => "Normal Metabolizer (NM)",
            Self::Rapid => "Rapid Metabolizer (RM)",
            Self::Ultrarapid => "Ultrarapid Metabolizer (URM)",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::str::FromStr for Phenotype {
    type Err = InvalidEnum;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.label() == s || p.code() == s)
            .ok_or_else(|| InvalidEnum {
                field: "Phenotype".into(),
                value: s.into(),
            })
    }
}

impl std::fmt::Display for Phenotype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
