//! Closed vocabularies for enumerated resource fields
//!
//! Every enumerated column of the resource schema is backed by one of the types
//! below. Each type knows its full member list and its canonical spelling, and
//! parses tokens case-insensitively. This module is the single place where
//! members are added or removed; the field validators are generic over
//! [`Vocabulary`] and never compare raw strings themselves.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A token that is not a member of the vocabulary it was parsed against
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("\"{value}\" is not a valid {vocabulary}")]
pub struct UnknownMember {
    pub vocabulary: &'static str,
    pub value: String,
}

/// A closed set of tokens with a canonical spelling per member
pub trait Vocabulary: Copy + Eq + fmt::Display + Sized + 'static {
    /// Name of the vocabulary used in error messages
    const NAME: &'static str;

    /// Every member, in declaration order
    fn all() -> &'static [Self];

    /// Canonical spelling used in output
    fn as_str(&self) -> &'static str;

    /// Case-insensitive lookup, ignoring surrounding whitespace
    fn parse_token(token: &str) -> Result<Self, UnknownMember> {
        let trimmed = token.trim();
        Self::all()
            .iter()
            .copied()
            .find(|member| member.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownMember {
                vocabulary: Self::NAME,
                value: trimmed.to_string(),
            })
    }

    /// Check membership without keeping the parsed value
    fn contains(token: &str) -> bool {
        Self::parse_token(token).is_ok()
    }
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            const ALL: &'static [$name] = &[$($name::$variant),+];
        }

        impl Vocabulary for $name {
            const NAME: &'static str = $label;

            fn all() -> &'static [Self] {
                Self::ALL
            }

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownMember;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <Self as Vocabulary>::parse_token(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

vocabulary! {
    /// US state or district, as its two-letter postal code
    State, "state" {
        Alabama => "AL",
        Alaska => "AK",
        Arizona => "AZ",
        Arkansas => "AR",
        California => "CA",
        Colorado => "CO",
        Connecticut => "CT",
        Delaware => "DE",
        DistrictOfColumbia => "DC",
        Florida => "FL",
        Georgia => "GA",
        Hawaii => "HI",
        Idaho => "ID",
        Illinois => "IL",
        Indiana => "IN",
        Iowa => "IA",
        Kansas => "KS",
        Kentucky => "KY",
        Louisiana => "LA",
        Maine => "ME",
        Maryland => "MD",
        Massachusetts => "MA",
        Michigan => "MI",
        Minnesota => "MN",
        Mississippi => "MS",
        Missouri => "MO",
        Montana => "MT",
        Nebraska => "NE",
        Nevada => "NV",
        NewHampshire => "NH",
        NewJersey => "NJ",
        NewMexico => "NM",
        NewYork => "NY",
        NorthCarolina => "NC",
        NorthDakota => "ND",
        Ohio => "OH",
        Oklahoma => "OK",
        Oregon => "OR",
        Pennsylvania => "PA",
        RhodeIsland => "RI",
        SouthCarolina => "SC",
        SouthDakota => "SD",
        Tennessee => "TN",
        Texas => "TX",
        Utah => "UT",
        Vermont => "VT",
        Virginia => "VA",
        Washington => "WA",
        WestVirginia => "WV",
        Wisconsin => "WI",
        Wyoming => "WY",
    }
}

vocabulary! {
    /// Cost tier of a resource
    Cost, "cost" {
        Free => "Free",
        Low => "Low",
        Medium => "Medium",
        High => "High",
    }
}

vocabulary! {
    /// Career interest area served by a resource
    Interest, "career interest" {
        Agriculture => "Agriculture",
        Arts => "Arts",
        Business => "Business",
        Construction => "Construction",
        Education => "Education",
        Engineering => "Engineering",
        Healthcare => "Healthcare",
        Hospitality => "Hospitality",
        Law => "Law",
        Manufacturing => "Manufacturing",
        Science => "Science",
        Technology => "Technology",
        Trades => "Trades",
        Transportation => "Transportation",
    }
}

vocabulary! {
    /// How instruction is delivered
    InstructionType, "instruction type" {
        InPerson => "In-Person",
        Online => "Online",
        Hybrid => "Hybrid",
    }
}

vocabulary! {
    BoardingType, "boarding type" {
        Day => "Day",
        Overnight => "Overnight",
        Residential => "Residential",
    }
}

vocabulary! {
    /// Geographic restriction on who may use a resource
    LocationLimit, "location limit" {
        City => "City",
        County => "County",
        Region => "Region",
        State => "State",
        National => "National",
    }
}

vocabulary! {
    Gender, "gender" {
        Male => "Male",
        Female => "Female",
        Coed => "Coed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(State::parse_token("ca").unwrap(), State::California);
        assert_eq!(State::parse_token(" Ny ").unwrap(), State::NewYork);
        assert_eq!(
            InstructionType::parse_token("in-person").unwrap(),
            InstructionType::InPerson
        );
        assert_eq!(Gender::from_str("COED").unwrap(), Gender::Coed);
    }

    #[test]
    fn test_unknown_member_reports_vocabulary() {
        let err = Cost::parse_token(" Cheap ").unwrap_err();
        assert_eq!(err.vocabulary, "cost");
        assert_eq!(err.value, "Cheap");
        assert_eq!(err.to_string(), "\"Cheap\" is not a valid cost");
    }

    #[test]
    fn test_canonical_form_in_output() {
        assert_eq!(State::California.to_string(), "CA");
        assert_eq!(
            serde_json::to_string(&InstructionType::InPerson).unwrap(),
            "\"In-Person\""
        );
    }

    #[test]
    fn test_member_lists() {
        assert_eq!(State::all().len(), 51);
        assert_eq!(Cost::all().len(), 4);
        assert!(LocationLimit::contains("county"));
        assert!(!LocationLimit::contains("planet"));
        assert!(!BoardingType::contains(""));
    }

    #[test]
    fn test_round_trip_through_canonical_form() {
        for member in Interest::all() {
            assert_eq!(Interest::parse_token(member.as_str()).unwrap(), *member);
        }
    }
}
