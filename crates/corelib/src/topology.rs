//! Locality tiers.
//!
//! A locality is an ordered list of `key=value` tiers, most general first
//! (`region=us-east,zone=us-east-1a`). Proximity between two nodes is the
//! number of leading tiers they share, never exact equality of the whole
//! list.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One level of a hierarchical placement label.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tier {
    pub key: String,
    pub value: String,
}

impl Tier {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Physical placement of a node.
///
/// Serialized as its string form so cluster files can say
/// `"locality": "region=eu,zone=b"`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locality {
    pub tiers: Vec<Tier>,
}

impl Locality {
    pub fn new(tiers: Vec<Tier>) -> Self {
        Self { tiers }
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Number of leading tiers equal (key and value) in both localities.
    ///
    /// `region=a,zone=x` vs `region=a,zone=y` is 1; vs `region=b,zone=x` is 0
    /// because matching stops at the first differing tier.
    pub fn shared_prefix_len(&self, other: &Locality) -> usize {
        self.tiers
            .iter()
            .zip(other.tiers.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }
}

impl fmt::Display for Locality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tier) in self.tiers.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", tier)?;
        }
        Ok(())
    }
}

impl FromStr for Locality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Locality::default());
        }

        let mut tiers = Vec::new();
        for part in s.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| Error::InvalidLocality(format!("tier {:?} is not key=value", part)))?;
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                return Err(Error::InvalidLocality(format!(
                    "tier {:?} has an empty key or value",
                    part
                )));
            }
            tiers.push(Tier::new(key, value));
        }
        Ok(Locality { tiers })
    }
}

impl TryFrom<String> for Locality {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Locality> for String {
    fn from(locality: Locality) -> Self {
        locality.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(s: &str) -> Locality {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let l = loc("region=us-east, zone=a");
        assert_eq!(l.tiers.len(), 2);
        assert_eq!(l.tiers[1], Tier::new("zone", "a"));
        assert_eq!(l.to_string(), "region=us-east,zone=a");
        assert!(loc("").is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!("region".parse::<Locality>(), Err(Error::InvalidLocality(_))));
        assert!(matches!("region=".parse::<Locality>(), Err(Error::InvalidLocality(_))));
        assert!(matches!("region=a,=b".parse::<Locality>(), Err(Error::InvalidLocality(_))));
    }

    #[test]
    fn test_shared_prefix_len() {
        let me = loc("region=us,zone=a,rack=1");
        assert_eq!(me.shared_prefix_len(&loc("region=us,zone=a,rack=1")), 3);
        assert_eq!(me.shared_prefix_len(&loc("region=us,zone=a,rack=2")), 2);
        assert_eq!(me.shared_prefix_len(&loc("region=us,zone=b")), 1);
        assert_eq!(me.shared_prefix_len(&loc("region=eu,zone=a")), 0);
        // A later tier matching does not count once an earlier one differs.
        assert_eq!(me.shared_prefix_len(&loc("region=eu,zone=a,rack=1")), 0);
        assert_eq!(me.shared_prefix_len(&Locality::default()), 0);
    }

    #[test]
    fn test_shared_prefix_requires_same_key() {
        assert_eq!(loc("region=a").shared_prefix_len(&loc("zone=a")), 0);
    }
}
