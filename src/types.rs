// src/types.rs

//! Small value types shared by the config file and the CLI.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// A duration written as `"<number><unit>"`, e.g. `"250ms"`, `"3s"`, `"1m"`,
/// `"2h"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct HumanDuration(pub Duration);

impl HumanDuration {
    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty duration string".to_string());
        }

        // Find the boundary between digits and suffix.
        let idx = s
            .chars()
            .position(|c| !c.is_ascii_digit())
            .ok_or_else(|| format!("duration '{s}' is missing a unit suffix (ms, s, m, h)"))?;

        let (num_part, unit_part) = s.split_at(idx);
        let value: u64 = num_part
            .parse()
            .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
        let unit = unit_part.trim().to_lowercase();

        let duration = match unit.as_str() {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(scaled(s, value, 60)?),
            "h" => Duration::from_secs(scaled(s, value, 60 * 60)?),
            _ => {
                return Err(format!(
                    "unsupported duration unit '{}'; expected ms, s, m, or h",
                    unit
                ));
            }
        };

        Ok(HumanDuration(duration))
    }
}

fn scaled(s: &str, value: u64, factor: u64) -> Result<u64, String> {
    value
        .checked_mul(factor)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}

impl TryFrom<String> for HumanDuration {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
