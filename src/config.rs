use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{CleaningError, Result};
use crate::pipeline::processing::dates::{YearWindow, MAX_PLAUSIBLE_YEAR, MIN_PLAUSIBLE_YEAR};

/// Widest tolerance accepted: the span of plausible catalogue years.
pub const MAX_DATE_RANGE: i32 = MAX_PLAUSIBLE_YEAR - MIN_PLAUSIBLE_YEAR;

fn default_date_range() -> i32 {
    1
}

/// Nominal year of a register, or `None` for the register that collects
/// undated records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawNominalYear")]
pub struct NominalYear(pub Option<i32>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNominalYear {
    Year(i32),
    Marker(Option<String>),
}

impl TryFrom<RawNominalYear> for NominalYear {
    type Error = String;

    fn try_from(raw: RawNominalYear) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawNominalYear::Year(year) => Ok(NominalYear(Some(year))),
            RawNominalYear::Marker(None) => Ok(NominalYear(None)),
            RawNominalYear::Marker(Some(marker)) if marker.trim().eq_ignore_ascii_case("none") => {
                Ok(NominalYear(None))
            }
            RawNominalYear::Marker(Some(other)) => Err(format!(
                "register year must be an integer or \"none\", got {:?}",
                other
            )),
        }
    }
}

/// Registers configured for one source library.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub registers: BTreeMap<String, NominalYear>,
    #[serde(default = "default_date_range")]
    pub date_range: i32,
}

/// A single register resolved from a [`SourceConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterSpec {
    pub name: String,
    pub year: Option<i32>,
    pub date_range: i32,
}

impl RegisterSpec {
    /// Closed year interval `[year - date_range, year + date_range]`; `None`
    /// for the undated register.
    pub fn window(&self) -> Option<YearWindow> {
        self.year.map(|year| YearWindow::around(year, self.date_range))
    }

    pub fn is_undated(&self) -> bool {
        self.year.is_none()
    }
}

impl SourceConfig {
    /// Registers in name order.
    pub fn registers(&self) -> Vec<RegisterSpec> {
        self.registers
            .iter()
            .map(|(name, year)| RegisterSpec {
                name: name.clone(),
                year: year.0,
                date_range: self.date_range,
            })
            .collect()
    }
}

/// Register configuration keyed by source library code, loaded once per run.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct RegisterConfig {
    sources: BTreeMap<String, SourceConfig>,
}

impl RegisterConfig {
    /// Load from a `.json` or `.toml` file; anything else is read as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CleaningError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RegisterConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: RegisterConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(CleaningError::Config("no sources configured".to_string()));
        }
        for (name, source) in &self.sources {
            if source.date_range < 0 {
                return Err(CleaningError::Config(format!(
                    "source {} has negative date_range {}",
                    name, source.date_range
                )));
            }
            if source.registers.is_empty() {
                return Err(CleaningError::Config(format!(
                    "source {} has no registers",
                    name
                )));
            }
            if source.date_range > MAX_DATE_RANGE {
                return Err(CleaningError::Config(format!(
                    "source {} has date_range {} above the maximum {}",
                    name, source.date_range, MAX_DATE_RANGE
                )));
            }
            for (register, year) in &source.registers {
                if let Some(year) = year.0 {
                    if !(MIN_PLAUSIBLE_YEAR..=MAX_PLAUSIBLE_YEAR).contains(&year) {
                        return Err(CleaningError::Config(format!(
                            "register {} of source {} has year {} outside {}..={}",
                            register, name, year, MIN_PLAUSIBLE_YEAR, MAX_PLAUSIBLE_YEAR
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Case-insensitive lookup of a source library entry.
    pub fn source(&self, name: &str) -> Result<&SourceConfig> {
        self.sources
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, source)| source)
            .ok_or_else(|| CleaningError::UnknownSource(name.to_string()))
    }
}
