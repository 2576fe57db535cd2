//! Mapping legend positions to physical temperatures.
use std::{fmt, str::FromStr};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Serialize, Serializer};
use serde_derive::Serialize;

use crate::error::{Error, Result};

lazy_static! {
    /// A legend numeral as burnt into the frame, e.g. `72°F`.
    pub static ref READING_RE: Regex = Regex::new(r"^([0-9]{1,3})°([FC])$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Fahrenheit,
    Celsius,
}

impl Unit {
    pub fn label(&self) -> &'static str {
        match self {
            Unit::Fahrenheit => "F",
            Unit::Celsius => "C",
        }
    }
}

impl FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "F" => Ok(Unit::Fahrenheit),
            "C" => Ok(Unit::Celsius),
            _ => Err(Error::MalformedReading(s.into())),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A parsed legend numeral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub value: f64,
    pub unit: Unit,
}

impl FromStr for Reading {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let caps = READING_RE
            .captures(s)
            .ok_or_else(|| Error::MalformedReading(s.into()))?;
        let value = caps[1]
            .parse()
            .map_err(|_| Error::MalformedReading(s.into()))?;
        let unit = caps[2].parse()?;
        Ok(Reading { value, unit })
    }
}

/// The physical range printed on the legend of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleRange {
    pub low: f64,
    pub high: f64,
    #[serde(serialize_with = "serialize_unit")]
    pub unit: Option<Unit>,
}

fn serialize_unit<S: Serializer>(unit: &Option<Unit>, ser: S) -> std::result::Result<S::Ok, S::Error> {
    unit.map(|u| u.label()).unwrap_or("").serialize(ser)
}

impl ScaleRange {
    pub fn new(low: f64, high: f64, unit: Option<Unit>) -> Self {
        ScaleRange { low, high, unit }
    }

    /// Stand-in for a frame whose legend could not be read.
    pub fn placeholder() -> Self {
        ScaleRange::new(0., 0., None)
    }

    /// Build from the two OCR'd legend numerals. The unit is
    /// taken from the `max` reading.
    pub fn from_readings(min: &str, max: &str) -> Result<Self> {
        let min: Reading = min.parse()?;
        let max: Reading = max.parse()?;
        if min.unit != max.unit {
            tracing::warn!(
                "legend units disagree ({} vs {}), using {}",
                min.unit,
                max.unit,
                max.unit
            );
        }
        Ok(ScaleRange::new(min.value, max.value, Some(max.unit)))
    }

    pub fn is_calibrated(&self) -> bool {
        self.unit.is_some()
    }

    pub fn unit_label(&self) -> &'static str {
        self.unit.map(|u| u.label()).unwrap_or("")
    }

    /// Linear map of a legend position to a temperature:
    /// `low + (position / width) * (high - low)`.
    ///
    /// Positions outside `[0, width]` extrapolate; nothing is
    /// clamped.
    pub fn map(&self, width: f64, position: f64) -> f64 {
        self.low + (position / width) * (self.high - self.low)
    }
}
