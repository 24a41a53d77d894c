/*!
 * Atomic time-stamped entries.
 */

use std::fmt;

use crate::errors::{Result, TextgridError};
use crate::timing::{approx_eq, approx_lt};

// @struct: Labelled time span [start, end)
#[derive(Debug, Clone)]
pub struct Interval {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds, always greater than `start`
    pub end: f64,
    /// Annotation text
    pub label: String,
}

impl Interval {
    // @creates: Interval after checking its span
    pub fn new(start: f64, end: f64, label: impl Into<String>) -> Result<Self> {
        let interval = Self { start, end, label: label.into() };
        interval.validate()?;
        Ok(interval)
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether the label is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.label.trim().is_empty()
    }

    // @validates: Non-negative start and positive duration
    pub fn validate(&self) -> Result<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(TextgridError::Validation(format!("{} has a non-finite timestamp", self)));
        }
        if approx_lt(self.start, 0.0) {
            return Err(TextgridError::OutOfBounds(format!("{} starts before zero", self)));
        }
        if self.end <= self.start {
            return Err(TextgridError::Validation(format!(
                "{} must end after it starts",
                self
            )));
        }
        Ok(())
    }

    pub(crate) fn shifted(&self, offset: f64) -> Self {
        Self { start: self.start + offset, end: self.end + offset, label: self.label.clone() }
    }

    pub(crate) fn with_span(&self, start: f64, end: f64) -> Self {
        Self { start, end, label: self.label.clone() }
    }
}

impl PartialEq for Interval {
    fn eq(&self, other: &Self) -> bool {
        approx_eq(self.start, other.start)
            && approx_eq(self.end, other.end)
            && self.label == other.label
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interval({}, {}, {:?})", self.start, self.end, self.label)
    }
}

// @struct: Labelled instant
#[derive(Debug, Clone)]
pub struct Point {
    /// Time in seconds
    pub time: f64,
    /// Annotation text
    pub label: String,
}

impl Point {
    // @creates: Point after checking its time
    pub fn new(time: f64, label: impl Into<String>) -> Result<Self> {
        let point = Self { time, label: label.into() };
        point.validate()?;
        Ok(point)
    }

    // @validates: Finite and non-negative time
    pub fn validate(&self) -> Result<()> {
        if !self.time.is_finite() {
            return Err(TextgridError::Validation(format!("{} has a non-finite time", self)));
        }
        if approx_lt(self.time, 0.0) {
            return Err(TextgridError::OutOfBounds(format!("{} lies before zero", self)));
        }
        Ok(())
    }

    pub(crate) fn shifted(&self, offset: f64) -> Self {
        Self { time: self.time + offset, label: self.label.clone() }
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        approx_eq(self.time, other.time) && self.label == other.label
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({}, {:?})", self.time, self.label)
    }
}

/// Either kind of entry, used where a tier's kind is not known statically
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Interval(Interval),
    Point(Point),
}

impl Entry {
    /// The entry's annotation text
    pub fn label(&self) -> &str {
        match self {
            Entry::Interval(interval) => &interval.label,
            Entry::Point(point) => &point.label,
        }
    }

    /// Span covered by the entry; a point covers a single instant
    pub fn span(&self) -> (f64, f64) {
        match self {
            Entry::Interval(interval) => (interval.start, interval.end),
            Entry::Point(point) => (point.time, point.time),
        }
    }
}

impl From<Interval> for Entry {
    fn from(interval: Interval) -> Self {
        Entry::Interval(interval)
    }
}

impl From<Point> for Entry {
    fn from(point: Point) -> Self {
        Entry::Point(point)
    }
}
