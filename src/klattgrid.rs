/*!
 * KlattGrid documents.
 *
 * A KlattGrid is a Praat synthesis description: a sequence of named sections
 * sharing one time range. A section is one of
 * - a plain header (`phonation? <exists>` with bounds only),
 * - a point tier of `(time, value)` pairs (`pitch`, `voicing_amplitude`, ...),
 * - a container (`oral_formants`, ...) holding intermediate tiers such as
 *   `formants` and `bandwidths`, each a list of numbered point sub-tiers.
 *
 * The same bounds invariant as for TextGrids applies at every level.
 */

use std::fs;
use std::path::Path;

use log::debug;

use crate::errors::{Result, TextgridError};
use crate::io::decode_bytes;
use crate::io::lexer::{Layout, TokenStream, read_header, tokenize};
use crate::textgrid::tier::check_bounds;
use crate::timing::{approx_le, format_number, within};

/// A timed numeric value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KlattPoint {
    pub time: f64,
    pub value: f64,
}

impl KlattPoint {
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

/// A named series of timed values
#[derive(Debug, Clone, PartialEq)]
pub struct KlattPointTier {
    name: String,
    min_time: f64,
    max_time: f64,
    points: Vec<KlattPoint>,
}

impl KlattPointTier {
    pub fn new(name: impl Into<String>, points: Vec<KlattPoint>, min_time: f64, max_time: f64) -> Result<Self> {
        let mut points = points;
        points.sort_by(|a, b| a.time.total_cmp(&b.time));
        let tier = Self { name: name.into(), min_time, max_time, points };
        tier.validate()?;
        Ok(tier)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_time(&self) -> f64 {
        self.min_time
    }

    pub fn max_time(&self) -> f64 {
        self.max_time
    }

    pub fn points(&self) -> &[KlattPoint] {
        &self.points
    }

    // @validates: Bounds, point containment, strictly increasing times
    pub fn validate(&self) -> Result<()> {
        check_bounds(&self.name, self.min_time, self.max_time)?;
        for point in &self.points {
            if !point.value.is_finite() || !within(point.time, self.min_time, self.max_time) {
                return Err(TextgridError::OutOfBounds(format!(
                    "klatt tier '{}': point ({}, {}) lies outside [{}, {}]",
                    self.name, point.time, point.value, self.min_time, self.max_time
                )));
            }
        }
        for pair in self.points.windows(2) {
            if approx_le(pair[1].time, pair[0].time) {
                return Err(TextgridError::Validation(format!(
                    "klatt tier '{}' has two points at {}",
                    self.name, pair[0].time
                )));
            }
        }
        Ok(())
    }

    /// Same tier with every value passed through `modify`
    pub fn modify_values(&self, modify: impl Fn(f64) -> f64) -> Result<Self> {
        let points = self.points.iter().map(|p| KlattPoint::new(p.time, modify(p.value))).collect();
        Self::new(self.name.clone(), points, self.min_time, self.max_time)
    }
}

/// Related sub-tiers inside a container, e.g. every `formants` tier of `oral_formants`
#[derive(Debug, Clone, PartialEq)]
pub struct KlattIntermediateTier {
    name: String,
    tiers: Vec<KlattPointTier>,
}

impl KlattIntermediateTier {
    pub fn new(name: impl Into<String>, tiers: Vec<KlattPointTier>) -> Self {
        Self { name: name.into(), tiers }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sub-tiers in order; the first is `formants [1]` in the file
    pub fn tiers(&self) -> &[KlattPointTier] {
        &self.tiers
    }
}

/// A section holding intermediate tiers
#[derive(Debug, Clone, PartialEq)]
pub struct KlattContainerTier {
    name: String,
    min_time: f64,
    max_time: f64,
    intermediates: Vec<KlattIntermediateTier>,
}

impl KlattContainerTier {
    pub fn new(
        name: impl Into<String>,
        min_time: f64,
        max_time: f64,
        intermediates: Vec<KlattIntermediateTier>,
    ) -> Result<Self> {
        let tier = Self { name: name.into(), min_time, max_time, intermediates };
        tier.validate()?;
        Ok(tier)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn intermediates(&self) -> &[KlattIntermediateTier] {
        &self.intermediates
    }

    pub fn intermediate(&self, name: &str) -> Option<&KlattIntermediateTier> {
        self.intermediates.iter().find(|t| t.name == name)
    }

    pub fn validate(&self) -> Result<()> {
        check_bounds(&self.name, self.min_time, self.max_time)?;
        for sub_tier in self.intermediates.iter().flat_map(|t| t.tiers.iter()) {
            sub_tier.validate()?;
            if !within(sub_tier.min_time, self.min_time, self.max_time)
                || !within(sub_tier.max_time, self.min_time, self.max_time)
            {
                return Err(TextgridError::OutOfBounds(format!(
                    "sub-tier '{}' does not fit in container '{}'",
                    sub_tier.name, self.name
                )));
            }
        }
        Ok(())
    }

    /// Applies `modify` to the values of every sub-tier of one intermediate tier
    pub fn modify_subtiers(&self, intermediate: &str, modify: impl Fn(f64) -> f64) -> Result<Self> {
        if self.intermediate(intermediate).is_none() {
            return Err(TextgridError::TierNotFound(format!("{} in {}", intermediate, self.name)));
        }
        let mut intermediates = Vec::with_capacity(self.intermediates.len());
        for tier in &self.intermediates {
            if tier.name == intermediate {
                let tiers = tier.tiers.iter().map(|t| t.modify_values(&modify)).collect::<Result<Vec<_>>>()?;
                intermediates.push(KlattIntermediateTier::new(tier.name.clone(), tiers));
            } else {
                intermediates.push(tier.clone());
            }
        }
        Self::new(self.name.clone(), self.min_time, self.max_time, intermediates)
    }
}

/// One section of a KlattGrid
#[derive(Debug, Clone, PartialEq)]
pub enum KlattTier {
    /// Header-only section (`phonation`, `vocal_tract`, ...)
    Section { name: String, min_time: f64, max_time: f64 },
    Point(KlattPointTier),
    Container(KlattContainerTier),
}

impl KlattTier {
    pub fn name(&self) -> &str {
        match self {
            KlattTier::Section { name, .. } => name,
            KlattTier::Point(t) => &t.name,
            KlattTier::Container(t) => &t.name,
        }
    }

    pub fn min_time(&self) -> f64 {
        match self {
            KlattTier::Section { min_time, .. } => *min_time,
            KlattTier::Point(t) => t.min_time,
            KlattTier::Container(t) => t.min_time,
        }
    }

    pub fn max_time(&self) -> f64 {
        match self {
            KlattTier::Section { max_time, .. } => *max_time,
            KlattTier::Point(t) => t.max_time,
            KlattTier::Container(t) => t.max_time,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            KlattTier::Section { name, min_time, max_time } => check_bounds(name, *min_time, *max_time),
            KlattTier::Point(t) => t.validate(),
            KlattTier::Container(t) => t.validate(),
        }
    }
}

/// A KlattGrid document
#[derive(Debug, Clone, PartialEq)]
pub struct Klattgrid {
    min_time: f64,
    max_time: f64,
    // @field: Sections in file order
    tiers: Vec<KlattTier>,
}

impl Klattgrid {
    pub fn new(min_time: f64, max_time: f64) -> Result<Self> {
        check_bounds("klattgrid", min_time, max_time)?;
        Ok(Self { min_time, max_time, tiers: Vec::new() })
    }

    pub fn min_time(&self) -> f64 {
        self.min_time
    }

    pub fn max_time(&self) -> f64 {
        self.max_time
    }

    pub fn tiers(&self) -> &[KlattTier] {
        &self.tiers
    }

    pub fn tier_names(&self) -> Vec<&str> {
        self.tiers.iter().map(KlattTier::name).collect()
    }

    pub fn get_tier(&self, name: &str) -> Result<&KlattTier> {
        self.tiers
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| TextgridError::TierNotFound(name.to_string()))
    }

    pub fn add_tier(&mut self, tier: KlattTier) -> Result<()> {
        if self.tiers.iter().any(|t| t.name() == tier.name()) {
            return Err(TextgridError::DuplicateTierName(tier.name().to_string()));
        }
        self.check_contains(&tier)?;
        self.tiers.push(tier);
        Ok(())
    }

    // @validates: Document bounds and every section, recursively
    pub fn validate(&self) -> Result<()> {
        check_bounds("klattgrid", self.min_time, self.max_time)?;
        for tier in &self.tiers {
            tier.validate()?;
            self.check_contains(tier)?;
        }
        Ok(())
    }

    fn check_contains(&self, tier: &KlattTier) -> Result<()> {
        if within(tier.min_time(), self.min_time, self.max_time) && within(tier.max_time(), self.min_time, self.max_time) {
            Ok(())
        } else {
            Err(TextgridError::OutOfBounds(format!(
                "section '{}' does not fit in the klattgrid [{}, {}]",
                tier.name(),
                self.min_time,
                self.max_time
            )))
        }
    }

    /// Copy with the values of point tier `tier_name` passed through `modify`
    pub fn modify_values(&self, tier_name: &str, modify: impl Fn(f64) -> f64) -> Result<Klattgrid> {
        self.replace_with(tier_name, |tier| match tier {
            KlattTier::Point(t) => Ok(KlattTier::Point(t.modify_values(&modify)?)),
            other => Err(incompatible(other, "point tier")),
        })
    }

    /// Copy with the sub-tiers of `container.intermediate` passed through `modify`
    pub fn modify_subtiers(
        &self,
        container: &str,
        intermediate: &str,
        modify: impl Fn(f64) -> f64,
    ) -> Result<Klattgrid> {
        self.replace_with(container, |tier| match tier {
            KlattTier::Container(t) => Ok(KlattTier::Container(t.modify_subtiers(intermediate, &modify)?)),
            other => Err(incompatible(other, "container tier")),
        })
    }

    fn replace_with(&self, name: &str, change: impl Fn(&KlattTier) -> Result<KlattTier>) -> Result<Klattgrid> {
        self.get_tier(name)?;
        let tiers = self
            .tiers
            .iter()
            .map(|tier| if tier.name() == name { change(tier) } else { Ok(tier.clone()) })
            .collect::<Result<Vec<_>>>()?;
        Ok(Klattgrid { min_time: self.min_time, max_time: self.max_time, tiers })
    }

    /// Parses the long text form Praat writes for KlattGrids
    pub fn parse(data: &str) -> Result<Klattgrid> {
        let mut stream = TokenStream::new(tokenize(data)?, Layout::Keyed);
        read_header(&mut stream, "KlattGrid")?;
        let min_time = stream.number(&["xmin"], "klattgrid start")?;
        let max_time = stream.number(&["xmax"], "klattgrid end")?;
        let mut klattgrid = Klattgrid::new(min_time, max_time)?;

        while let Some(token) = stream.peek() {
            let name = token.key.clone().ok_or_else(|| {
                TextgridError::Parse(format!("line {}: expected a section name", token.line))
            })?;
            if !stream.flag(&[name.as_str()], "section flag")? {
                debug!("Skipping absent klattgrid section '{}'", name);
                continue;
            }
            let tier = read_section(&mut stream, name)?;
            klattgrid.add_tier(tier)?;
        }
        Ok(klattgrid)
    }

    /// Writes the long text form
    pub fn to_text(&self) -> String {
        let mut lines = vec![
            "File type = \"ooTextFile\"".to_string(),
            "Object class = \"KlattGrid\"".to_string(),
            String::new(),
            format!("xmin = {}", format_number(self.min_time)),
            format!("xmax = {}", format_number(self.max_time)),
        ];

        for tier in &self.tiers {
            lines.push(format!("{}? <exists>", tier.name()));
            lines.push(format!("xmin = {}", format_number(tier.min_time())));
            lines.push(format!("xmax = {}", format_number(tier.max_time())));
            match tier {
                KlattTier::Section { .. } => {}
                KlattTier::Point(t) => write_points(&mut lines, "", t.points()),
                KlattTier::Container(t) => {
                    for intermediate in &t.intermediates {
                        lines.push(format!("{}: size = {}", intermediate.name, intermediate.tiers.len()));
                        for (index, sub_tier) in intermediate.tiers.iter().enumerate() {
                            lines.push(format!("{} [{}]:", intermediate.name, index + 1));
                            lines.push(format!("    xmin = {}", format_number(sub_tier.min_time)));
                            lines.push(format!("    xmax = {}", format_number(sub_tier.max_time)));
                            write_points(&mut lines, "    ", sub_tier.points());
                        }
                    }
                }
            }
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Klattgrid> {
        let bytes = fs::read(path.as_ref())?;
        Self::parse(&decode_bytes(&bytes)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path.as_ref(), self.to_text())?;
        Ok(())
    }
}

fn incompatible(tier: &KlattTier, expected: &str) -> TextgridError {
    let found = match tier {
        KlattTier::Section { .. } => "section",
        KlattTier::Point(_) => "point tier",
        KlattTier::Container(_) => "container tier",
    };
    TextgridError::IncompatibleTier {
        name: tier.name().to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

fn write_points(lines: &mut Vec<String>, indent: &str, points: &[KlattPoint]) {
    lines.push(format!("{}points: size = {}", indent, points.len()));
    for (index, point) in points.iter().enumerate() {
        lines.push(format!("{}points [{}]:", indent, index + 1));
        lines.push(format!("{}    number = {}", indent, format_number(point.time)));
        lines.push(format!("{}    value = {}", indent, format_number(point.value)));
    }
}

fn read_points(stream: &mut TokenStream) -> Result<Vec<KlattPoint>> {
    let count = stream.count(&["points size"], "point count")?;
    (0..count)
        .map(|_| {
            let time = stream.number(&["number"], "point time")?;
            let value = stream.number(&["value"], "point value")?;
            Ok(KlattPoint::new(time, value))
        })
        .collect()
}

/// Reads the body of a section after its `name? <exists>` line
fn read_section(stream: &mut TokenStream, name: String) -> Result<KlattTier> {
    let min_time = stream.number(&["xmin"], "section start")?;
    let max_time = stream.number(&["xmax"], "section end")?;

    let next_key = stream.peek_key().map(str::to_string);
    match next_key.as_deref() {
        Some("points size") => {
            let points = read_points(stream)?;
            Ok(KlattTier::Point(KlattPointTier::new(name, points, min_time, max_time)?))
        }
        Some(key) if key.ends_with(" size") => {
            let mut intermediates = Vec::new();
            while let Some(key) = stream.peek_key().and_then(|k| k.strip_suffix(" size")).map(str::to_string) {
                if key == "points" {
                    break;
                }
                let count = stream.count(&[format!("{} size", key).as_str()], "sub-tier count")?;
                let mut tiers = Vec::new();
                for index in 1..=count {
                    let sub_min = stream.number(&["xmin"], "sub-tier start")?;
                    let sub_max = stream.number(&["xmax"], "sub-tier end")?;
                    let points = read_points(stream)?;
                    tiers.push(KlattPointTier::new(format!("{} {}", key, index), points, sub_min, sub_max)?);
                }
                intermediates.push(KlattIntermediateTier::new(key, tiers));
            }
            Ok(KlattTier::Container(KlattContainerTier::new(name, min_time, max_time, intermediates)?))
        }
        _ => {
            check_bounds(&name, min_time, max_time)?;
            Ok(KlattTier::Section { name, min_time, max_time })
        }
    }
}
