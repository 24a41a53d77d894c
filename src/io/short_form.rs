/*!
 * Praat's short text form: the same values as the long form, one per line,
 * without field names.
 */

use super::RawTextgrid;
use super::lexer::{self, Layout, quote};
use crate::errors::Result;
use crate::textgrid::{Textgrid, Tier};
use crate::timing::format_number;

pub(crate) fn parse(data: &str) -> Result<RawTextgrid> {
    lexer::read_textgrid(data, Some(Layout::Positional)).map(|(raw, _)| raw)
}

pub fn format(textgrid: &Textgrid) -> Result<String> {
    let mut lines: Vec<String> = vec![
        "File type = \"ooTextFile\"".to_string(),
        "Object class = \"TextGrid\"".to_string(),
        String::new(),
        format_number(textgrid.min_time()),
        format_number(textgrid.max_time()),
        "<exists>".to_string(),
        textgrid.len().to_string(),
    ];

    for tier in textgrid.tiers() {
        lines.push(quote(tier.kind().class_name()));
        lines.push(quote(tier.name()));
        lines.push(format_number(tier.min_time()));
        lines.push(format_number(tier.max_time()));
        lines.push(tier.len().to_string());
        match tier {
            Tier::Interval(t) => {
                for entry in t.entries() {
                    lines.push(format_number(entry.start));
                    lines.push(format_number(entry.end));
                    lines.push(quote(&entry.label));
                }
            }
            Tier::Point(t) => {
                for point in t.entries() {
                    lines.push(format_number(point.time));
                    lines.push(quote(&point.label));
                }
            }
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    Ok(out)
}
