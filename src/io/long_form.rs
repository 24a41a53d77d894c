/*!
 * Praat's long text form: every value on its own line behind a field name,
 * tiers and entries introduced by `item [n]:` / `intervals [n]:` headers.
 */

use super::RawTextgrid;
use super::lexer::{self, Layout, quote};
use crate::errors::Result;
use crate::textgrid::{Textgrid, Tier};
use crate::timing::format_number;

const TAB: &str = "    ";

pub(crate) fn parse(data: &str) -> Result<RawTextgrid> {
    lexer::read_textgrid(data, Some(Layout::Keyed)).map(|(raw, _)| raw)
}

/// Writes a prepared document; field lines keep Praat's trailing space
pub fn format(textgrid: &Textgrid) -> Result<String> {
    let mut out = String::new();
    out.push_str("File type = \"ooTextFile\"\n");
    out.push_str("Object class = \"TextGrid\"\n\n");
    out.push_str(&format!("xmin = {} \n", format_number(textgrid.min_time())));
    out.push_str(&format!("xmax = {} \n", format_number(textgrid.max_time())));
    out.push_str("tiers? <exists> \n");
    out.push_str(&format!("size = {} \n", textgrid.len()));
    out.push_str("item []: \n");

    for (index, tier) in textgrid.tiers().enumerate() {
        out.push_str(&format!("{}item [{}]:\n", TAB, index + 1));
        out.push_str(&format!("{}class = \"{}\" \n", TAB.repeat(2), tier.kind().class_name()));
        out.push_str(&format!("{}name = {} \n", TAB.repeat(2), quote(tier.name())));
        out.push_str(&format!("{}xmin = {} \n", TAB.repeat(2), format_number(tier.min_time())));
        out.push_str(&format!("{}xmax = {} \n", TAB.repeat(2), format_number(tier.max_time())));

        match tier {
            Tier::Interval(t) => {
                out.push_str(&format!("{}intervals: size = {} \n", TAB.repeat(2), t.len()));
                for (number, entry) in t.entries().iter().enumerate() {
                    out.push_str(&format!("{}intervals [{}]:\n", TAB.repeat(2), number + 1));
                    out.push_str(&format!("{}xmin = {} \n", TAB.repeat(3), format_number(entry.start)));
                    out.push_str(&format!("{}xmax = {} \n", TAB.repeat(3), format_number(entry.end)));
                    out.push_str(&format!("{}text = {} \n", TAB.repeat(3), quote(&entry.label)));
                }
            }
            Tier::Point(t) => {
                out.push_str(&format!("{}points: size = {} \n", TAB.repeat(2), t.len()));
                for (number, point) in t.entries().iter().enumerate() {
                    out.push_str(&format!("{}points [{}]:\n", TAB.repeat(2), number + 1));
                    out.push_str(&format!("{}number = {} \n", TAB.repeat(3), format_number(point.time)));
                    out.push_str(&format!("{}mark = {} \n", TAB.repeat(3), quote(&point.label)));
                }
            }
        }
    }
    Ok(out)
}
