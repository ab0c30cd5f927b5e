// File: src/corpus/textgrid.rs
//! Reader for Praat TextGrid files in the long and short text formats.
//!
//! Only the first tier is read, as a sequence of labelled intervals (or
//! points, for a text tier). For every label the parser keeps the byte range
//! of the raw quoted value so that an edit can be spliced back into the file
//! without touching any other byte.

use super::Interval;
use std::ops::Range;

const ENTRY_HEADERS: [&str; 2] = ["intervals [", "points ["];
const LABEL_KEYS: [&str; 2] = ["text =", "mark ="];

/// Parses the labels of the first tier of `source`.
pub fn parse_first_tier(source: &str) -> Result<Vec<Interval>, String> {
    if !source.contains("ooTextFile") {
        return Err("not a Praat text file".to_string());
    }
    if !source.lines().any(|l| l.trim_start().starts_with("xmin =")) {
        return parse_short_first_tier(source);
    }

    let mut intervals = Vec::new();
    let mut tiers_seen = 0usize;
    let mut in_entry = false;
    let mut offset = 0usize;

    for line in source.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        let trimmed = line.trim_start();

        if trimmed.starts_with("item [") && !trimmed.starts_with("item []") {
            tiers_seen += 1;
            if tiers_seen > 1 {
                break;
            }
            continue;
        }
        if tiers_seen != 1 {
            continue;
        }
        if ENTRY_HEADERS.iter().any(|h| trimmed.starts_with(h)) {
            in_entry = true;
            continue;
        }
        if !in_entry || !LABEL_KEYS.iter().any(|k| trimmed.starts_with(k)) {
            continue;
        }

        let quote = line
            .find('"')
            .ok_or_else(|| format!("label without opening quote near byte {line_start}"))?;
        let value_start = line_start + quote + 1;
        let value_end = closing_quote(source, value_start)
            .ok_or_else(|| format!("unterminated label starting at byte {value_start}"))?;
        intervals.push(Interval {
            span: value_start..value_end,
            text: unescape(&source[value_start..value_end]),
        });
        in_entry = false;
    }

    if tiers_seen == 0 {
        return Err("no tiers found".to_string());
    }
    Ok(intervals)
}

/// A value of the short format: a quoted string (span without the quotes)
/// or a bare word.
struct ShortToken<'a> {
    span: Range<usize>,
    raw: &'a str,
    quoted: bool,
}

fn short_tokens(source: &str) -> Result<Vec<ShortToken<'_>>, String> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b if b.is_ascii_whitespace() => i += 1,
            // Comment to end of line.
            b'!' => i = source[i..].find('\n').map_or(bytes.len(), |n| i + n),
            b'"' => {
                let start = i + 1;
                let end = closing_quote(source, start)
                    .ok_or_else(|| format!("unterminated string starting at byte {start}"))?;
                tokens.push(ShortToken { span: start..end, raw: &source[start..end], quoted: true });
                i = end + 1;
            }
            _ => {
                let end = source[i..].find(|c: char| c.is_ascii_whitespace()).map_or(bytes.len(), |n| i + n);
                tokens.push(ShortToken { span: i..end, raw: &source[i..end], quoted: false });
                i = end;
            }
        }
    }
    Ok(tokens)
}

fn short_count(token: &ShortToken<'_>, what: &str) -> Result<usize, String> {
    token.raw.parse().map_err(|_| format!("expected the {what}, found \"{}\"", token.raw))
}

/// The short format lists bare values in a fixed order: file xmin, xmax,
/// `<exists>`, tier count, then per tier its class, name, xmin, xmax, entry
/// count and the entries (`xmin xmax "text"` or `time "mark"`).
fn parse_short_first_tier(source: &str) -> Result<Vec<Interval>, String> {
    let tokens = short_tokens(source)?;
    let start = tokens
        .iter()
        .position(|t| t.quoted && t.raw == "TextGrid")
        .ok_or_else(|| "missing object class".to_string())?;
    let mut rest = tokens[start + 1..].iter();
    let mut next = |what: &str| rest.next().ok_or_else(|| format!("file ends before the {what}"));

    next("xmin")?;
    next("xmax")?;
    if next("tier flag")?.raw != "<exists>" {
        return Err("no tiers found".to_string());
    }
    if short_count(next("tier count")?, "tier count")? == 0 {
        return Err("no tiers found".to_string());
    }
    let times_per_entry = match next("tier class")?.raw {
        "IntervalTier" => 2,
        "TextTier" => 1,
        other => return Err(format!("unknown tier class \"{other}\"")),
    };
    next("tier name")?;
    next("tier xmin")?;
    next("tier xmax")?;
    let entries = short_count(next("entry count")?, "entry count")?;

    let mut intervals = Vec::with_capacity(entries);
    for _ in 0..entries {
        for _ in 0..times_per_entry {
            next("entry time")?;
        }
        let label = next("entry label")?;
        if !label.quoted {
            return Err(format!("expected a quoted label, found \"{}\"", label.raw));
        }
        intervals.push(Interval { span: label.span.clone(), text: unescape(label.raw) });
    }
    Ok(intervals)
}

/// Finds the quote closing a value that opens at `start`; `""` is an escaped quote.
fn closing_quote(source: &str, start: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut i = start;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            if bytes.get(i + 1) == Some(&b'"') {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }
    None
}

pub fn unescape(raw: &str) -> String {
    raw.replace("\"\"", "\"")
}

pub fn escape(text: &str) -> String {
    text.replace('"', "\"\"")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn long_textgrid(labels: &[&str]) -> String {
        let mut out = String::from(
            "File type = \"ooTextFile\"\nObject class = \"TextGrid\"\n\nxmin = 0 \nxmax = 10 \ntiers? <exists> \nsize = 2 \nitem []: \n",
        );
        out.push_str(&format!(
            "    item [1]:\n        class = \"IntervalTier\" \n        name = \"words\" \n        xmin = 0 \n        xmax = 10 \n        intervals: size = {} \n",
            labels.len()
        ));
        for (i, label) in labels.iter().enumerate() {
            out.push_str(&format!(
                "        intervals [{}]:\n            xmin = {} \n            xmax = {} \n            text = \"{}\" \n",
                i + 1,
                i,
                i + 1,
                label
            ));
        }
        out.push_str(
            "    item [2]:\n        class = \"IntervalTier\" \n        name = \"other\" \n        xmin = 0 \n        xmax = 10 \n        intervals: size = 1 \n        intervals [1]:\n            xmin = 0 \n            xmax = 10 \n            text = \"second tier\" \n",
        );
        out
    }

    #[test]
    fn reads_only_the_first_tier() {
        let src = long_textgrid(&["this is an exampel sentence", "", "other words"]);
        let intervals = parse_first_tier(&src).unwrap();
        let texts: Vec<&str> = intervals.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["this is an exampel sentence", "", "other words"]);
        assert_eq!(&src[intervals[0].span.clone()], "this is an exampel sentence");
    }

    #[test]
    fn doubled_quotes_are_unescaped() {
        let src = long_textgrid(&["he said \"\"hello\"\" twice"]);
        let intervals = parse_first_tier(&src).unwrap();
        assert_eq!(intervals[0].text, "he said \"hello\" twice");
    }

    #[test]
    fn rejects_non_praat_text() {
        assert!(parse_first_tier("just some words").is_err());
    }

    #[test]
    fn short_format_first_tier_is_read() {
        let src = "File type = \"ooTextFile\"\nObject class = \"TextGrid\"\n\n0\n2\n<exists>\n2\n\"IntervalTier\"\n\"words\"\n0\n2\n2\n0\n1\n\"an exampel\"\n1\n2\n\"say \"\"hi\"\"\"\n\"TextTier\"\n\"events\"\n0\n2\n1\n1.5\n\"ignored\"\n";
        let intervals = parse_first_tier(src).unwrap();
        let texts: Vec<&str> = intervals.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["an exampel", "say \"hi\""]);
        assert_eq!(&src[intervals[0].span.clone()], "an exampel");
    }

    #[test]
    fn truncated_short_format_is_an_error() {
        let src = "File type = \"ooTextFile\"\nObject class = \"TextGrid\"\n0\n2\n<exists>\n1\n\"IntervalTier\"\n\"words\"\n0\n2\n3\n0\n1\n\"only one\"\n";
        assert!(parse_first_tier(src).is_err());
    }

    #[test]
    fn unterminated_label_is_an_error() {
        let src = "File type = \"ooTextFile\"\nitem [1]:\n  intervals [1]:\n    text = \"broken\n";
        assert!(parse_first_tier(src).is_err());
    }
}
