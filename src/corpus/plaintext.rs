// File: src/corpus/plaintext.rs
use super::Interval;

/// Every line is one interval; the line terminator is not part of the span.
pub fn parse_lines(source: &str) -> Vec<Interval> {
    let mut intervals = Vec::new();
    let mut offset = 0usize;
    for line in source.split_inclusive('\n') {
        let body = line.trim_end_matches(['\n', '\r']);
        intervals.push(Interval {
            span: offset..offset + body.len(),
            text: body.to_string(),
        });
        offset += line.len();
    }
    intervals
}
