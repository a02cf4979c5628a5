use time::OffsetDateTime;

use crate::transform::OutputPoint;

/// Escape measurement/tag keys/tag values/field keys for ILP.
///
/// ILP requires escaping commas, spaces and equals with a backslash.
fn ilp_escape_ident(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            ',' | ' ' | '=' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
}

fn push_tag(out: &mut String, key: &str, value: &str) {
    out.push(',');
    ilp_escape_ident(key, out);
    out.push('=');
    ilp_escape_ident(value, out);
}

fn push_field_f64(out: &mut String, first: &mut bool, key: &str, value: f64) {
    if *first {
        *first = false;
    } else {
        out.push(',');
    }

    ilp_escape_ident(key, out);
    out.push('=');
    out.push_str(&value.to_string());
}

fn ts_to_unix_nanos(ts: OffsetDateTime) -> i128 {
    ts.unix_timestamp_nanos()
}

pub fn write_line(point: &OutputPoint, out: &mut String) {
    ilp_escape_ident(point.measurement.as_str(), out);

    for (key, value) in &point.tags {
        push_tag(out, key, value);
    }

    out.push(' ');
    let mut first = true;
    for (key, value) in &point.fields {
        push_field_f64(out, &mut first, key, *value);
    }

    // timestamp (nanos)
    out.push(' ');
    out.push_str(&ts_to_unix_nanos(point.ts).to_string());
}

/// One newline-terminated line per point.
pub fn encode_batch(points: &[OutputPoint]) -> String {
    // Heuristic capacity: ~96 bytes per line.
    let mut s = String::with_capacity(points.len().saturating_mul(96));
    for point in points {
        write_line(point, &mut s);
        s.push('\n');
    }
    s
}
