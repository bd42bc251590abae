// Coercion of heterogeneous upstream cells into clean numeric values.

use serde_json::Value;

use crate::category::{RawRow, ScoringProfile};

/// A raw row projected onto a scoring profile with every cell coerced.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedRow {
    pub name: String,
    pub team: String,
    pub volume: Option<f64>,
    /// One entry per profile category, in profile order.
    pub values: Vec<Option<f64>>,
}

/// Coerce one cell to a finite float, or `None` if it holds no usable number.
///
/// Numbers pass through, strings are parsed with [`sanitize_text`], and every
/// other JSON shape (null, bool, array, object) is treated as missing.
pub fn sanitize_value(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => sanitize_text(s),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Parse the first numeric token of a formatted string such as `"$3.50"`,
/// `"12.5%"`, `" 1,204 "` or `"1.2e3"`. Returns `None` when no token is present.
///
/// An `e`/`E` counts as an exponent only when digits (optionally signed)
/// follow it; otherwise the token ends there.
pub fn sanitize_text(text: &str) -> Option<f64> {
    let chars: Vec<char> = text.chars().collect();
    let start = token_start(&chars)?;

    let mut token = String::new();
    let mut seen_dot = false;
    let mut i = start;
    if chars[i] == '-' || chars[i] == '+' {
        token.push(chars[i]);
        i += 1;
    }
    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_digit() {
            token.push(c);
        } else if c == '.' && !seen_dot {
            seen_dot = true;
            token.push(c);
        } else if c == ',' && next_is_digit(&chars, i) && !seen_dot {
            // thousands separator
        } else if (c == 'e' || c == 'E')
            && token.ends_with(|d: char| d.is_ascii_digit() || d == '.')
        {
            if let Some(exponent) = exponent_at(&chars, i) {
                token.push_str(&exponent);
            }
            break;
        } else {
            break;
        }
        i += 1;
    }

    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Index where the first numeric token begins, including a leading sign.
fn token_start(chars: &[char]) -> Option<usize> {
    for (i, &c) in chars.iter().enumerate() {
        let starts_number = c.is_ascii_digit() || (c == '.' && next_is_digit(chars, i));
        if !starts_number {
            continue;
        }
        if i > 0 && chars[i - 1] == '-' {
            return Some(i - 1);
        }
        return Some(i);
    }
    None
}

/// `e[+-]digits` starting at `i`, if digits follow the marker.
fn exponent_at(chars: &[char], i: usize) -> Option<String> {
    let mut j = i + 1;
    let mut exponent = String::from("e");
    if let Some(&sign) = chars.get(j).filter(|c| **c == '-' || **c == '+') {
        exponent.push(sign);
        j += 1;
    }
    let digits: String = chars[j..]
        .iter()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    exponent.push_str(&digits);
    Some(exponent)
}

fn next_is_digit(chars: &[char], i: usize) -> bool {
    chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())
}

/// Project raw rows onto `profile`, sanitizing the volume column and every
/// category column. Absent columns are missing values.
pub fn sanitize_rows(rows: &[RawRow], profile: &ScoringProfile) -> Vec<SanitizedRow> {
    rows.iter()
        .map(|row| SanitizedRow {
            name: row.name.clone(),
            team: row.team.clone(),
            volume: row.get(&profile.volume_column).and_then(sanitize_value),
            values: profile
                .categories
                .iter()
                .map(|c| row.get(&c.column).and_then(sanitize_value))
                .collect(),
        })
        .collect()
}
