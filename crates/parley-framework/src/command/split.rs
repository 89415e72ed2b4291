//! Positional argument splitting.

/// Returns the whitespace-delimited fields following the command token.
///
/// The first field is the token that selected the command and is skipped
/// even when other text is glued to it (`/weatherParis` yields no fields).
pub fn arguments(text: &str) -> Vec<&str> {
    text.split_whitespace().skip(1).collect()
}

/// Distributes `fields` over `count` parameters.
///
/// Every parameter but the last receives exactly one field; the last one
/// receives the remaining fields joined with single spaces, so trailing
/// free-text parameters may contain spaces. Parameters beyond the available
/// fields receive nothing, hence the result may be shorter than `count`.
pub fn assign_fields(fields: &[&str], count: usize) -> Vec<String> {
    if count == 0 || fields.is_empty() {
        return Vec::new();
    }

    let head = fields.len().min(count - 1);
    let mut assigned: Vec<String> = fields[..head].iter().map(|f| f.to_string()).collect();
    if fields.len() > head {
        assigned.push(fields[head..].join(" "));
    }
    assigned
}
