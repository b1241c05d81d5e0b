//! URL redaction for logs.

use url::Url;

/// Mask query parameter values: `auth` becomes `***`, any other non-blank
/// value `<redacted>`, blank values leave the bare key. Unparseable input
/// is returned unchanged.
pub fn redact_url(raw: &str) -> String {
    let Ok(mut parsed) = Url::parse(raw) else {
        return raw.to_string();
    };
    let masked: Vec<String> = parsed
        .query_pairs()
        .map(|(key, value)| {
            if key.eq_ignore_ascii_case("auth") {
                format!("{key}=***")
            } else if value.is_empty() {
                key.into_owned()
            } else {
                format!("{key}=<redacted>")
            }
        })
        .collect();
    let fragment = parsed.fragment().map(str::to_string);
    parsed.set_fragment(None);
    parsed.set_query(None);

    // Built by hand so the placeholders are not percent-encoded.
    let mut out = String::from(parsed.as_str());
    if !masked.is_empty() {
        out.push('?');
        out.push_str(&masked.join("&"));
    }
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(&fragment);
    }
    out
}
