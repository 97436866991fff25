// ── QR login ──
//
// A company QR code carries base64 text with one `Label: value` line per
// field. Decoding yields a `LoginProfile`; the API base URL is reduced to
// scheme and host.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CoreError;

/// Identity and server decoded from a login QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginProfile {
    pub company: String,
    pub employee_code: String,
    pub user_id: String,
    pub full_name: String,
    /// The `API:` value exactly as scanned.
    pub api: String,
    /// Scheme and host of `api`; every request is made against this.
    pub base_url: Url,
}

/// Decode a scanned QR payload.
pub fn parse_qr_payload(payload: &str) -> Result<LoginProfile, CoreError> {
    let text = decode_base64(payload)?;
    parse_profile_text(&text)
}

/// Parse already-decoded payload text.
pub fn parse_profile_text(text: &str) -> Result<LoginProfile, CoreError> {
    let company = capture(text, "Company: ", is_word).ok_or_else(|| missing("Company"))?;
    let employee_code =
        capture(text, "Employee_Code: ", |c| is_word(c) || c == '-')
            .ok_or_else(|| missing("Employee_Code"))?;
    let user_id = capture(text, "User_id: ", |c| is_word(c) || matches!(c, '@' | '.' | '-'))
        .ok_or_else(|| missing("User_id"))?;
    let full_name = capture(text, "Full_Name: ", |c| c != '\n' && c != '\r')
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| missing("Full_Name"))?;
    let api = capture(text, "API: ", |c| !c.is_whitespace())
        .filter(|api| api.starts_with("https://"))
        .ok_or_else(|| missing("API"))?;

    let base_url = base_url_of(&api)?;

    Ok(LoginProfile {
        company: company.to_owned(),
        employee_code: employee_code.to_owned(),
        user_id: user_id.to_owned(),
        full_name,
        api: api.to_owned(),
        base_url,
    })
}

/// `scheme://host` of an API URL, dropping port, path and query.
pub fn base_url_of(api: &str) -> Result<Url, CoreError> {
    let parsed = Url::parse(api).map_err(|e| CoreError::InvalidQrCode {
        reason: format!("API is not a valid URL: {e}"),
    })?;
    let host = parsed.host_str().ok_or_else(|| CoreError::InvalidQrCode {
        reason: "API URL has no host".into(),
    })?;
    Url::parse(&format!("{}://{host}", parsed.scheme())).map_err(|e| CoreError::InvalidQrCode {
        reason: format!("API is not a valid URL: {e}"),
    })
}

fn decode_base64(payload: &str) -> Result<String, CoreError> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(CoreError::InvalidQrCode {
            reason: "payload is empty".into(),
        });
    }

    let bytes = [STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(compact.as_bytes()).ok())
        .ok_or_else(|| CoreError::InvalidQrCode {
            reason: "payload is not base64".into(),
        })?;

    String::from_utf8(bytes).map_err(|_| CoreError::InvalidQrCode {
        reason: "payload is not UTF-8 text".into(),
    })
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// First non-empty run of `accept` characters following `label`.
fn capture<'a>(
    text: &'a str,
    label: &str,
    accept: impl Fn(char) -> bool,
) -> Option<&'a str> {
    text.match_indices(label).find_map(|(start, _)| {
        let rest = &text[start + label.len()..];
        let end = rest.find(|c: char| !accept(c)).unwrap_or(rest.len());
        (end > 0).then(|| &rest[..end])
    })
}

fn missing(field: &str) -> CoreError {
    CoreError::InvalidQrCode {
        reason: format!("missing or malformed {field} line"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Company: Acme\nEmployee_Code: E1\nUser_id: u@x.com\nFull_Name: Jane Doe\nAPI: https://host:443/api/method/x";

    fn encode(text: &str) -> String {
        STANDARD.encode(text)
    }

    #[test]
    fn decodes_sample_payload() {
        let profile = parse_qr_payload(&encode(SAMPLE)).unwrap();
        assert_eq!(profile.company, "Acme");
        assert_eq!(profile.employee_code, "E1");
        assert_eq!(profile.user_id, "u@x.com");
        assert_eq!(profile.full_name, "Jane Doe");
        assert_eq!(profile.api, "https://host:443/api/method/x");
        assert_eq!(profile.base_url.as_str(), "https://host/");
        assert_eq!(profile.base_url.origin().ascii_serialization(), "https://host");
    }

    #[test]
    fn tolerates_whitespace_and_url_safe_alphabet() {
        let text = format!("{SAMPLE}\n");
        let wrapped = format!("  {}\n", URL_SAFE_NO_PAD.encode(text));
        let profile = parse_qr_payload(&wrapped).unwrap();
        assert_eq!(profile.company, "Acme");
    }

    #[test]
    fn full_name_is_trimmed_and_keeps_spaces() {
        let text = SAMPLE.replace("Jane Doe", "  Jane  van Doe  ");
        let profile = parse_profile_text(&text).unwrap();
        assert_eq!(profile.full_name, "Jane  van Doe");
    }

    #[test]
    fn employee_code_and_user_id_character_classes() {
        let text = SAMPLE
            .replace("E1", "HR-EMP-0001")
            .replace("u@x.com", "jane.doe-1@corp.example");
        let profile = parse_profile_text(&text).unwrap();
        assert_eq!(profile.employee_code, "HR-EMP-0001");
        assert_eq!(profile.user_id, "jane.doe-1@corp.example");
    }

    #[test]
    fn every_field_is_required() {
        for label in ["Company", "Employee_Code", "User_id", "Full_Name", "API"] {
            let text: String = SAMPLE
                .lines()
                .filter(|line| !line.starts_with(label))
                .collect::<Vec<_>>()
                .join("\n");
            let err = parse_qr_payload(&encode(&text)).unwrap_err();
            assert!(
                matches!(err, CoreError::InvalidQrCode { ref reason } if reason.contains(label)),
                "{label}: {err:?}"
            );
        }
    }

    #[test]
    fn api_must_be_https() {
        let text = SAMPLE.replace("https://host:443", "http://host");
        assert!(matches!(
            parse_profile_text(&text),
            Err(CoreError::InvalidQrCode { .. })
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            parse_qr_payload("not base64 at all!"),
            Err(CoreError::InvalidQrCode { .. })
        ));
        assert!(matches!(
            parse_qr_payload("   "),
            Err(CoreError::InvalidQrCode { .. })
        ));
    }
}
