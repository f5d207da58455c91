use chardetng::EncodingDetector;
use encoding_rs::Encoding;

use crate::session::SessionError;

const META_PRESCAN_BYTES: usize = 1024;

/// Decode a page body into UTF-8 using: BOM -> Content-Type charset ->
/// `<meta charset>` in the first kilobyte -> chardetng fallback with a `.ru`
/// TLD hint.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> Result<String, SessionError> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    if let Some(enc) = content_type
        .and_then(charset_from_content_type)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return decode_with(bytes, enc);
    }

    if let Some(enc) = charset_from_meta(bytes).and_then(|label| Encoding::for_label(label.as_bytes())) {
        return decode_with(bytes, enc);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let enc = detector.guess(Some(b"ru".as_slice()), true);
    decode_with(bytes, enc)
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']).to_string())
    })
}

fn charset_from_meta(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(META_PRESCAN_BYTES)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    let start = head.find("charset=")? + "charset=".len();
    let label: String = head[start..]
        .trim_start_matches(['"', '\''])
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect();
    (!label.is_empty()).then_some(label)
}

fn decode_with(bytes: &[u8], enc: &'static Encoding) -> Result<String, SessionError> {
    let (text, _, had_errors) = enc.decode(bytes);
    if had_errors {
        return Err(SessionError::Network(format!(
            "body is not valid {}",
            enc.name()
        )));
    }
    Ok(text.into_owned())
}
