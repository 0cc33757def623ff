use base64::{engine::general_purpose, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_IMAGE_MIME: &str = "image/png";

static DATA_URI_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:image/(png|jpeg|jpg|webp);base64,").expect("valid data uri regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    if data.len() > 12 {
        let ftyp = &data[4..12];
        if ftyp.starts_with(b"ftyp") {
            let brand = &ftyp[4..8];
            if brand == b"heic" || brand == b"heif" || brand == b"hevc" {
                return Some("image/heic".to_string());
            }
        }
    }

    infer::get(data).map(|kind| kind.mime_type().to_string())
}

pub fn normalize_image_mime_type(mime_type: &str) -> String {
    let lowered = mime_type.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "image/jpg" => "image/jpeg".to_string(),
        _ => lowered,
    }
}

/// Splits a `data:image/<fmt>;base64,` header off `input`. Only png, jpeg,
/// jpg and webp headers are recognized; anything else is left untouched.
pub fn strip_data_uri_header(input: &str) -> (Option<String>, &str) {
    match DATA_URI_HEADER_RE.captures(input) {
        Some(captures) => {
            let header_len = captures.get(0).map(|m| m.end()).unwrap_or(0);
            let mime = captures
                .get(1)
                .map(|m| normalize_image_mime_type(&format!("image/{}", m.as_str())));
            (mime, &input[header_len..])
        }
        None => (None, input),
    }
}

/// Turns caller-supplied image data (bare base64 or a data URI) into the
/// inline part sent to the provider. Returns `None` when nothing is left
/// after stripping the header.
pub fn prepare_inline_image(input: &str) -> Option<InlineImage> {
    let (header_mime, payload) = strip_data_uri_header(input.trim());
    let payload = payload.trim();
    if payload.is_empty() {
        return None;
    }

    let mime_type = header_mime
        .or_else(|| {
            general_purpose::STANDARD
                .decode(payload)
                .ok()
                .and_then(|bytes| detect_mime_type(&bytes))
                .filter(|mime| mime.starts_with("image/"))
                .map(|mime| normalize_image_mime_type(&mime))
        })
        .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());

    Some(InlineImage {
        mime_type,
        data: payload.to_string(),
    })
}

pub fn to_data_uri(mime_type: &str, base64_data: &str) -> String {
    format!("data:{};base64,{}", mime_type, base64_data)
}

pub fn encode_data_uri(bytes: &[u8]) -> String {
    let mime_type = detect_mime_type(bytes)
        .filter(|mime| mime.starts_with("image/"))
        .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
    to_data_uri(&mime_type, &general_purpose::STANDARD.encode(bytes))
}

/// Decodes the payload of a data URI (or bare base64) back into bytes.
pub fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    let payload = match uri.split_once(";base64,") {
        Some((header, payload)) if header.starts_with("data:") => payload,
        _ => uri,
    };
    general_purpose::STANDARD.decode(payload.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[
        0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, b'I', b'H', b'D', b'R',
    ];

    #[test]
    fn strips_supported_headers() {
        let (mime, rest) = strip_data_uri_header("data:image/jpg;base64,QUJD");
        assert_eq!(mime.as_deref(), Some("image/jpeg"));
        assert_eq!(rest, "QUJD");

        let (mime, rest) = strip_data_uri_header("data:image/webp;base64,QUJD");
        assert_eq!(mime.as_deref(), Some("image/webp"));
        assert_eq!(rest, "QUJD");
    }

    #[test]
    fn leaves_unknown_headers_alone() {
        let input = "data:image/gif;base64,R0lG";
        let (mime, rest) = strip_data_uri_header(input);
        assert!(mime.is_none());
        assert_eq!(rest, input);
    }

    #[test]
    fn sniffs_mime_for_bare_base64() {
        let encoded = general_purpose::STANDARD.encode(PNG_MAGIC);
        let image = prepare_inline_image(&encoded).expect("image");
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, encoded);
    }

    #[test]
    fn falls_back_to_png_for_unrecognized_payloads() {
        let image = prepare_inline_image("not-really-base64").expect("image");
        assert_eq!(image.mime_type, DEFAULT_IMAGE_MIME);
    }

    #[test]
    fn rejects_header_without_payload() {
        assert!(prepare_inline_image("data:image/png;base64,").is_none());
        assert!(prepare_inline_image("   ").is_none());
    }

    #[test]
    fn data_uri_helpers_agree() {
        let uri = encode_data_uri(PNG_MAGIC);
        assert!(uri.starts_with("data:image/png;base64,"));
        assert_eq!(decode_data_uri(&uri).as_deref(), Some(PNG_MAGIC));
    }
}
