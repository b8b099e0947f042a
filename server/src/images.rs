use base64::Engine;

/// An image decoded from a `data:image/<ext>;base64,<payload>` URL.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Parse a base64 data URL as sent by clients for recipe images and avatars.
pub fn parse_data_url(input: &str) -> Result<DecodedImage, String> {
    let rest = input
        .strip_prefix("data:")
        .ok_or_else(|| "Image must be a base64 data URL".to_string())?;

    let (content_type, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| "Image must be base64-encoded".to_string())?;

    if !content_type.starts_with("image/") {
        return Err(format!("Unsupported content type: {}", content_type));
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| "Invalid base64 image payload".to_string())?;

    if bytes.is_empty() {
        return Err("Image payload is empty".to_string());
    }

    Ok(DecodedImage {
        content_type: content_type.to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn test_parse_valid_png() {
        let input = format!("data:image/png;base64,{}", PNG_B64);
        let image = parse_data_url(&input).unwrap();
        assert_eq!(image.content_type, "image/png");
        assert!(!image.bytes.is_empty());
    }

    #[test]
    fn test_parse_rejects_plain_string() {
        assert!(parse_data_url("not a data url").is_err());
    }

    #[test]
    fn test_parse_rejects_missing_base64_marker() {
        assert!(parse_data_url("data:image/png,rawdata").is_err());
    }

    #[test]
    fn test_parse_rejects_non_image() {
        let input = format!("data:text/plain;base64,{}", PNG_B64);
        assert!(parse_data_url(&input).is_err());
    }

    #[test]
    fn test_parse_rejects_invalid_base64() {
        assert!(parse_data_url("data:image/png;base64,!!!").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_payload() {
        assert!(parse_data_url("data:image/png;base64,").is_err());
    }
}
