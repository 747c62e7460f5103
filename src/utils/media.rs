//! Delivery URL rewriting for CDN-hosted images.

static UPLOAD_SEGMENT: &str = "/upload/";

/// Insert delivery transforms (auto format, auto quality, width cap) right
/// after the upload segment. URLs that already carry transforms, or that are
/// not CDN delivery URLs at all, pass through untouched.
pub fn with_delivery_transforms(url: &str, max_width: u32) -> String {
    let Some(idx) = url.find(UPLOAD_SEGMENT) else {
        return url.to_string();
    };

    let rest = &url[idx + UPLOAD_SEGMENT.len()..];
    if rest.starts_with("f_auto") || rest.starts_with("q_auto") || rest.starts_with("w_") {
        return url.to_string();
    }

    format!(
        "{}{}f_auto,q_auto,w_{},c_limit/{}",
        &url[..idx],
        UPLOAD_SEGMENT,
        max_width,
        rest
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn inserts_transforms_after_upload_segment() {
        let url = "https://res.example.com/demo/image/upload/v123/foto.jpg";
        assert_eq!(
            with_delivery_transforms(url, 1600),
            "https://res.example.com/demo/image/upload/f_auto,q_auto,w_1600,c_limit/v123/foto.jpg"
        );
    }

    #[test]
    fn leaves_transformed_urls_alone() {
        let url = "https://res.example.com/demo/image/upload/f_auto,q_auto,w_800,c_limit/v123/foto.jpg";
        assert_eq!(with_delivery_transforms(url, 1600), url);
    }

    #[test]
    fn leaves_foreign_urls_alone() {
        let url = "https://example.com/images/foto.jpg";
        assert_eq!(with_delivery_transforms(url, 1600), url);
    }
}
