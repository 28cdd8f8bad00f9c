use crate::extract::ImageItem;
use crate::url::resolve_reference;
use scraper::{Html, Selector};
use url::Url;

/// Extracts every `<img src>` reference as an absolute URL with metadata
///
/// Order and duplicates follow the document. `alt` and `title` are kept
/// when non-empty; `width` and `height` only when they are plain integers.
pub fn extract_images(document: &Html, base: &Url) -> Vec<ImageItem> {
    let mut images = Vec::new();

    let Ok(img_selector) = Selector::parse("img[src]") else {
        return images;
    };

    for element in document.select(&img_selector) {
        let attrs = element.value();
        let Some(src) = attrs.attr("src") else {
            continue;
        };

        let Some(absolute) = resolve_reference(base, src) else {
            continue;
        };

        let text_attr = |name: &str| {
            attrs
                .attr(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let dimension = |name: &str| attrs.attr(name).and_then(|v| v.trim().parse::<u32>().ok());

        images.push(ImageItem {
            url: absolute.to_string(),
            alt: text_attr("alt"),
            title: text_attr("title"),
            width: dimension("width"),
            height: dimension("height"),
        });
    }

    tracing::debug!("Found {} images on {}", images.len(), base);
    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::parse_html;

    fn base_url() -> Url {
        Url::parse("https://example.com/gallery/").unwrap()
    }

    #[test]
    fn test_relative_sources_resolved() {
        let html = r#"
            <img src="cat.jpg">
            <img src="/static/dog.png">
            <img src="//cdn.example.net/bird.gif">
        "#;
        let urls: Vec<_> = extract_images(&parse_html(html), &base_url())
            .into_iter()
            .map(|i| i.url)
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/gallery/cat.jpg",
                "https://example.com/static/dog.png",
                "https://cdn.example.net/bird.gif"
            ]
        );
    }

    #[test]
    fn test_metadata_captured() {
        let html = r#"<img src="a.png" alt=" A cat " title="Cat" width="640" height="auto">"#;
        let images = extract_images(&parse_html(html), &base_url());
        assert_eq!(
            images,
            vec![ImageItem {
                url: "https://example.com/gallery/a.png".to_string(),
                alt: Some("A cat".to_string()),
                title: Some("Cat".to_string()),
                width: Some(640),
                height: None,
            }]
        );
    }

    #[test]
    fn test_img_without_src_ignored() {
        let html = r#"<img alt="placeholder"><img data-src="lazy.png">"#;
        assert!(extract_images(&parse_html(html), &base_url()).is_empty());
    }

    #[test]
    fn test_duplicate_images_preserved() {
        let html = r#"<img src="a.png"><img src="b.png"><img src="a.png">"#;
        assert_eq!(extract_images(&parse_html(html), &base_url()).len(), 3);
    }

    #[test]
    fn test_data_uri_kept_as_absolute() {
        let html = r#"<img src="data:image/gif;base64,R0lGOD">"#;
        let images = extract_images(&parse_html(html), &base_url());
        assert_eq!(images.len(), 1);
        assert!(images[0].url.starts_with("data:image/gif"));
    }
}
