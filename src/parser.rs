use scraper::{Html, Selector};
use anyhow::Result;

/// 預設目標：`<img class="article-image" src="...">`
pub const DEFAULT_IMAGE_SELECTOR: &str = "img.article-image";
pub const DEFAULT_IMAGE_ATTR: &str = "src";

/// Parser Trait - 不同網站實作不同的 Parser
pub trait PageParser: Send + Sync {
    /// 找出頁面中第一張目標圖片的 URL（原樣回傳，不做正規化）
    fn find_image(&self, html: &str) -> Option<String>;
}

/// 以 CSS selector 定位圖片元素的 Parser
pub struct ImageTagParser {
    image_selector: Selector,
    image_attr: String,
}

impl ImageTagParser {
    pub fn new(image_selector: &str, image_attr: &str) -> Result<Self> {
        Ok(Self {
            image_selector: Selector::parse(image_selector)
                .map_err(|e| anyhow::anyhow!("選擇器解析失敗 ({}): {:?}", image_selector, e))?,
            image_attr: image_attr.to_string(),
        })
    }
}

impl PageParser for ImageTagParser {
    fn find_image(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);

        document
            .select(&self.image_selector)
            .next()
            .and_then(|elem| elem.value().attr(&self.image_attr))
            .map(|s| s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article_parser() -> ImageTagParser {
        ImageTagParser::new(DEFAULT_IMAGE_SELECTOR, DEFAULT_IMAGE_ATTR).unwrap()
    }

    #[test]
    fn test_article_image_parser() {
        let html = r#"
        <div class="article">
            <img class="avatar" src="/avatars/1.png" />
            <img class="article-image" src="https://cdn.example.com/a/b/cat.jpg?w=600" />
            <img class="article-image" src="https://cdn.example.com/a/b/dog.jpg" />
        </div>
        "#;

        let parser = article_parser();
        assert_eq!(
            parser.find_image(html).as_deref(),
            Some("https://cdn.example.com/a/b/cat.jpg?w=600")
        );
    }

    #[test]
    fn test_class_among_others_matches() {
        let html = r#"<img class="lazy article-image big" src="/img/x.gif">"#;

        let parser = article_parser();
        assert_eq!(parser.find_image(html).as_deref(), Some("/img/x.gif"));
    }

    #[test]
    fn test_no_matching_element() {
        let html = r#"<div class="article-image"><img src="/not-it.jpg"></div>"#;

        let parser = article_parser();
        assert!(parser.find_image(html).is_none());
    }

    #[test]
    fn test_missing_attribute() {
        let html = r#"<img class="article-image" data-src="/lazy.jpg">"#;

        let parser = article_parser();
        assert!(parser.find_image(html).is_none());

        let lazy = ImageTagParser::new("img.article-image", "data-src").unwrap();
        assert_eq!(lazy.find_image(html).as_deref(), Some("/lazy.jpg"));
    }

    #[test]
    fn test_invalid_selector() {
        assert!(ImageTagParser::new("img[", "src").is_err());
    }
}
