use std::path::Path;

use tracing::debug;

use crate::domain::{DomainError, PageText};

/// Reads the extracted pages of one document.
///
/// `.json` files hold `[{"page_number": 1, "text": "...", "confidence": 0.93}]`.
/// Any other file is read as plain text with pages separated by form feeds and
/// numbered from 1.
pub fn load_pages(path: &Path) -> Result<Vec<PageText>, DomainError> {
    let content = std::fs::read_to_string(path)?;

    let pages = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => parse_json_pages(&content)?,
        _ => split_form_feeds(&content),
    };

    debug!("Loaded {} pages from {}", pages.len(), path.display());
    Ok(pages)
}

pub fn parse_json_pages(content: &str) -> Result<Vec<PageText>, DomainError> {
    let pages: Vec<PageText> = serde_json::from_str(content)
        .map_err(|e| DomainError::invalid_input(format!("Invalid page JSON: {}", e)))?;

    if let Some(page) = pages
        .iter()
        .find(|p| p.confidence.is_some_and(|c| !(0.0..=1.0).contains(&c)))
    {
        return Err(DomainError::invalid_input(format!(
            "Page {} has a confidence outside [0, 1]",
            page.page_number
        )));
    }
    Ok(pages)
}

pub fn split_form_feeds(content: &str) -> Vec<PageText> {
    content
        .split('\u{000C}')
        .enumerate()
        .map(|(i, text)| PageText::new(i as u32 + 1, text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn form_feeds_separate_pages() {
        let pages = split_form_feeds("first page\u{000C}second page\u{000C}");
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[1].page_number, 2);
        assert_eq!(pages[1].text, "second page");
        assert!(pages[2].text.is_empty());
    }

    #[test]
    fn json_pages_carry_confidence() {
        let pages = parse_json_pages(
            r#"[{"page_number": 4, "text": "Anno 1582", "confidence": 0.72},
                {"page_number": 5, "text": "folio"}]"#,
        )
        .unwrap();
        assert_eq!(pages[0].confidence, Some(0.72));
        assert_eq!(pages[1].confidence, None);
    }

    #[test]
    fn rejects_confidence_out_of_range() {
        let err = parse_json_pages(r#"[{"page_number": 1, "text": "x", "confidence": 7.0}]"#)
            .unwrap_err();
        assert!(err.to_string().contains("Page 1"));
    }

    #[test]
    fn loads_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"[{{"page_number": 1, "text": "hello"}}]"#).unwrap();

        let pages = load_pages(&path).unwrap();
        assert_eq!(pages, vec![PageText::new(1, "hello")]);
    }
}
