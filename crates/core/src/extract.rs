use thiserror::Error;

/// Literal sentinel opening the extractable document in model output.
pub const BEGIN_MARKER: &str = "<!--BEGIN_GAME_HTML-->";
/// Literal sentinel closing the extractable document in model output.
pub const END_MARKER: &str = "<!--END_GAME_HTML-->";

/// Failures produced while validating raw model output.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no HTML markers found in model output")]
    NoMarkersFound,
    #[error("empty HTML content between markers")]
    EmptyDocument,
    #[error("invalid HTML structure: missing <html> root tags")]
    InvalidStructure,
}

/// A validated, self-contained HTML document. Constructed only by
/// [`extract`]; never mutated afterwards.
#[derive(Debug, PartialEq, Eq)]
pub struct GameDocument {
    html: String,
}

impl GameDocument {
    pub fn html(&self) -> &str {
        &self.html
    }
}

/// Extracts the marker-bounded document from raw model output.
///
/// Markers are matched literally and case-sensitively: the first begin
/// marker, then the nearest end marker after it. Text outside the bounded
/// region is ignored. The extractor checks structure only; it never
/// executes or lints the document.
///
/// # Examples
///
/// ```
/// use gamesmith_core::extract::extract;
///
/// let raw = "noise <!--BEGIN_GAME_HTML--> <html>...</html> <!--END_GAME_HTML--> trailer";
/// let doc = extract(raw).expect("valid region");
/// assert_eq!(doc.html(), "<html>...</html>");
/// ```
pub fn extract(raw: &str) -> Result<GameDocument, ExtractionError> {
    let begin = raw.find(BEGIN_MARKER).ok_or(ExtractionError::NoMarkersFound)?;
    let body_start = begin + BEGIN_MARKER.len();
    let end = raw[body_start..]
        .find(END_MARKER)
        .ok_or(ExtractionError::NoMarkersFound)?;

    let html = raw[body_start..body_start + end].trim();
    if html.is_empty() {
        return Err(ExtractionError::EmptyDocument);
    }
    if !html.contains("<html") || !html.contains("</html>") {
        return Err(ExtractionError::InvalidStructure);
    }

    Ok(GameDocument {
        html: html.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_strips_surrounding_noise() {
        let raw = format!("noise {BEGIN_MARKER} <html>...</html> {END_MARKER} trailer");
        let doc = extract(&raw).expect("valid region");
        assert_eq!(doc.html(), "<html>...</html>");
    }

    #[test]
    fn extraction_is_deterministic() {
        let raw = format!("{BEGIN_MARKER}<html>a</html>{END_MARKER}");
        let first = extract(&raw).expect("first");
        let second = extract(&raw).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn missing_begin_marker_is_rejected() {
        let raw = format!("<html>a</html>{END_MARKER}");
        assert!(matches!(
            extract(&raw),
            Err(ExtractionError::NoMarkersFound)
        ));
    }

    #[test]
    fn missing_end_marker_is_rejected() {
        let raw = format!("{BEGIN_MARKER}<html>a</html>");
        assert!(matches!(
            extract(&raw),
            Err(ExtractionError::NoMarkersFound)
        ));
    }

    #[test]
    fn end_marker_before_begin_marker_is_rejected() {
        let raw = format!("{END_MARKER}<html>a</html>{BEGIN_MARKER}");
        assert!(matches!(
            extract(&raw),
            Err(ExtractionError::NoMarkersFound)
        ));
    }

    #[test]
    fn lowercase_markers_are_not_matched() {
        let raw = "<!--begin_game_html--><html>a</html><!--end_game_html-->";
        assert!(matches!(
            extract(raw),
            Err(ExtractionError::NoMarkersFound)
        ));
    }

    #[test]
    fn whitespace_only_region_is_rejected() {
        let raw = format!("{BEGIN_MARKER} \n\t {END_MARKER}");
        assert!(matches!(
            extract(&raw),
            Err(ExtractionError::EmptyDocument)
        ));
    }

    #[test]
    fn region_without_closing_root_tag_is_rejected() {
        let raw = format!("{BEGIN_MARKER}<html><body>game</body>{END_MARKER}");
        assert!(matches!(
            extract(&raw),
            Err(ExtractionError::InvalidStructure)
        ));
    }

    #[test]
    fn first_bounded_region_wins() {
        let raw = format!(
            "{BEGIN_MARKER}<html>first</html>{END_MARKER} {BEGIN_MARKER}<html>second</html>{END_MARKER}"
        );
        let doc = extract(&raw).expect("valid region");
        assert_eq!(doc.html(), "<html>first</html>");
    }
}
