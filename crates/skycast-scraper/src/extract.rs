use crate::document::Document;
use crate::error::FieldError;

/// Returns the trimmed text of the first element matching `selector`.
///
/// An element that exists but has no text yields `Ok("")`; only a selector
/// that matches nothing yields [`FieldError::Absent`].
///
/// # Errors
///
/// - [`FieldError::Absent`] — no element matched.
/// - [`FieldError::InvalidSelector`] — the document could not interpret the selector.
pub fn extract_field<D: Document>(document: &D, selector: &str) -> Result<String, FieldError> {
    let element = document
        .find_first(selector)?
        .ok_or_else(|| FieldError::Absent {
            selector: selector.to_owned(),
        })?;
    Ok(document.text_of(&element).trim().to_owned())
}

/// Like [`extract_field`], but folds absence and blank text into `None`.
///
/// # Errors
///
/// Propagates [`FieldError::InvalidSelector`] only.
pub fn extract_optional<D: Document>(
    document: &D,
    selector: &str,
) -> Result<Option<String>, FieldError> {
    match extract_field(document, selector) {
        Ok(text) if text.is_empty() => Ok(None),
        Ok(text) => Ok(Some(text)),
        Err(FieldError::Absent { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}
