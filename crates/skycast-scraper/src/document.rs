//! Selector-based lookup over a parsed page.
//!
//! [`Document`] is the only capability the extraction pipeline needs from a
//! DOM: find the first element matching a selector and read its text.
//! [`HtmlDocument`] provides it over the `scraper` crate.

use scraper::{ElementRef, Html, Selector};

use crate::error::FieldError;

/// Read-only, first-match selector queries over a parsed document.
pub trait Document {
    type Element<'a>
    where
        Self: 'a;

    /// Returns the first element in document order that matches `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidSelector`] when the implementation cannot
    /// interpret `selector`. A selector that simply matches nothing is
    /// `Ok(None)`.
    fn find_first(&self, selector: &str) -> Result<Option<Self::Element<'_>>, FieldError>;

    /// Returns the full, untrimmed text content of `element`.
    fn text_of(&self, element: &Self::Element<'_>) -> String;
}

/// HTML page parsed with `html5ever`, queried with CSS selectors.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    #[must_use]
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }
}

/// Compiles a CSS selector, mapping parse failures to [`FieldError`].
pub(crate) fn compile_selector(selector: &str) -> Result<Selector, FieldError> {
    Selector::parse(selector).map_err(|e| FieldError::InvalidSelector {
        selector: selector.to_owned(),
        reason: e.to_string(),
    })
}

impl Document for HtmlDocument {
    type Element<'a> = ElementRef<'a>;

    fn find_first(&self, selector: &str) -> Result<Option<ElementRef<'_>>, FieldError> {
        let compiled = compile_selector(selector)?;
        Ok(self.html.select(&compiled).next())
    }

    fn text_of(&self, element: &ElementRef<'_>) -> String {
        element.text().collect()
    }
}
