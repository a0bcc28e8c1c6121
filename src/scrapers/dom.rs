//! Minimal HTML query surface used by the extractors.
//!
//! The page and search extractors only ever need three things from a parsed
//! document: find the first element with a given tag and attribute values,
//! read an attribute, and read an element's text. [`Document`] and [`Node`]
//! capture exactly that, implemented here on top of `scraper`.

use scraper::{ElementRef, Html, Selector};

/// A parsed HTML document.
pub trait Document {
    type Element<'a>: Node
    where
        Self: 'a;

    /// First element named `tag` whose attributes equal every `(name, value)`
    /// pair in `attrs`, in document order.
    fn find<'a>(&'a self, tag: &str, attrs: &[(&str, &str)]) -> Option<Self::Element<'a>>;
}

/// An element within a [`Document`].
pub trait Node {
    fn attr(&self, name: &str) -> Option<&str>;

    /// Text content with each fragment trimmed and the fragments concatenated.
    fn stripped_text(&self) -> String;
}

impl Document for Html {
    type Element<'a> = ElementRef<'a>;

    fn find<'a>(&'a self, tag: &str, attrs: &[(&str, &str)]) -> Option<ElementRef<'a>> {
        let selector = Selector::parse(tag).ok()?;
        self.select(&selector).find(|element| {
            attrs
                .iter()
                .all(|(name, value)| element.value().attr(name) == Some(*value))
        })
    }
}

impl Node for ElementRef<'_> {
    fn attr(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }

    fn stripped_text(&self) -> String {
        self.text().map(str::trim).collect()
    }
}
