use std::{fmt::Debug, path::Path};

use crate::result::Result;

/// Interface for driving a web browser through a single page at a time.
///
/// Element handles are only valid for the page they were found on.
/// Navigating somewhere else invalidates them.
pub trait Browser {
    type Element: Clone + Debug;

    /// Load the page at the URL in the current window
    fn navigate(&self, url: &str) -> Result<()>;

    /// Every element matching the CSS selector, in document order.
    ///
    /// With a scope, only its descendants are looked at.
    /// No match is not an error, but an empty list.
    fn find_all(&self, scope: Option<&Self::Element>, selector: &str)
        -> Result<Vec<Self::Element>>;

    /// The first element matching the CSS selector, if any
    fn find(&self, scope: Option<&Self::Element>, selector: &str) -> Result<Option<Self::Element>> {
        Ok(self.find_all(scope, selector)?.into_iter().next())
    }

    /// The text of the element as rendered to the user
    fn text(&self, element: &Self::Element) -> Result<String>;

    /// A DOM property of the element, such as `innerText` or `href`.
    /// Return None if it is not set.
    fn property(&self, element: &Self::Element, name: &str) -> Result<Option<String>>;

    /// Save a PNG capture of the current window
    fn screenshot(&self, path: &Path) -> Result<()>;

    /// Close the browser session and release everything attached to it
    fn quit(self) -> Result<()>;
}
