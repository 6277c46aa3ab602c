//! Field-by-field builder for one tag group.

use bpe_core::Element;

use crate::error::AssemblyError;

/// Trimmed value, or `None` when absent or blank.
pub(crate) fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Builds one group element, recording missing required values instead of
/// failing on the first one.
pub(crate) struct Group<'e> {
    element: Element,
    errors: &'e mut Vec<AssemblyError>,
}

impl<'e> Group<'e> {
    pub(crate) fn new(name: &str, errors: &'e mut Vec<AssemblyError>) -> Self {
        Self {
            element: Element::new(name),
            errors,
        }
    }

    /// Append `<name>value</name>`; a blank value is recorded as missing.
    pub(crate) fn required(&mut self, name: &str, value: Option<&str>) {
        match present(value) {
            Some(v) => self.element.push_text(name, v),
            None => self
                .errors
                .push(AssemblyError::missing(name, self.element.name())),
        }
    }

    /// Append `<name>value</name>` only when the value is present.
    pub(crate) fn optional(&mut self, name: &str, value: Option<&str>) {
        if let Some(v) = present(value) {
            self.element.push_text(name, v);
        }
    }

    /// Append a nested group.
    pub(crate) fn push(&mut self, child: Element) {
        self.element.push(child);
    }

    /// Record an error against this group.
    pub(crate) fn record(&mut self, error: AssemblyError) {
        self.errors.push(error);
    }

    pub(crate) fn finish(self) -> Element {
        self.element
    }
}
