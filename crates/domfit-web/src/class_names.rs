#![forbid(unsafe_code)]

//! Managed class list: the classes this action added, and only those, are
//! swapped on update and removed on destroy.

use crate::document::{Document, DomError, NodeId};

/// Normalize class input to non-blank class tokens.
///
/// Each entry is split on whitespace, so `"a b"` yields two classes.
pub fn clean_classes<I, S>(classes: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    classes
        .into_iter()
        .flat_map(|c| {
            c.as_ref()
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Classes applied to one element by this action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassNames {
    node: NodeId,
    applied: Vec<String>,
}

impl ClassNames {
    /// Add `classes` to `node`.
    pub fn attach<I, S>(doc: &mut Document, node: NodeId, classes: I) -> Result<Self, DomError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let applied = clean_classes(classes);
        for class in &applied {
            doc.add_class(node, class)?;
        }
        Ok(Self { node, applied })
    }

    /// Remove the previously applied classes and add `classes`.
    pub fn update<I, S>(&mut self, doc: &mut Document, classes: I) -> Result<(), DomError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.remove_applied(doc)?;
        self.applied = clean_classes(classes);
        for class in &self.applied {
            doc.add_class(self.node, class)?;
        }
        Ok(())
    }

    /// Remove the applied classes.
    pub fn destroy(&mut self, doc: &mut Document) -> Result<(), DomError> {
        self.remove_applied(doc)?;
        self.applied.clear();
        Ok(())
    }

    /// Classes currently applied.
    #[must_use]
    pub fn applied(&self) -> &[String] {
        &self.applied
    }

    fn remove_applied(&self, doc: &mut Document) -> Result<(), DomError> {
        for class in &self.applied {
            doc.remove_class(self.node, class)?;
        }
        Ok(())
    }
}
