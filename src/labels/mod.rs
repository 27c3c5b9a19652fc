//! Class-name tables.

/// Waste categories in model output order.
pub const WASTE_CLASSES: [&str; 8] = [
    "paper_cardboard",
    "glass",
    "recyclables",
    "bio_waste",
    "textile_reuse",
    "electronics",
    "battery",
    "residual_waste",
];

/// Ordered list of class names indexed by class id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassNames {
    names: Vec<String>,
}

impl ClassNames {
    /// Builds a table from names in class-id order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The eight canonical waste categories.
    pub fn waste() -> Self {
        Self::new(WASTE_CLASSES)
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when the table has no names.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of `class_id`, if known.
    pub fn name(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(String::as_str)
    }

    /// Id of `name`, if present.
    pub fn id(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Iterates names in class-id order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ClassNames {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::ClassNames;

    #[test]
    fn waste_table_lookup() {
        let names = ClassNames::waste();
        assert_eq!(names.len(), 8);
        assert_eq!(names.name(0), Some("paper_cardboard"));
        assert_eq!(names.name(6), Some("battery"));
        assert_eq!(names.name(8), None);
        assert_eq!(names.id("residual_waste"), Some(7));
    }

    #[test]
    fn collects_from_iterator() {
        let names: ClassNames = ["cat", "dog"].into_iter().collect();
        assert_eq!(names.iter().collect::<Vec<_>>(), vec!["cat", "dog"]);
        assert!(ClassNames::default().is_empty());
    }
}
