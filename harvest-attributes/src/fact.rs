use std::fmt;

/// A type declaration together with the attributes it carries.
///
/// `type_path` is fully qualified, crate name first. `attributes` hold the
/// resolved attribute paths, sorted and without duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeFact {
    pub type_path: String,
    pub attributes: Vec<String>,
}

impl TypeFact {
    pub fn new(
        type_path: impl Into<String>,
        attributes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let mut attributes: Vec<String> = attributes.into_iter().map(Into::into).collect();
        attributes.sort();
        attributes.dedup();
        Self {
            type_path: type_path.into(),
            attributes,
        }
    }
}

impl fmt::Display for TypeFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.type_path, self.attributes.join(", "))
    }
}
