//! Dotted path of the object currently being walked.

/// Stack of object names from the root down to the current container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentPath {
    parts: Vec<String>,
}

impl ContentPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the object named `name`.
    pub fn add(&mut self, name: &str) {
        self.parts.push(name.to_string());
    }

    /// Leave the innermost object.
    pub fn remove(&mut self) {
        self.parts.pop();
    }

    pub fn depth(&self) -> usize {
        self.parts.len()
    }

    /// Fully qualified dotted name of a child `name` of the current container.
    pub fn path_as_text(&self, name: &str) -> String {
        if self.parts.is_empty() {
            return name.to_string();
        }
        let mut full = self.parts.join(".");
        full.push('.');
        full.push_str(name);
        full
    }
}

impl<S: AsRef<str>> FromIterator<S> for ContentPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            parts: iter.into_iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_children_have_bare_names() {
        assert_eq!(ContentPath::new().path_as_text("title"), "title");
    }

    #[test]
    fn nested_children_are_dotted() {
        let mut path = ContentPath::new();
        path.add("user");
        path.add("address");
        assert_eq!(path.depth(), 2);
        assert_eq!(path.path_as_text("city"), "user.address.city");
        path.remove();
        assert_eq!(path.path_as_text("name"), "user.name");
    }

    #[test]
    fn collects_from_segments() {
        let path: ContentPath = ["a", "b"].into_iter().collect();
        assert_eq!(path.path_as_text("c"), "a.b.c");
    }
}
