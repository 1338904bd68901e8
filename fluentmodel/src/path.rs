//! Navigation paths built by fluent accessors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a collection-valued or association step is joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    #[default]
    Inner,
    Left,
}

/// One navigation step from the previous position in a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Single-valued attribute, association or embedded value.
    Get { name: String },
    /// Collection-valued attribute, joined.
    Join { name: String, join: JoinType },
    /// Downcast to a subclass entity.
    Treat { entity: String },
    /// Key side of a map join.
    Key,
}

/// A root entity plus the steps taken from it.
///
/// Displayed in a dotted form: `Book.author.name`. Left joins are marked with
/// `?` (`Author.books?.title`), downcasts as `(Item as Book)` and map keys as
/// `key(Product.variants)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    root: String,
    steps: Vec<Step>,
}

impl Path {
    pub fn root(entity: impl Into<String>) -> Self {
        Self {
            root: entity.into(),
            steps: Vec::new(),
        }
    }

    /// The root entity's name.
    pub fn entity(&self) -> &str {
        &self.root
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of steps from the root.
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    pub fn get(&self, name: &str) -> Self {
        self.with(Step::Get { name: name.to_string() })
    }

    pub fn join(&self, name: &str) -> Self {
        self.join_with(name, JoinType::Inner)
    }

    pub fn left_join(&self, name: &str) -> Self {
        self.join_with(name, JoinType::Left)
    }

    pub fn join_with(&self, name: &str, join: JoinType) -> Self {
        self.with(Step::Join {
            name: name.to_string(),
            join,
        })
    }

    pub fn treat(&self, entity: &str) -> Self {
        self.with(Step::Treat {
            entity: entity.to_string(),
        })
    }

    pub fn key(&self) -> Self {
        self.with(Step::Key)
    }

    /// The path one step up, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.steps.split_last()?;
        Some(Self {
            root: self.root.clone(),
            steps: rest.to_vec(),
        })
    }

    /// Name of the last attribute navigated, if any.
    pub fn last_name(&self) -> Option<&str> {
        self.steps.iter().rev().find_map(|step| match step {
            Step::Get { name } | Step::Join { name, .. } => Some(name.as_str()),
            Step::Treat { .. } | Step::Key => None,
        })
    }

    fn with(&self, step: Step) -> Self {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.extend(self.steps.iter().cloned());
        steps.push(step);
        Self {
            root: self.root.clone(),
            steps,
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = self.root.clone();
        for step in &self.steps {
            match step {
                Step::Get { name } => {
                    text.push('.');
                    text.push_str(name);
                }
                Step::Join { name, join } => {
                    text.push('.');
                    text.push_str(name);
                    if *join == JoinType::Left {
                        text.push('?');
                    }
                }
                Step::Treat { entity } => text = format!("({text} as {entity})"),
                Step::Key => text = format!("key({text})"),
            }
        }
        f.write_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_dotted() {
        let path = Path::root("Book").get("author").get("name");
        assert_eq!(path.to_string(), "Book.author.name");
        assert_eq!(Path::root("Book").to_string(), "Book");
    }

    #[test]
    fn test_display_joins_treat_and_key() {
        assert_eq!(Path::root("Author").left_join("books").get("title").to_string(), "Author.books?.title");
        assert_eq!(Path::root("Item").treat("Book").get("isbn").to_string(), "(Item as Book).isbn");
        assert_eq!(Path::root("Product").join("variants").key().to_string(), "key(Product.variants)");
    }

    #[test]
    fn test_steps_do_not_alias() {
        let author = Path::root("Book").get("author");
        let name = author.get("name");
        let id = author.get("id");
        assert_eq!(author.depth(), 1);
        assert_ne!(name, id);
        assert_eq!(name.parent(), Some(author));
        assert_eq!(Path::root("Book").parent(), None);
    }

    #[test]
    fn test_last_name_skips_treat_and_key() {
        let path = Path::root("Item").get("owner").treat("Person");
        assert_eq!(path.last_name(), Some("owner"));
        assert_eq!(Path::root("Item").last_name(), None);
    }

    #[test]
    fn test_serializes_as_steps() {
        let path = Path::root("Book").left_join("tags").get("label");
        let json = serde_json::to_value(&path).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "root": "Book",
                "steps": [
                    { "step": "join", "name": "tags", "join": "left" },
                    { "step": "get", "name": "label" }
                ]
            })
        );
        let back: Path = serde_json::from_value(json).unwrap();
        assert_eq!(back, path);
    }
}
