//! Runs the generator over a small domain, then compiles and runs a program
//! that navigates the generated accessors.

use fluentmodel_build::ModelGenerator;
use std::fs;

const DOMAIN: &str = r#"
use fluentmodel::{Embeddable, Entity, MappedSuperclass};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

#[derive(MappedSuperclass)]
pub struct Auditable {
    pub created_at: u64,
}

#[derive(Entity)]
#[fluent(extends = Auditable)]
pub struct Book {
    #[fluent(id)]
    pub id: i64,
    pub title: String,
    pub year: u16,
    pub available: bool,
    pub loan_window: (Duration, Duration),
    #[fluent(many_to_one)]
    pub author: Option<Box<Author>>,
    #[fluent(many_to_many)]
    pub tags: HashSet<Tag>,
    #[fluent(embedded)]
    pub shelf: Shelf,
    #[fluent(transient)]
    pub cache: Vec<u8>,
}

#[derive(Entity)]
pub struct Author {
    #[fluent(id)]
    pub id: i64,
    pub name: String,
    #[fluent(one_to_many)]
    pub books: Vec<Book>,
}

#[derive(Entity)]
pub struct Tag {
    #[fluent(id)]
    pub label: String,
}

#[derive(Embeddable)]
pub struct Shelf {
    pub room: String,
    #[fluent(embedded)]
    pub position: Position,
}

#[derive(Embeddable)]
pub struct Position {
    pub row: u32,
}

#[derive(Entity)]
pub struct Node {
    #[fluent(id)]
    pub id: i64,
    #[fluent(many_to_one)]
    pub parent: Option<Box<Node>>,
    #[fluent(one_to_many)]
    pub children: BTreeMap<u32, Node>,
}
"#;

const MAIN: &str = r##"
#![allow(dead_code, unused_imports)]

mod domain;
mod generated;

use domain::{Author, Book, Node};
use fluentmodel::Predicate;

fn main() {
    assert_eq!(Book::model().author().name().to_string(), "Book.author.name");
    assert_eq!(Book::model().created_at().to_string(), "Book.created_at");
    assert_eq!(Book::model().loan_window().to_string(), "Book.loan_window");
    assert_eq!(Book::model().shelf().position().row().to_string(), "Book.shelf.position.row");
    assert_eq!(Book::model().tags().join().label().to_string(), "Book.tags.label");
    assert_eq!(Author::model().books().left_join().title().to_string(), "Author.books?.title");
    assert_eq!(Node::model().parent().parent().id().to_string(), "Node.parent.parent.id");
    assert_eq!(Node::model().children().key().to_string(), "key(Node.children)");
    assert_eq!(Node::model().children().value().id().to_string(), "Node.children.id");

    let condition = Predicate::and([
        Book::model().author().name().starts_with("Le Guin"),
        Book::model().year().at_least(1970u16),
        Book::model().available().is_true(),
    ]);
    assert_eq!(
        condition.to_string(),
        r#"(Book.author.name like "Le Guin%" and Book.year >= 1970 and Book.available = true)"#
    );

    let root: generated::BookModel = Book::model();
    assert_eq!(root.to_owned(), Book::model());
}
"##;

#[test]
fn generated_accessors_compile_and_navigate() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("domain.rs"), DOMAIN).unwrap();

    let report = ModelGenerator::new()
        .scan_path(&src)
        .output_dir(src.join("generated"))
        .generate()
        .unwrap();
    assert!(!report.has_errors(), "{:#?}", report.diagnostics);
    assert!(src.join("generated/book_model.rs").exists());
    assert!(!src.join("generated/shelf_model.rs").exists());

    fs::write(src.join("main.rs"), MAIN).unwrap();

    let cases = trybuild::TestCases::new();
    cases.pass(src.join("main.rs"));
    // Cases run on drop, while the generated sources still exist.
    drop(cases);
}
