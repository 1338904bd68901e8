use fluentmodel::{Embeddable, Entity, Mapped, MappedKind, MappedSuperclass, MemberMarker};
use std::collections::BTreeSet;

#[derive(MappedSuperclass)]
#[allow(dead_code)]
struct Keyed<K> {
    #[fluent(id)]
    id: K,
}

#[derive(Embeddable)]
#[allow(dead_code)]
struct Address {
    street: String,
    city: String,
}

#[derive(Entity)]
#[allow(dead_code)]
struct Tag {
    #[fluent(id)]
    label: String,
}

#[derive(Entity)]
#[fluent(extends = "Keyed<u64>")]
#[allow(dead_code)]
struct Publisher {
    name: String,
    #[fluent(embedded)]
    address: Address,
    #[fluent(transient)]
    cached_rank: u32,
}

#[derive(Entity)]
#[fluent(extends = Keyed<u64>, skip)]
#[allow(dead_code)]
struct Book {
    r#type: String,
    #[fluent(many_to_one)]
    publisher: Option<Box<Publisher>>,
    #[fluent(many_to_many)]
    tags: BTreeSet<Tag>,
}

#[test]
fn descriptor_lists_members_without_transient() {
    let descriptor = Publisher::descriptor();
    assert_eq!(descriptor.name, "Publisher");
    assert_eq!(descriptor.kind, MappedKind::Entity);
    assert_eq!(descriptor.extends, Some("Keyed<u64>"));
    assert!(!descriptor.skip);

    let names: Vec<&str> = descriptor.members.iter().map(|member| member.name).collect();
    assert_eq!(names, ["name", "address"]);
    assert_eq!(descriptor.member("address").unwrap().markers, [MemberMarker::Embedded]);
    assert_eq!(descriptor.member("address").unwrap().ty, "Address");
}

#[test]
fn bare_type_extends_and_skip() {
    let descriptor = Book::descriptor();
    assert_eq!(descriptor.extends, Some("Keyed<u64>"));
    assert!(descriptor.skip);
    assert_eq!(descriptor.member("type").unwrap().ty, "String");
    assert_eq!(descriptor.member("publisher").unwrap().ty, "Option<Box<Publisher>>");
    assert_eq!(descriptor.member("tags").unwrap().markers, [MemberMarker::ManyToMany]);
}

#[test]
fn kinds_and_identifiers() {
    assert_eq!(<Keyed<i64> as Mapped>::KIND, MappedKind::MappedSuperclass);
    assert_eq!(Address::KIND, MappedKind::Embeddable);
    assert_eq!(Tag::NAME, "Tag");
    assert!(Tag::KIND.is_generation_root());
    assert!(!Address::KIND.is_generation_root());

    let keyed = <Keyed<i64> as Mapped>::descriptor();
    let ids: Vec<&str> = keyed.identifiers().map(|member| member.name).collect();
    assert_eq!(ids, ["id"]);
    assert_eq!(Address::descriptor().identifiers().count(), 0);
}

#[test]
fn descriptor_serializes() {
    let json = serde_json::to_value(Tag::descriptor()).unwrap();
    assert_eq!(json["kind"], "entity");
    assert_eq!(json["members"][0]["markers"][0], "id");
}
