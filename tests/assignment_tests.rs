//! Groups-holding-permissions behaviour of the assignment adapter

mod common;

use common::{set, TestFixture};
use docauth::{Credentials, SourceAdapter};

#[test]
fn test_assign_permission_to_group() {
    let fixture = TestFixture::new();
    fixture.add_groups(&["editors", "viewers"]);
    fixture.add_permissions(&["publish", "read"]);
    let assignment = fixture.source.assignment();

    assert_eq!(
        assignment
            .include_items("publish", &["editors"])
            .unwrap(),
        1
    );
    assignment
        .include_items("read", &["editors", "viewers"])
        .unwrap();

    assert_eq!(
        assignment.find_sections(&Credentials::identifier("editors")),
        set(&["publish", "read"])
    );
    assert_eq!(
        assignment.get_section_items("read").unwrap(),
        set(&["editors", "viewers"])
    );
    assert!(assignment.item_is_included("publish", "editors"));
    assert!(!assignment.item_is_included("publish", "viewers"));
}

#[test]
fn test_groups_created_by_membership_are_assignment_items() {
    let fixture = TestFixture::new();
    fixture.source.membership().create_section("editors").unwrap();
    fixture.add_permissions(&["publish"]);
    let assignment = fixture.source.assignment();

    assert_eq!(
        assignment
            .include_items("publish", &["editors"])
            .unwrap(),
        1
    );
    let group = assignment.get_item("editors").unwrap().unwrap();
    assert_eq!(group.permission_names().collect::<Vec<_>>(), vec!["publish"]);
}

#[test]
fn test_revoke_and_delete_permission() {
    let fixture = TestFixture::new();
    fixture.add_groups(&["editors", "viewers"]);
    fixture.add_permissions(&["publish", "read"]);
    let assignment = fixture.source.assignment();
    assignment
        .include_items("read", &["editors", "viewers"])
        .unwrap();
    assignment
        .include_items("publish", &["editors"])
        .unwrap();

    assert_eq!(assignment.exclude_items("read", &["viewers"]).unwrap(), 1);
    assert!(assignment
        .find_sections(&Credentials::identifier("viewers"))
        .is_empty());

    assignment.delete_section("publish").unwrap();
    assert!(!assignment.section_exists("publish").unwrap());
    assert_eq!(
        assignment.find_sections(&Credentials::identifier("editors")),
        set(&["read"])
    );

    let all = assignment.get_all_sections().unwrap();
    assert_eq!(all.keys().cloned().collect::<Vec<_>>(), vec!["read"]);
    assert_eq!(all["read"], set(&["editors"]));
}

#[test]
fn test_deleted_group_drops_out_of_permission() {
    let fixture = TestFixture::new();
    fixture.add_groups(&["editors", "viewers"]);
    fixture.add_permissions(&["read"]);
    fixture
        .source
        .assignment()
        .include_items("read", &["editors", "viewers"])
        .unwrap();

    fixture.source.membership().delete_section("viewers").unwrap();

    assert_eq!(
        fixture.source.assignment().get_section_items("read").unwrap(),
        set(&["editors"])
    );
    assert!(!fixture.source.assignment().item_is_included("read", "viewers"));
}

#[test]
fn test_group_permissions_survive_membership_changes() {
    let fixture = TestFixture::new();
    fixture.add_users(&["alice"]);
    fixture.add_groups(&["editors"]);
    fixture.add_permissions(&["publish"]);
    let membership = fixture.source.membership();
    let assignment = fixture.source.assignment();

    assignment
        .include_items("publish", &["editors"])
        .unwrap();
    membership.include_items("editors", &["alice"]).unwrap();
    membership.exclude_items("editors", &["alice"]).unwrap();

    assert_eq!(
        assignment.find_sections(&Credentials::identifier("editors")),
        set(&["publish"])
    );
}

#[test]
fn test_deleting_group_detaches_it_from_users() {
    let fixture = TestFixture::new();
    fixture.add_users(&["alice", "bob"]);
    fixture.add_groups(&["editors", "viewers"]);
    fixture.add_permissions(&["publish", "read"]);
    let source = &fixture.source;
    source
        .membership()
        .include_items("editors", &["alice", "bob"])
        .unwrap();
    source
        .membership()
        .include_items("viewers", &["bob"])
        .unwrap();
    source
        .assignment()
        .include_items("publish", &["editors"])
        .unwrap();
    source
        .assignment()
        .include_items("read", &["viewers"])
        .unwrap();

    source.membership().delete_section("editors").unwrap();

    assert!(source.assignment().get_item("editors").unwrap().is_none());
    assert!(source
        .membership()
        .find_sections(&Credentials::identifier("alice"))
        .is_empty());
    assert_eq!(
        source
            .membership()
            .find_sections(&Credentials::identifier("bob")),
        set(&["viewers"])
    );
    assert!(source.user_permissions("alice").is_empty());
    assert_eq!(source.user_permissions("bob"), set(&["read"]));
    assert_eq!(
        source.assignment().get_section_items("publish").unwrap(),
        set(&[])
    );
}
