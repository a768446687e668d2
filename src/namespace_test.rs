use super::*;

#[test]
fn from_path_strips_directories_and_extension() {
    let ns = NamespaceKey::from_path("/quizzes/Quiz1.html", SCHEMA_VERSION);
    assert_eq!(ns.document(), "Quiz1");
    assert_eq!(ns.version(), SCHEMA_VERSION);
}

#[test]
fn from_path_cuts_at_first_dot() {
    let ns = NamespaceKey::from_path("/unit.3.review.html", 1);
    assert_eq!(ns.document(), "unit");
}

#[test]
fn from_path_without_extension_keeps_segment() {
    let ns = NamespaceKey::from_path("/drills/verbs", 1);
    assert_eq!(ns.document(), "verbs");
}

#[test]
fn from_path_directory_index_maps_to_index() {
    assert_eq!(NamespaceKey::from_path("/quizzes/", 1).document(), INDEX_DOCUMENT);
    assert_eq!(NamespaceKey::from_path("", 1).document(), INDEX_DOCUMENT);
}

#[test]
fn scalar_keys_are_prefixed_by_document() {
    let ns = NamespaceKey::new("quiz1", 1);
    assert_eq!(ns.scalar_key("visible-position"), "quiz1:visible-position");
}

#[test]
fn distinct_documents_produce_distinct_keys() {
    let a = NamespaceKey::new("quiz1", 1);
    let b = NamespaceKey::new("quiz2", 1);
    assert_ne!(a, b);
    assert_ne!(a.scalar_key("visible-position"), b.scalar_key("visible-position"));
}

#[test]
fn display_includes_version() {
    assert_eq!(NamespaceKey::new("quiz1", 2).to_string(), "quiz1@v2");
}
