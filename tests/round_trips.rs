use pbxgraph::model::linker::link;
use pbxgraph::model::{EnumerateOptions, Literal, Project, Value};
use pbxgraph::plist::parser::parse;
use pbxgraph::workspace::Workspace;

fn load_project(text: &str) -> Project {
    let root = parse(text).unwrap();
    let linked = link(root).unwrap();
    Project::new(linked, "/proj", false)
}

/// Testable Property 1: parsing then rendering an unmutated project is
/// byte-identical, prologue included when the source carried one.
#[test]
fn project_round_trip_is_byte_identical() {
    let text = "// !$*UTF8*$!\n{\n\tfoo = bar;\n\tbaz = \"qu ux\";\n\tobjects = {\n\t\tAAAA000000000000000000AA = {\n\t\t\tisa = PBXFileReference;\n\t\t\tpath = \"a.swift\";\n\t\t\tsourceTree = \"<group>\";\n\t\t};\n\t};\n}\n";
    let project = Project::parse(text, "/proj").unwrap();
    assert_eq!(project.content().unwrap(), text);
}

/// Same property, but for a source with no prologue at all — the renderer
/// must not invent one (`spec.md` §8 Scenario S1).
#[test]
fn project_round_trip_without_prologue_stays_prologue_free() {
    let text = "{\n\tfoo = bar;\n\tobjects = {\n\t};\n}\n";
    let project = Project::parse(text, "/proj").unwrap();
    assert_eq!(project.content().unwrap(), text);
}

/// Testable Property 2: same property for the workspace XML format.
#[test]
fn workspace_round_trip_is_byte_identical() {
    let text = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Workspace\n   version = \"1.0\">\n   <FileRef\n      location = \"group:App.xcodeproj\">\n   </FileRef>\n</Workspace>\n";
    let workspace = Workspace::parse(text, "/ws").unwrap();
    assert_eq!(workspace.content(), text);
}

/// Testable Property 4: after loading, every `ref` literal either resolves
/// to a live object or was never in `objects` to begin with — there is no
/// way to observe a `Literal::Ref` whose weak target fails to upgrade
/// immediately after linking.
#[test]
fn reference_integrity_after_load() {
    let project = load_project(
        r#"{ objects = {
            AAAA000000000000000000AA = { isa = PBXGroup; children = ( BBBB000000000000000000BB, CCCC000000000000000000CC ); sourceTree = "<group>"; };
            BBBB000000000000000000BB = { isa = PBXFileReference; path = "a.swift"; sourceTree = "<group>"; };
        }; }"#,
    );
    let group = project.object("AAAA000000000000000000AA", None).unwrap();
    let children = group
        .borrow()
        .content
        .get(&Literal::string("children"))
        .and_then(Value::as_array)
        .unwrap()
        .clone();

    let mut resolved = 0;
    let mut dangling_unlinked = 0;
    for child in &children {
        let literal = child.as_literal().unwrap();
        match literal.resolve() {
            Some(_) => resolved += 1,
            None => dangling_unlinked += 1,
        }
    }
    // BBBB is present in objects and must resolve; CCCC was never in
    // objects, so it stays a plain (non-ref) literal and never attempts
    // to resolve in the first place.
    assert_eq!(resolved, 1);
    assert_eq!(dangling_unlinked, 0);
    assert!(!children[1].as_literal().unwrap().is_ref());
}

/// Testable Property 5: after removal, no dictionary key, dictionary value,
/// or array element anywhere in the graph carries the removed id.
#[test]
fn removal_leaves_no_trace_of_the_id() {
    let mut project = load_project(
        r#"{ objects = {
            AAAA000000000000000000AA = { isa = PBXGroup; children = ( BBBB000000000000000000BB ); sourceTree = "<group>"; };
            BBBB000000000000000000BB = { isa = PBXFileReference; path = "a.swift"; sourceTree = "<group>"; };
            CCCC000000000000000000CC = { isa = PBXBuildFile; fileRef = BBBB000000000000000000BB; };
        }; }"#,
    );
    project.remove_object("BBBB000000000000000000BB").unwrap();

    let root = project.root();
    let objects = root.get(&Literal::string("objects")).unwrap().as_sections().unwrap();
    for object in objects.all_objects() {
        let object = object.borrow();
        assert_ne!(object.id(), "BBBB000000000000000000BB");
        for (key, value) in object.content.iter() {
            assert_ne!(key.as_str(), "BBBB000000000000000000BB");
            if let Some(literal) = value.as_literal() {
                assert_ne!(literal.as_str(), "BBBB000000000000000000BB");
            }
            if let Some(array) = value.as_array() {
                for element in array {
                    if let Some(literal) = element.as_literal() {
                        assert_ne!(literal.as_str(), "BBBB000000000000000000BB");
                    }
                }
            }
        }
    }
}

/// Testable Property 6: a live object pair embeds a ref in one direction
/// iff the other direction's back-reference set contains it.
#[test]
fn back_reference_symmetry_holds() {
    let project = load_project(
        r#"{ objects = {
            AAAA000000000000000000AA = { isa = PBXGroup; children = ( BBBB000000000000000000BB ); sourceTree = "<group>"; };
            BBBB000000000000000000BB = { isa = PBXFileReference; path = "a.swift"; sourceTree = "<group>"; };
        }; }"#,
    );
    let parent = project.object("AAAA000000000000000000AA", None).unwrap();
    let child = project.object("BBBB000000000000000000BB", None).unwrap();

    let embeds_ref = parent
        .borrow()
        .content
        .get(&Literal::string("children"))
        .and_then(Value::as_array)
        .unwrap()
        .iter()
        .any(|v| v.as_literal().is_some_and(|l| l.as_str() == "BBBB000000000000000000BB"));
    let referenced_by_parent = child
        .borrow()
        .referenced_by()
        .iter()
        .any(|r| r.borrow().id() == "AAAA000000000000000000AA");

    assert!(embeds_ref);
    assert!(referenced_by_parent);
}

/// Testable Property 7: every object in a section has that section's isa,
/// and every object in the project appears in exactly one section.
#[test]
fn section_bucketing_is_exact() {
    let project = load_project(
        r#"{ objects = {
            AAAA000000000000000000AA = { isa = PBXGroup; children = ( ); sourceTree = "<group>"; };
            BBBB000000000000000000BB = { isa = PBXFileReference; path = "a.swift"; sourceTree = "<group>"; };
            CCCC000000000000000000CC = { isa = PBXFileReference; path = "b.swift"; sourceTree = "<group>"; };
        }; }"#,
    );
    let objects = project
        .root()
        .get(&Literal::string("objects"))
        .unwrap()
        .as_sections()
        .unwrap();

    let mut seen_ids = std::collections::HashSet::new();
    for (isa, section) in objects.iter() {
        for (_, value) in section.iter() {
            let Value::Object(object) = value else {
                panic!("section entry is not an object");
            };
            assert_eq!(object.borrow().isa(), isa);
            assert!(seen_ids.insert(object.borrow().id().to_string()));
        }
    }
    assert_eq!(seen_ids.len(), 3);
}

/// `enumerate_child_projects` with `ONCE` set visits a project reachable
/// through two different group paths exactly once.
#[test]
fn enumerate_child_projects_once_deduplicates_by_resolved_url() {
    let mut project = load_project(
        r#"{ objects = {
            ROOT0000000000000000000A = { isa = PBXGroup; children = ( ); sourceTree = "<group>"; };
        }; }"#,
    );
    let root = project.object("ROOT0000000000000000000A", None).unwrap();
    let group_a = project.create_group(&root, "A").unwrap();
    let group_b = project.create_group(&root, "B").unwrap();
    project.create_file_reference(&group_a, "../Shared/Dep.xcodeproj", "<group>").unwrap();
    project.create_file_reference(&group_b, "../Shared/Dep.xcodeproj", "<group>").unwrap();

    let mut visits = 0;
    project.enumerate_child_projects(&root, EnumerateOptions::DEEP | EnumerateOptions::ONCE, |_| {
        visits += 1;
        true
    });
    assert_eq!(visits, 1);

    let mut shallow_visits = 0;
    project.enumerate_child_projects(&root, EnumerateOptions::ONCE, |_| {
        shallow_visits += 1;
        true
    });
    assert_eq!(shallow_visits, 0, "without DEEP, nested groups are not scanned");
}

/// `group_for` finds an already-existing nested group rather than creating
/// a duplicate when `create_intermediates` is false.
#[test]
fn group_for_without_create_intermediates_requires_existing_path() {
    let mut project = load_project(
        r#"{ objects = {
            AAAA000000000000000000AA = { isa = PBXGroup; children = ( ); sourceTree = "<group>"; };
        }; }"#,
    );
    let main_group = project.object("AAAA000000000000000000AA", None).unwrap();
    assert!(project.group_for(&main_group, "Missing/Path", false).unwrap().is_none());

    project.create_group(&main_group, "Present").unwrap();
    let found = project.group_for(&main_group, "Present", false).unwrap();
    assert!(found.is_some());
}
