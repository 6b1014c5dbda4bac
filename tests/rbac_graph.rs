//! Role compilation scenarios over a shared role table.

mod common;

use common::{perms, test_roles};
use rbac_router::rbac::{CompileFailure, RbacError, RoleRegistry, RoleSpec};

fn registry(prebuild: bool) -> RoleRegistry {
    let mut registry = RoleRegistry::new();
    registry.setup(test_roles(), prebuild).unwrap();
    registry
}

#[test]
fn test_setup_compiles_every_role() {
    let registry = registry(true);
    assert_eq!(registry.role_names(), vec!["role_1", "role_2", "role_3", "role_4", "role_5"]);
    assert_eq!(
        registry.permissions("role_1"),
        Some(&perms(&["perm_1.1", "perm_1.2", "perm_1.3"]))
    );
    assert_eq!(
        registry.permissions("role_2"),
        Some(&perms(&["perm_1.1", "perm_1.2", "perm_2.1", "perm_2.2"]))
    );
    assert_eq!(
        registry.permissions("role_3"),
        Some(&perms(&[
            "perm_1.1", "perm_1.2", "perm_2.1", "perm_2.2", "perm_3.1", "perm_3.2"
        ]))
    );
    assert_eq!(
        registry.permissions("role_4"),
        Some(&perms(&["perm_2.1", "perm_2.2", "perm_3.1", "perm_3.2"]))
    );
    assert_eq!(registry.permissions("role_5"), Some(&perms(&["*"])));
}

#[test]
fn test_lazy_setup_then_build() {
    let mut registry = registry(false);
    assert!(!registry.is_compiled("role_2"));
    assert_eq!(registry.permissions("role_2"), None);

    registry.build_all(false).unwrap();
    assert!(registry.is_compiled("role_2"));
    assert_eq!(
        registry.permissions("role_4"),
        Some(&perms(&["perm_2.1", "perm_2.2", "perm_3.1", "perm_3.2"]))
    );
}

#[test]
fn test_apply_cascades_to_dependents() {
    let mut registry = registry(true);
    registry
        .apply("role_1", Some(&RoleSpec::from("newPerm_1.1, newPerm_1.2")))
        .unwrap();

    assert_eq!(
        registry.permissions("role_1"),
        Some(&perms(&["newPerm_1.1", "newPerm_1.2"]))
    );
    assert_eq!(
        registry.permissions("role_2"),
        Some(&perms(&["newPerm_1.1", "newPerm_1.2", "perm_2.1", "perm_2.2"]))
    );
    assert_eq!(
        registry.permissions("role_3"),
        Some(&perms(&[
            "newPerm_1.1",
            "newPerm_1.2",
            "perm_2.1",
            "perm_2.2",
            "perm_3.1",
            "perm_3.2"
        ]))
    );
    assert_eq!(
        registry.permissions("role_4"),
        Some(&perms(&["perm_2.1", "perm_2.2", "perm_3.1", "perm_3.2"]))
    );
}

#[test]
fn test_match() {
    let mut registry = registry(true);
    assert!(registry.matches("perm_1.1", &"role_1".into()).unwrap());
    assert!(!registry.matches("invalidPerm", &"role_1".into()).unwrap());
    assert!(!registry.matches("perm_1", &"invalidRole".into()).unwrap());
    assert!(registry.matches("perm_3.1", &"role_1, role_3".into()).unwrap());
}

#[test]
fn test_wildcard_role() {
    let mut registry = registry(true);
    assert!(registry.matches("undefinedPerm", &"role_5".into()).unwrap());
}

#[test]
fn test_unset_recompiles_dependents() {
    let mut registry = registry(true);
    registry.unset("role_1").unwrap();

    assert!(!registry.contains("role_1"));
    assert_eq!(registry.permissions("role_2"), Some(&perms(&["perm_2.1", "perm_2.2"])));
    assert_eq!(
        registry.permissions("role_3"),
        Some(&perms(&["perm_2.1", "perm_2.2", "perm_3.1", "perm_3.2"]))
    );
    assert_eq!(
        registry.permissions("role_4"),
        Some(&perms(&["perm_2.1", "perm_2.2", "perm_3.1", "perm_3.2"]))
    );
}

#[test]
fn test_resolve_compiles_on_demand() {
    let expected = perms(&["perm_2.1", "perm_2.2", "perm_3.1", "perm_3.2"]);
    assert_eq!(registry(true).resolve("role_4").unwrap(), &expected);
    assert_eq!(registry(false).resolve("role_4").unwrap(), &expected);
}

#[test]
fn test_role_with_no_specification() {
    let err = RoleRegistry::new().apply("testRole", None).unwrap_err();
    assert_eq!(err.to_string(), "could not compile role 'testRole': no specification");
}

#[test]
fn test_invalid_specification_value() {
    let err = RoleSpec::try_from(serde_json::json!(true)).unwrap_err();
    assert_eq!(err.to_string(), "invalid specification: true");
}

#[test]
fn test_malformed_tokens() {
    let cases = [
        ("perm_1 !@ perm_2", "invalid exclude role reference"),
        ("perm_1 ! perm_2", "invalid exclude specification"),
        ("perm_1 @ perm_2", "invalid role reference"),
    ];
    for (spec, reason) in cases {
        let err = RoleRegistry::new()
            .apply("testRole", Some(&RoleSpec::from(spec)))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("could not compile role 'testRole': {}", reason)
        );
    }
}

#[test]
fn test_cycle_rejected_without_mutation() {
    let mut registry = registry(true);
    let err = registry
        .apply("role_1", Some(&RoleSpec::from("@role_3 perm_x")))
        .unwrap_err();
    match err {
        RbacError::Compile {
            role,
            reason: CompileFailure::CircularReference(path),
        } => {
            assert_eq!(role, "role_1");
            assert_eq!(path.first().map(String::as_str), Some("role_1"));
            assert_eq!(path.last().map(String::as_str), Some("role_1"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        registry.permissions("role_1"),
        Some(&perms(&["perm_1.1", "perm_1.2", "perm_1.3"]))
    );
}
