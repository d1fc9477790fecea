//! Resource identifier construction through the registry

use armeval::{DeploymentContext, ExpressionError, Registry, ResourceGroup, Subscription, Value};
use pretty_assertions::assert_eq;

fn ctx() -> DeploymentContext {
    DeploymentContext::new()
        .with_subscription(Subscription {
            subscription_id: "00000000-0000-0000-0000-000000000001".to_string(),
            ..Default::default()
        })
        .with_resource_group(ResourceGroup {
            name: "rg-app".to_string(),
            ..Default::default()
        })
}

fn eval(name: &str, args: Vec<Value>) -> Result<Value, ExpressionError> {
    Registry::builtin()
        .call(name, &ctx(), args)
        .unwrap_or_else(|| panic!("function not registered: {name}"))
}

fn expect_string(result: Result<Value, ExpressionError>) -> String {
    match result.unwrap() {
        Value::String(s) => s,
        other => panic!("expected string, got {other:?}"),
    }
}

#[test]
fn test_resource_id_defaults_from_context() {
    let id = expect_string(eval(
        "resourceId",
        vec!["Microsoft.Storage/storageAccounts".into(), "store1".into()],
    ));
    assert_eq!(
        id,
        "/subscriptions/00000000-0000-0000-0000-000000000001/resourceGroups/rg-app\
         /providers/Microsoft.Storage/storageAccounts/store1"
    );
}

#[test]
fn test_resource_id_leading_overrides() {
    // Explicit resource group only.
    let id = expect_string(eval(
        "resourceId",
        vec![
            "other-rg".into(),
            "Microsoft.Storage/storageAccounts".into(),
            "store1".into(),
        ],
    ));
    assert!(id.contains("/resourceGroups/other-rg/"));

    // Explicit subscription and resource group.
    let id = expect_string(eval(
        "resourceId",
        vec![
            "00000000-0000-0000-0000-000000000002".into(),
            "other-rg".into(),
            "Microsoft.Storage/storageAccounts".into(),
            "store1".into(),
        ],
    ));
    assert_eq!(
        id,
        "/subscriptions/00000000-0000-0000-0000-000000000002/resourceGroups/other-rg\
         /providers/Microsoft.Storage/storageAccounts/store1"
    );
}

#[test]
fn test_nested_resource_names() {
    let id = expect_string(eval(
        "resourceId",
        vec![
            "Microsoft.Network/virtualNetworks/subnets".into(),
            "vnet1".into(),
            "subnet1".into(),
        ],
    ));
    assert!(id.ends_with("/providers/Microsoft.Network/virtualNetworks/vnet1/subnets/subnet1"));
}

#[test]
fn test_mismatching_segments() {
    // Two type segments, one name.
    let err = eval(
        "resourceId",
        vec![
            "Microsoft.Network/virtualNetworks/subnets".into(),
            "vnet1".into(),
        ],
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ExpressionError::MismatchingResourceSegments { .. }
    ));

    // One type segment, two names.
    let err = eval(
        "resourceId",
        vec![
            "Microsoft.Network/virtualNetworks".into(),
            "vnet1".into(),
            "subnet1".into(),
        ],
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ExpressionError::MismatchingResourceSegments { .. }
    ));
}

#[test]
fn test_subscription_resource_id() {
    let id = expect_string(eval(
        "subscriptionResourceId",
        vec![
            "Microsoft.Authorization/policyDefinitions".into(),
            "policy1".into(),
        ],
    ));
    assert_eq!(
        id,
        "/subscriptions/00000000-0000-0000-0000-000000000001\
         /providers/Microsoft.Authorization/policyDefinitions/policy1"
    );

    let id = expect_string(eval(
        "subscriptionResourceId",
        vec![
            "00000000-0000-0000-0000-000000000003".into(),
            "Microsoft.Authorization/policyDefinitions".into(),
            "policy1".into(),
        ],
    ));
    assert!(id.starts_with("/subscriptions/00000000-0000-0000-0000-000000000003/"));
}

#[test]
fn test_tenant_resource_id() {
    let id = expect_string(eval(
        "tenantResourceId",
        vec![
            "Microsoft.Management/managementGroups".into(),
            "mg1".into(),
        ],
    ));
    assert_eq!(id, "/providers/Microsoft.Management/managementGroups/mg1");
}

#[test]
fn test_extension_resource_id() {
    let id = expect_string(eval(
        "extensionResourceId",
        vec![
            "/subscriptions/00000000-0000-0000-0000-000000000001/resourceGroups/rg-app".into(),
            "Microsoft.Authorization/locks".into(),
            "lock1".into(),
        ],
    ));
    assert_eq!(
        id,
        "/subscriptions/00000000-0000-0000-0000-000000000001/resourceGroups/rg-app\
         /providers/Microsoft.Authorization/locks/lock1"
    );

    // The type argument must carry a namespace.
    let err = eval(
        "extensionResourceId",
        vec!["/some/scope".into(), "locks".into(), "lock1".into()],
    )
    .unwrap_err();
    assert!(matches!(err, ExpressionError::ArgumentFormat { .. }));
}

#[test]
fn test_trailing_slash_in_type_is_trimmed() {
    let id = expect_string(eval(
        "resourceId",
        vec!["Microsoft.Storage/storageAccounts/".into(), "store1".into()],
    ));
    assert!(id.ends_with("/providers/Microsoft.Storage/storageAccounts/store1"));
}

#[test]
fn test_non_string_segment_rejected() {
    let err = eval(
        "resourceId",
        vec!["Microsoft.Storage/storageAccounts".into(), Value::Int(5)],
    )
    .unwrap_err();
    assert!(matches!(err, ExpressionError::ArgumentFormat { .. }));
}
