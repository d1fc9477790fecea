//! Resource identifier grammar
//!
//! Pure functions that assemble multi-segment provider resource paths,
//! shared by resourceId(), subscriptionResourceId(), tenantResourceId()
//! and extensionResourceId().
//!
//! Scanning left to right, the first segment containing '/' is the type
//! segment. Segments before it override the subscription/resource group
//! defaults; segments after it are name parts whose count must equal the
//! type depth exactly.

use crate::errors::{EvalResult, ExpressionError};

/// The type segment with its surrounding context after validation.
struct TypedSegments<'a> {
    leading: &'a [String],
    resource_type: &'a str,
    name_parts: String,
}

/// Locate and validate the type segment. `max_leading` caps how many
/// segments may precede it for the calling function.
fn parse_segments<'a>(
    function: &str,
    segments: &'a [String],
    max_leading: usize,
) -> EvalResult<TypedSegments<'a>> {
    for (i, segment) in segments.iter().enumerate() {
        if !segment.contains('/') {
            continue;
        }
        if i > max_leading {
            return Err(ExpressionError::argument_format(function));
        }
        let resource_type = trim_resource_type(segment);
        let name_depth = resource_type.split('/').count() - 1;
        let names = &segments[i + 1..];
        if names.len() != name_depth {
            return Err(ExpressionError::mismatching_resource_segments(function));
        }
        return Ok(TypedSegments {
            leading: &segments[..i],
            resource_type,
            name_parts: names.join("/"),
        });
    }
    Err(ExpressionError::argument_format(function))
}

/// Trim one trailing '/' from a type segment if present.
fn trim_resource_type(resource_type: &str) -> &str {
    resource_type.strip_suffix('/').unwrap_or(resource_type)
}

/// Build `/subscriptions/{sub}/resourceGroups/{rg}/providers/{type}/{name}`.
///
/// One leading segment overrides the resource group; two override the
/// subscription then the resource group, in that order.
pub fn resource_id(
    function: &str,
    subscription_id: &str,
    resource_group: &str,
    segments: &[String],
) -> EvalResult<String> {
    let parsed = parse_segments(function, segments, 2)?;
    let (subscription_id, resource_group) = match parsed.leading {
        [] => (subscription_id, resource_group),
        [rg] => (subscription_id, rg.as_str()),
        [sub, rg] => (sub.as_str(), rg.as_str()),
        _ => unreachable!(),
    };
    Ok(format!(
        "/subscriptions/{}/resourceGroups/{}/providers/{}/{}",
        subscription_id, resource_group, parsed.resource_type, parsed.name_parts
    ))
}

/// Build `/subscriptions/{sub}/providers/{type}/{name}`.
///
/// One leading segment overrides the subscription.
pub fn subscription_resource_id(
    function: &str,
    subscription_id: &str,
    segments: &[String],
) -> EvalResult<String> {
    let parsed = parse_segments(function, segments, 1)?;
    let subscription_id = match parsed.leading {
        [] => subscription_id,
        [sub] => sub.as_str(),
        _ => unreachable!(),
    };
    Ok(format!(
        "/subscriptions/{}/providers/{}/{}",
        subscription_id, parsed.resource_type, parsed.name_parts
    ))
}

/// Build `/providers/{type}/{name}`.
pub fn tenant_resource_id(function: &str, segments: &[String]) -> EvalResult<String> {
    let parsed = parse_segments(function, segments, 0)?;
    Ok(format!(
        "/providers/{}/{}",
        parsed.resource_type, parsed.name_parts
    ))
}

/// Build `{scope}/providers/{type}/{name}`.
///
/// The first segment is an opaque scope and is not parsed; the second must
/// be the type segment.
pub fn extension_resource_id(function: &str, segments: &[String]) -> EvalResult<String> {
    if segments.len() < 3 {
        return Err(ExpressionError::arguments_out_of_range(
            function,
            segments.len(),
        ));
    }
    let scope = &segments[0];
    if !segments[1].contains('/') {
        return Err(ExpressionError::argument_format(function));
    }
    let resource_type = trim_resource_type(&segments[1]);
    let name_depth = resource_type.split('/').count() - 1;
    let names = &segments[2..];
    if names.len() != name_depth {
        return Err(ExpressionError::mismatching_resource_segments(function));
    }
    Ok(format!(
        "{}/providers/{}/{}",
        scope,
        resource_type,
        names.join("/")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn segs(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resource_id_with_defaults() {
        let id = resource_id(
            "resourceId",
            "sub1",
            "rg1",
            &segs(&["Microsoft.Network/virtualNetworks", "vnet1"]),
        )
        .unwrap();
        assert_eq!(
            id,
            "/subscriptions/sub1/resourceGroups/rg1/providers/Microsoft.Network/virtualNetworks/vnet1"
        );
    }

    #[test]
    fn test_resource_id_overrides() {
        let id = resource_id(
            "resourceId",
            "sub1",
            "rg1",
            &segs(&["rg2", "Microsoft.Network/virtualNetworks", "vnet1"]),
        )
        .unwrap();
        assert!(id.starts_with("/subscriptions/sub1/resourceGroups/rg2/"));

        let id = resource_id(
            "resourceId",
            "sub1",
            "rg1",
            &segs(&["sub2", "rg2", "Microsoft.Network/virtualNetworks", "vnet1"]),
        )
        .unwrap();
        assert!(id.starts_with("/subscriptions/sub2/resourceGroups/rg2/"));
    }

    #[test]
    fn test_resource_id_nested_type() {
        let id = resource_id(
            "resourceId",
            "sub1",
            "rg1",
            &segs(&[
                "Microsoft.Network/virtualNetworks/subnets",
                "vnet1",
                "subnet1",
            ]),
        )
        .unwrap();
        assert_eq!(
            id,
            "/subscriptions/sub1/resourceGroups/rg1/providers/Microsoft.Network/virtualNetworks/vnet1/subnets/subnet1"
        );
    }

    #[test]
    fn test_resource_id_mismatching_segments() {
        let err = resource_id(
            "resourceId",
            "sub1",
            "rg1",
            &segs(&["Microsoft.Network/virtualNetworks/subnets", "vnet1"]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ExpressionError::MismatchingResourceSegments { ref function } if function == "resourceId"
        ));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let id = resource_id(
            "resourceId",
            "sub1",
            "rg1",
            &segs(&["Microsoft.Network/virtualNetworks/", "vnet1"]),
        )
        .unwrap();
        assert!(id.ends_with("/providers/Microsoft.Network/virtualNetworks/vnet1"));
    }

    #[test]
    fn test_no_type_segment_is_an_error() {
        let err =
            resource_id("resourceId", "sub1", "rg1", &segs(&["vnet1", "subnet1"])).unwrap_err();
        assert!(matches!(err, ExpressionError::ArgumentFormat { .. }));
    }

    #[test]
    fn test_subscription_resource_id() {
        let id = subscription_resource_id(
            "subscriptionResourceId",
            "sub1",
            &segs(&["Microsoft.Authorization/policyDefinitions", "policy1"]),
        )
        .unwrap();
        assert_eq!(
            id,
            "/subscriptions/sub1/providers/Microsoft.Authorization/policyDefinitions/policy1"
        );

        let id = subscription_resource_id(
            "subscriptionResourceId",
            "sub1",
            &segs(&["sub2", "Microsoft.Authorization/policyDefinitions", "policy1"]),
        )
        .unwrap();
        assert!(id.starts_with("/subscriptions/sub2/"));
    }

    #[test]
    fn test_tenant_resource_id() {
        let id = tenant_resource_id(
            "tenantResourceId",
            &segs(&["Microsoft.Management/managementGroups", "mg1"]),
        )
        .unwrap();
        assert_eq!(id, "/providers/Microsoft.Management/managementGroups/mg1");
    }

    #[test]
    fn test_extension_resource_id() {
        let id = extension_resource_id(
            "extensionResourceId",
            &segs(&[
                "/subscriptions/sub1/resourceGroups/rg1",
                "Microsoft.Authorization/locks",
                "lock1",
            ]),
        )
        .unwrap();
        assert_eq!(
            id,
            "/subscriptions/sub1/resourceGroups/rg1/providers/Microsoft.Authorization/locks/lock1"
        );
    }

    #[test]
    fn test_extension_resource_id_scope_not_parsed() {
        // The scope may itself contain '/' segments without being treated
        // as the type segment.
        let err = extension_resource_id(
            "extensionResourceId",
            &segs(&["/subscriptions/sub1", "noSlashType", "name1"]),
        )
        .unwrap_err();
        assert!(matches!(err, ExpressionError::ArgumentFormat { .. }));
    }
}
