//! Evaluation context consumed by the built-in functions
//!
//! The context carries deployment-scoped state: subscription and resource
//! group identity, the cloud environment descriptor, named parameters and
//! variables, and in-progress copy loop indices. It is owned by the caller
//! (the resource-expansion visitor); the function library only reads it.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;

use crate::value::Value;

/// External state read by the built-in function library.
pub trait TemplateContext {
    /// The deployment descriptor, as returned by deployment().
    fn deployment(&self) -> Value;

    fn subscription(&self) -> &Subscription;

    fn resource_group(&self) -> &ResourceGroup;

    fn environment(&self) -> &CloudEnvironment;

    /// Look up a template parameter by name.
    fn try_parameter(&self, name: &str) -> Option<Value>;

    /// Look up a template variable by name.
    fn try_variable(&self, name: &str) -> Option<Value>;

    /// Current state of a named copy loop. The unnamed loop is keyed by
    /// the empty string.
    fn copy_index(&self, loop_name: &str) -> Option<&CopyIndexState>;

    /// Known resource types for a provider namespace, optionally filtered
    /// to a single type.
    fn resource_types(&self, namespace: &str, resource_type: Option<&str>) -> Vec<ResourceType>;
}

/// Subscription identity for the deployment being analyzed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub subscription_id: String,
    pub tenant_id: String,
    pub display_name: String,
    pub state: String,
}

impl Default for Subscription {
    fn default() -> Self {
        Self {
            subscription_id: "ffffffff-ffff-ffff-ffff-ffffffffffff".to_string(),
            tenant_id: "ffffffff-ffff-ffff-ffff-ffffffffffff".to_string(),
            display_name: "Offline Test Subscription".to_string(),
            state: "NotDefined".to_string(),
        }
    }
}

/// Resource group the deployment targets.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    pub name: String,
    pub location: String,
    pub managed_by: Option<String>,
    pub tags: IndexMap<String, String>,
}

impl Default for ResourceGroup {
    fn default() -> Self {
        Self {
            name: "offline-test-rg".to_string(),
            location: "eastus".to_string(),
            managed_by: None,
            tags: IndexMap::new(),
        }
    }
}

/// Cloud environment endpoints, as returned by environment().
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudEnvironment {
    pub name: String,
    pub gallery: String,
    pub graph: String,
    pub portal: String,
    pub graph_audience: String,
    pub active_directory_data_lake: String,
    pub batch: String,
    pub media: String,
    pub sql_management: String,
    pub vm_image_alias_doc: String,
    pub resource_manager: String,
    pub authentication: EnvironmentAuthentication,
    pub suffixes: EnvironmentSuffixes,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentAuthentication {
    pub login_endpoint: String,
    pub audiences: Vec<String>,
    pub tenant: String,
    pub identity_provider: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSuffixes {
    pub acr_login_server: String,
    pub azure_datalake_analytics_catalog_and_job: String,
    pub azure_datalake_store_file_system: String,
    pub azure_front_door_endpoint_suffix: String,
    pub keyvault_dns: String,
    pub sql_server_hostname: String,
    pub storage: String,
}

impl Default for CloudEnvironment {
    fn default() -> Self {
        Self {
            name: "AzureCloud".to_string(),
            gallery: "https://gallery.azure.com/".to_string(),
            graph: "https://graph.windows.net/".to_string(),
            portal: "https://portal.azure.com".to_string(),
            graph_audience: "https://graph.windows.net/".to_string(),
            active_directory_data_lake: "https://datalake.azure.net/".to_string(),
            batch: "https://batch.core.windows.net/".to_string(),
            media: "https://rest.media.azure.net".to_string(),
            sql_management: "https://management.core.windows.net:8443/".to_string(),
            vm_image_alias_doc: "https://raw.githubusercontent.com/Azure/azure-rest-api-specs/master/arm-compute/quickstart-templates/aliases.json".to_string(),
            resource_manager: "https://management.azure.com/".to_string(),
            authentication: EnvironmentAuthentication {
                login_endpoint: "https://login.microsoftonline.com/".to_string(),
                audiences: vec![
                    "https://management.core.windows.net/".to_string(),
                    "https://management.azure.com/".to_string(),
                ],
                tenant: "common".to_string(),
                identity_provider: "AAD".to_string(),
            },
            suffixes: EnvironmentSuffixes {
                acr_login_server: "azurecr.io".to_string(),
                azure_datalake_analytics_catalog_and_job: "azuredatalakeanalytics.net".to_string(),
                azure_datalake_store_file_system: "azuredatalakestore.net".to_string(),
                azure_front_door_endpoint_suffix: "azurefd.net".to_string(),
                keyvault_dns: ".vault.azure.net".to_string(),
                sql_server_hostname: ".database.windows.net".to_string(),
                storage: "core.windows.net".to_string(),
            },
        }
    }
}

/// Per-loop iteration state, mutated by the resource-expansion visitor.
#[derive(Debug, Clone, Default)]
pub struct CopyIndexState {
    pub name: String,
    pub index: i64,
    pub count: i64,
}

/// A provider resource type known to the analyzer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceType {
    pub resource_type: String,
    pub api_versions: Vec<String>,
    pub locations: Vec<String>,
}

impl ResourceType {
    pub fn to_value(&self) -> Value {
        serialize_to_value(self)
    }
}

fn serialize_to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value)
        .map(Value::from_serde_json)
        .unwrap_or(Value::Null)
}

/// Concrete context for a single in-progress template evaluation.
///
/// Not safe for concurrent mutation; each evaluation thread owns its own
/// instance.
#[derive(Debug, Clone, Default)]
pub struct DeploymentContext {
    pub subscription: Subscription,
    pub resource_group: ResourceGroup,
    pub environment: CloudEnvironment,
    deployment_name: String,
    parameters: IndexMap<String, Value>,
    variables: IndexMap<String, Value>,
    copy_index: HashMap<String, CopyIndexState>,
    resource_types: Vec<(String, ResourceType)>,
}

impl DeploymentContext {
    pub fn new() -> Self {
        Self {
            deployment_name: "export".to_string(),
            ..Default::default()
        }
    }

    pub fn with_subscription(mut self, subscription: Subscription) -> Self {
        self.subscription = subscription;
        self
    }

    pub fn with_resource_group(mut self, resource_group: ResourceGroup) -> Self {
        self.resource_group = resource_group;
        self
    }

    pub fn set_deployment_name(&mut self, name: impl Into<String>) {
        self.deployment_name = name.into();
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: Value) {
        self.parameters.insert(name.into(), value);
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Enter or advance a copy loop. Pass the empty string for the
    /// unnamed loop.
    pub fn set_copy_index(&mut self, state: CopyIndexState) {
        self.copy_index.insert(state.name.clone(), state);
    }

    pub fn remove_copy_index(&mut self, loop_name: &str) {
        self.copy_index.remove(loop_name);
    }

    /// Register a resource type under a provider namespace, for providers().
    pub fn add_resource_type(&mut self, namespace: impl Into<String>, resource_type: ResourceType) {
        self.resource_types.push((namespace.into(), resource_type));
    }
}

impl TemplateContext for DeploymentContext {
    fn deployment(&self) -> Value {
        let mut obj = IndexMap::new();
        obj.insert(
            "name".to_string(),
            Value::String(self.deployment_name.clone()),
        );
        let mut properties = IndexMap::new();
        properties.insert(
            "template".to_string(),
            Value::Object(IndexMap::new()),
        );
        properties.insert("mode".to_string(), Value::String("Incremental".to_string()));
        obj.insert("properties".to_string(), Value::Object(properties));
        Value::Object(obj)
    }

    fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    fn resource_group(&self) -> &ResourceGroup {
        &self.resource_group
    }

    fn environment(&self) -> &CloudEnvironment {
        &self.environment
    }

    fn try_parameter(&self, name: &str) -> Option<Value> {
        self.parameters.get(name).cloned()
    }

    fn try_variable(&self, name: &str) -> Option<Value> {
        self.variables.get(name).cloned()
    }

    fn copy_index(&self, loop_name: &str) -> Option<&CopyIndexState> {
        self.copy_index.get(loop_name)
    }

    fn resource_types(&self, namespace: &str, resource_type: Option<&str>) -> Vec<ResourceType> {
        self.resource_types
            .iter()
            .filter(|(ns, rt)| {
                ns.eq_ignore_ascii_case(namespace)
                    && resource_type
                        .map(|t| rt.resource_type.eq_ignore_ascii_case(t))
                        .unwrap_or(true)
            })
            .map(|(_, rt)| rt.clone())
            .collect()
    }
}

impl Subscription {
    pub fn to_value(&self) -> Value {
        serialize_to_value(self)
    }
}

impl ResourceGroup {
    pub fn to_value(&self) -> Value {
        serialize_to_value(self)
    }
}

impl CloudEnvironment {
    pub fn to_value(&self) -> Value {
        serialize_to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parameter_and_variable_lookup() {
        let mut context = DeploymentContext::new();
        context.set_parameter("sku", Value::String("Standard".into()));
        context.set_variable("count", Value::Int(3));

        assert_eq!(
            context.try_parameter("sku"),
            Some(Value::String("Standard".into()))
        );
        assert_eq!(context.try_variable("count"), Some(Value::Int(3)));
        assert_eq!(context.try_parameter("missing"), None);
    }

    #[test]
    fn test_copy_index_state() {
        let mut context = DeploymentContext::new();
        context.set_copy_index(CopyIndexState {
            name: "".to_string(),
            index: 2,
            count: 5,
        });
        context.set_copy_index(CopyIndexState {
            name: "storage".to_string(),
            index: 1,
            count: 3,
        });

        assert_eq!(context.copy_index("").unwrap().index, 2);
        assert_eq!(context.copy_index("storage").unwrap().index, 1);
        assert!(context.copy_index("missing").is_none());
    }

    #[test]
    fn test_resource_type_filter() {
        let mut context = DeploymentContext::new();
        context.add_resource_type(
            "Microsoft.Network",
            ResourceType {
                resource_type: "virtualNetworks".to_string(),
                api_versions: vec!["2023-05-01".to_string()],
                locations: vec!["eastus".to_string()],
            },
        );
        context.add_resource_type(
            "Microsoft.Network",
            ResourceType {
                resource_type: "virtualNetworks/subnets".to_string(),
                api_versions: vec![],
                locations: vec![],
            },
        );

        assert_eq!(context.resource_types("Microsoft.Network", None).len(), 2);
        assert_eq!(
            context
                .resource_types("Microsoft.Network", Some("virtualNetworks"))
                .len(),
            1
        );
        assert!(context.resource_types("Microsoft.Storage", None).is_empty());
    }

    #[test]
    fn test_environment_to_value() {
        let env = CloudEnvironment::default();
        let value = env.to_value();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.get("name"), Some(&Value::String("AzureCloud".into())));
        assert!(obj.contains_key("authentication"));
        assert!(obj.contains_key("suffixes"));
    }
}
