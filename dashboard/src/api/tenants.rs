use shared::Tenant;

use crate::api::cache::CacheTag;
use crate::api::client::ApiClient;
use crate::error::Result;

impl ApiClient {
    /// All tenants, for the tenant selector
    pub async fn list_tenants(&self) -> Result<Vec<Tenant>> {
        self.get_json("tenants", vec![], vec![CacheTag::TenantList]).await
    }
}

/// Tenant matching `tenant_id`, else the first tenant listed
pub fn resolve_tenant<'a>(tenants: &'a [Tenant], tenant_id: Option<&str>) -> Option<&'a Tenant> {
    tenant_id
        .and_then(|id| tenants.iter().find(|t| t.tenant_id == id))
        .or_else(|| tenants.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::cache::RequestCache;
    use crate::api::transport::ScriptedTransport;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn tenant(id: &str, name: &str) -> Tenant {
        Tenant {
            tenant_id: id.to_string(),
            name: name.to_string(),
            created_at: None,
        }
    }

    #[test]
    fn test_resolve_tenant() {
        let tenants = vec![tenant("t1", "Acme"), tenant("t2", "Globex")];

        assert_eq!(resolve_tenant(&tenants, Some("t2")).map(|t| t.name.as_str()), Some("Globex"));
        assert_eq!(resolve_tenant(&tenants, Some("gone")).map(|t| t.name.as_str()), Some("Acme"));
        assert_eq!(resolve_tenant(&tenants, None).map(|t| t.name.as_str()), Some("Acme"));
        assert_eq!(resolve_tenant(&[], Some("t1")), None);
    }

    #[tokio::test]
    async fn test_list_tenants_is_cached() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(
            200,
            json!([
                {"tenantId": "t1", "name": "Acme", "createdAt": "2024-01-05T10:00:00Z"},
                {"tenantId": "t2", "name": "Globex", "createdAt": "2024-02-01T08:30:00+02:00"}
            ]),
        );
        let client = ApiClient::new(
            "https://api.example.com/api",
            None,
            Arc::clone(&transport) as Arc<dyn crate::api::transport::HttpTransport>,
            Arc::new(RequestCache::new_default()),
        );

        let first = client.list_tenants().await.unwrap();
        let second = client.list_tenants().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first[1].name, "Globex");
        assert_eq!(transport.request_count(), 1);
        assert_eq!(transport.requests()[0].url, "https://api.example.com/api/tenants");
    }
}
