//! The tree server gateway client.
//!
//! The server exposes three AJAX endpoints plus one plain navigation link:
//!
//! - `manage` (POST): performs one mutation (add, add-root, edit, delete,
//!   change-order) and returns the affected node.
//! - `load-children` (POST): returns the child nodes of a node, or the root
//!   nodes when the id is `null`.
//! - `click` (GET): returns the detail fragment (HTML or JSON) for a node,
//!   injected into the detail region by the view layer.
//! - `list` (GET): a regular navigation URL, never fetched by the client.
//!
//! Non-2xx responses surface the server's raw body text through
//! [`GatewayError::HttpStatus`](crate::error::GatewayError) so the view can
//! show it verbatim.
//!
//! # Example
//!
//! ```ignore
//! use horizon_canopy_net::{ManageRequest, TreeGateway};
//!
//! let gateway = TreeGateway::builder("https://app.example.com/tree")
//!     .click_param("nodeId")
//!     .build()?;
//!
//! let roots = gateway.load_children(None).await?;
//! let node = gateway.manage(&ManageRequest::edit(roots[0].id, "Reports")).await?;
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{GatewayError, Result};

/// Server-side identifier of a tree node.
pub type NodeId = i64;

/// One node as the server reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Server-side node id.
    pub id: NodeId,
    /// Display name.
    pub name: String,
    /// Whether the current user may mutate this node.
    pub manageable: bool,
    /// Position among siblings, ascending.
    pub order: i64,
    /// Whether the node has children (which may not be loaded yet).
    pub has_children: bool,
    /// Highest `order` among the node's children, 0 if none.
    #[serde(default)]
    pub last_children_order: i64,
}

/// The mutation kinds understood by the manage endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ManageAction {
    /// Create a node under a parent.
    Add,
    /// Create a top-level node.
    AddRoot,
    /// Rename a node.
    Edit,
    /// Delete a (childless) node.
    Delete,
    /// Set a node's `order` value.
    ChangeOrder,
}

/// JSON body of a manage call.
///
/// Only the fields relevant to the action are serialized.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManageRequest {
    /// The mutation to perform.
    pub action: ManageAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl ManageRequest {
    /// A request creating a child of `parent_id`.
    pub fn add(parent_id: NodeId, name: impl Into<String>, order: i64) -> Self {
        Self {
            action: ManageAction::Add,
            id: None,
            parent_id: Some(parent_id),
            name: Some(name.into()),
            order: Some(order),
        }
    }

    /// A request creating a top-level node.
    pub fn add_root(name: impl Into<String>, order: i64) -> Self {
        Self {
            action: ManageAction::AddRoot,
            id: None,
            parent_id: None,
            name: Some(name.into()),
            order: Some(order),
        }
    }

    /// A request renaming a node.
    pub fn edit(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            action: ManageAction::Edit,
            id: Some(id),
            parent_id: None,
            name: Some(name.into()),
            order: None,
        }
    }

    /// A request deleting a node.
    pub fn delete(id: NodeId) -> Self {
        Self {
            action: ManageAction::Delete,
            id: Some(id),
            parent_id: None,
            name: None,
            order: None,
        }
    }

    /// A request setting a node's order.
    pub fn change_order(id: NodeId, order: i64) -> Self {
        Self {
            action: ManageAction::ChangeOrder,
            id: Some(id),
            parent_id: None,
            name: None,
            order: Some(order),
        }
    }
}

/// Builder for configuring a [`TreeGateway`].
pub struct TreeGatewayBuilder {
    base_url: String,
    manage_path: String,
    load_children_path: String,
    click_path: String,
    click_param: String,
    list_path: String,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

impl TreeGatewayBuilder {
    /// Creates a builder rooted at `base_url`; endpoint paths are appended.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            manage_path: "/manage".to_string(),
            load_children_path: "/loadChildren".to_string(),
            click_path: "/click".to_string(),
            click_param: "id".to_string(),
            list_path: "/list".to_string(),
            timeout: None,
            client: None,
        }
    }

    /// Overrides the manage endpoint path.
    pub fn manage_path(mut self, path: impl Into<String>) -> Self {
        self.manage_path = path.into();
        self
    }

    /// Overrides the load-children endpoint path.
    pub fn load_children_path(mut self, path: impl Into<String>) -> Self {
        self.load_children_path = path.into();
        self
    }

    /// Overrides the click (detail) endpoint path.
    pub fn click_path(mut self, path: impl Into<String>) -> Self {
        self.click_path = path.into();
        self
    }

    /// Sets the query parameter name carrying the node id on click requests.
    pub fn click_param(mut self, name: impl Into<String>) -> Self {
        self.click_param = name.into();
        self
    }

    /// Overrides the list navigation path.
    pub fn list_path(mut self, path: impl Into<String>) -> Self {
        self.list_path = path.into();
        self
    }

    /// Sets a per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Uses an existing `reqwest` client instead of building one.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the gateway, validating the base URL.
    pub fn build(self) -> Result<TreeGateway> {
        let base_url = self.base_url.trim_end_matches('/').to_string();
        // Fail early on a malformed base rather than on the first call.
        Url::parse(&base_url)?;

        let client = match self.client {
            Some(client) => client,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build().map_err(GatewayError::from)?
            }
        };

        Ok(TreeGateway {
            client,
            base_url,
            manage_path: self.manage_path,
            load_children_path: self.load_children_path,
            click_path: self.click_path,
            click_param: self.click_param,
            list_path: self.list_path,
        })
    }
}

/// Client for the tree endpoints of one server-side tree.
///
/// Cheap to clone; clones share the underlying HTTP client.
#[derive(Clone)]
pub struct TreeGateway {
    client: reqwest::Client,
    base_url: String,
    manage_path: String,
    load_children_path: String,
    click_path: String,
    click_param: String,
    list_path: String,
}

impl TreeGateway {
    /// Creates a new builder for configuring a gateway.
    pub fn builder(base_url: impl Into<String>) -> TreeGatewayBuilder {
        TreeGatewayBuilder::new(base_url)
    }

    /// The configured base URL, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The plain navigation URL for the list action.
    ///
    /// This is a regular link target, never fetched by the client.
    pub fn list_url(&self) -> String {
        format!("{}{}", self.base_url, self.list_path)
    }

    /// Performs one mutation and returns the node as the server now sees it.
    pub async fn manage(&self, request: &ManageRequest) -> Result<NodeRecord> {
        tracing::debug!(
            target: "horizon_canopy_net::gateway",
            action = ?request.action,
            id = ?request.id,
            "manage"
        );

        let url = self.endpoint(&self.manage_path)?;
        let response = self.client.post(url).json(request).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<NodeRecord>().await?)
    }

    /// Fetches the children of `id`, or the root nodes when `id` is `None`.
    pub async fn load_children(&self, id: Option<NodeId>) -> Result<Vec<NodeRecord>> {
        tracing::debug!(target: "horizon_canopy_net::gateway", id = ?id, "load_children");

        let url = self.endpoint(&self.load_children_path)?;
        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "id": id }))
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<Vec<NodeRecord>>().await?)
    }

    /// Fetches the detail fragment (HTML or JSON) for a node.
    pub async fn fetch_detail(&self, id: NodeId) -> Result<String> {
        tracing::debug!(target: "horizon_canopy_net::gateway", id, "fetch_detail");

        let mut url = self.endpoint(&self.click_path)?;
        url.query_pairs_mut()
            .append_pair(&self.click_param, &id.to_string());
        let response = self.client.get(url).send().await?;
        let response = check_status(response).await?;
        Ok(response.text().await?)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}{}", self.base_url, path))?)
    }
}

/// Maps non-2xx responses to `HttpStatus`, keeping the raw body text.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        None
    } else {
        Some(body)
    };
    tracing::warn!(
        target: "horizon_canopy_net::gateway",
        status = status.as_u16(),
        has_body = message.is_some(),
        "gateway call failed"
    );
    Err(GatewayError::HttpStatus {
        status: status.as_u16(),
        message,
    })
}

impl std::fmt::Debug for TreeGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeGateway")
            .field("base_url", &self.base_url)
            .field("click_param", &self.click_param)
            .finish()
    }
}
