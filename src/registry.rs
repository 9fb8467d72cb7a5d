//! Capability registry
//!
//! Maps protocol method names to resource-read, tool-invoke and
//! prompt-generate handlers. Method names are parsed once into an
//! enumerated identifier; past that point dispatch is an exhaustive match,
//! not string-keyed reflection. Handlers close over the upstream proxy
//! client or the health evaluator; prompts are pure and perform no I/O.

use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::idempotency::IdempotencyKey;
use crate::model::{Agent, Queue, RequestRecord, Role, Task, Tenant, Workbench};
use crate::protocol::{
    Content, Info, InitializeResult, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION, Prompt,
    PromptArgument, PromptMessage, PromptsCapability, PromptsGetParams, PromptsGetResult, PromptsListResult, Resource,
    ResourcesCapability, ResourcesListResult, ResourcesReadParams, ResourcesReadResult,
    ServerCapabilities, Tool, ToolAnnotations, ToolsCallParams, ToolsCallResult, ToolsCapability,
    ToolsListResult,
};
use crate::upstream::UpstreamClient;
use crate::{Error, Result, health};

/// Protocol methods served by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Capability negotiation
    Initialize,
    /// Liveness probe
    Ping,
    /// List registered resources
    ResourcesList,
    /// Read one resource by URI
    ResourcesRead,
    /// List registered tools
    ToolsList,
    /// Invoke a tool
    ToolsCall,
    /// List registered prompts
    PromptsList,
    /// Generate a prompt's message sequence
    PromptsGet,
}

impl Method {
    /// Parse a JSON-RPC method name. `None` means `MethodNotFound`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "initialize" => Some(Self::Initialize),
            "ping" => Some(Self::Ping),
            "resources/list" => Some(Self::ResourcesList),
            "resources/read" => Some(Self::ResourcesRead),
            "tools/list" => Some(Self::ToolsList),
            "tools/call" => Some(Self::ToolsCall),
            "prompts/list" => Some(Self::PromptsList),
            "prompts/get" => Some(Self::PromptsGet),
            _ => None,
        }
    }
}

/// Operations-center entity kinds exposed as `ops://` resources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// Tenants
    Tenant,
    /// Workbenches
    Workbench,
    /// Requests
    Request,
    /// Tasks
    Task,
    /// Queues
    Queue,
    /// Roles
    Role,
    /// Agents
    Agent,
}

impl EntityKind {
    /// All entity kinds, in catalog order
    pub const ALL: [Self; 7] = [
        Self::Tenant,
        Self::Workbench,
        Self::Request,
        Self::Task,
        Self::Queue,
        Self::Role,
        Self::Agent,
    ];

    /// URI segment (`ops://{segment}/...`)
    #[must_use]
    pub fn segment(self) -> &'static str {
        match self {
            Self::Tenant => "tenant",
            Self::Workbench => "workbench",
            Self::Request => "request",
            Self::Task => "task",
            Self::Queue => "queue",
            Self::Role => "role",
            Self::Agent => "agent",
        }
    }

    /// Upstream collection path
    #[must_use]
    pub fn collection(self) -> &'static str {
        match self {
            Self::Tenant => "tenants",
            Self::Workbench => "workbenches",
            Self::Request => "requests",
            Self::Task => "tasks",
            Self::Queue => "queues",
            Self::Role => "roles",
            Self::Agent => "agents",
        }
    }

    fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.segment() == segment)
    }
}

/// Parsed `ops://` resource URI
#[derive(Debug, Clone, PartialEq, Eq)]
enum ResourceTarget {
    /// Paginated collection (`ops://{entity}/list`)
    List(EntityKind),
    /// Single entity (`ops://{entity}/{id}`)
    Single(EntityKind, i64),
}

impl ResourceTarget {
    fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("ops://")
            .ok_or_else(|| Error::InvalidParams(format!("unsupported resource URI: {uri}")))?;
        let (segment, tail) = rest
            .split_once('/')
            .ok_or_else(|| Error::InvalidParams(format!("malformed resource URI: {uri}")))?;
        let kind = EntityKind::from_segment(segment)
            .ok_or_else(|| Error::NotFound(format!("unknown resource: {uri}")))?;

        if tail == "list" {
            Ok(Self::List(kind))
        } else {
            tail.parse::<i64>()
                .map(|id| Self::Single(kind, id))
                .map_err(|_| Error::InvalidParams(format!("invalid entity id in URI: {uri}")))
        }
    }
}

// ── Tool argument bundles ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ComputeHealthArgs {
    #[serde(rename = "createdAt")]
    created_at: String,
    threshold_seconds: f64,
}

#[derive(Debug, Deserialize)]
struct CreateRequestArgs {
    tenant_id: i64,
    workbench_id: i64,
    payload: Value,
    idempotency_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateTaskStatusArgs {
    task_id: i64,
    status: String,
    idempotency_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeleteQueueArgs {
    queue_id: i64,
    idempotency_key: Option<String>,
}

/// Capability registry: read-only after construction and shared across
/// requests behind an `Arc`.
pub struct Registry {
    upstream: Arc<UpstreamClient>,
    server_info: Info,
}

impl Registry {
    /// Create a registry dispatching to `upstream`.
    #[must_use]
    pub fn new(upstream: Arc<UpstreamClient>) -> Self {
        Self {
            upstream,
            server_info: Info {
                name: "opscenter-gateway".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: Some(
                    "Operations-center gateway: tenants, workbenches, requests, tasks, \
                     queues, roles and agents over JSON-RPC"
                        .to_string(),
                ),
            },
        }
    }

    /// Server identity advertised by `initialize` and the discovery endpoint.
    #[must_use]
    pub fn server_info(&self) -> &Info {
        &self.server_info
    }

    /// Static resource catalog: one paginated list per entity kind.
    /// Single-entity reads use `ops://{entity}/{id}` against the same kinds.
    #[must_use]
    pub fn resources(&self) -> Vec<Resource> {
        EntityKind::ALL
            .into_iter()
            .map(|kind| Resource {
                uri: format!("ops://{}/list", kind.segment()),
                name: format!("{}_list", kind.segment()),
                description: Some(format!(
                    "Paginated list of {} from the operations-center API",
                    kind.collection()
                )),
                mime_type: Some("application/json".to_string()),
            })
            .collect()
    }

    /// Static tool catalog.
    #[must_use]
    pub fn tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: "compute_health".to_string(),
                description: Some(
                    "Judge SLA compliance for an event: was the elapsed time since \
                     createdAt within threshold_seconds?"
                        .to_string(),
                ),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "createdAt": {"type": "string", "description": "Event timestamp (RFC 3339; naive values are UTC)"},
                        "threshold_seconds": {"type": "number", "description": "Allowed elapsed seconds (inclusive)"}
                    },
                    "required": ["createdAt", "threshold_seconds"]
                }),
                annotations: Some(ToolAnnotations {
                    read_only_hint: Some(true),
                    idempotent_hint: Some(true),
                }),
            },
            Tool {
                name: "create_request".to_string(),
                description: Some("Create a request in the operations center".to_string()),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "tenant_id": {"type": "integer"},
                        "workbench_id": {"type": "integer"},
                        "payload": {"type": "object"},
                        "idempotency_key": {"type": "string", "description": "Optional deduplication key; generated when omitted"}
                    },
                    "required": ["tenant_id", "workbench_id", "payload"]
                }),
                annotations: Some(ToolAnnotations {
                    read_only_hint: Some(false),
                    idempotent_hint: Some(true),
                }),
            },
            Tool {
                name: "update_task_status".to_string(),
                description: Some("Update the status of an existing task".to_string()),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "task_id": {"type": "integer"},
                        "status": {"type": "string"},
                        "idempotency_key": {"type": "string", "description": "Optional deduplication key; generated when omitted"}
                    },
                    "required": ["task_id", "status"]
                }),
                annotations: Some(ToolAnnotations {
                    read_only_hint: Some(false),
                    idempotent_hint: Some(true),
                }),
            },
            Tool {
                name: "delete_queue".to_string(),
                description: Some("Delete a queue from the operations center".to_string()),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "queue_id": {"type": "integer"},
                        "idempotency_key": {"type": "string", "description": "Optional deduplication key; generated when omitted"}
                    },
                    "required": ["queue_id"]
                }),
                annotations: Some(ToolAnnotations {
                    read_only_hint: Some(false),
                    idempotent_hint: Some(true),
                }),
            },
        ]
    }

    /// Static prompt catalog.
    #[must_use]
    pub fn prompts(&self) -> Vec<Prompt> {
        vec![
            Prompt {
                name: "task_summary".to_string(),
                description: Some("Ask for a summary of one task".to_string()),
                arguments: vec![PromptArgument {
                    name: "task_id".to_string(),
                    description: Some("Task id to summarize".to_string()),
                    required: true,
                }],
            },
            Prompt {
                name: "request_triage".to_string(),
                description: Some("Ask for a triage recommendation for one request".to_string()),
                arguments: vec![PromptArgument {
                    name: "request_id".to_string(),
                    description: Some("Request id to triage".to_string()),
                    required: true,
                }],
            },
        ]
    }

    /// Dispatch one JSON-RPC request to its handler and wrap the outcome in
    /// a JSON-RPC response.
    pub async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!(method = %request.method, id = %request.id, "Dispatching");
        let id = request.id;
        match self.handle(&request.method, request.params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => {
                let code = err.to_rpc_code();
                if let Error::Upstream { status, body } = &err {
                    JsonRpcResponse::error_with_data(
                        Some(id),
                        code,
                        err.to_string(),
                        json!({"status": status, "body": body}),
                    )
                } else {
                    JsonRpcResponse::error(Some(id), code, err.to_string())
                }
            }
        }
    }

    async fn handle(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let method =
            Method::parse(method).ok_or_else(|| Error::MethodNotFound(method.to_string()))?;

        match method {
            Method::Initialize => to_value(self.initialize()),
            Method::Ping => Ok(json!({})),
            Method::ResourcesList => to_value(ResourcesListResult {
                resources: self.resources(),
                next_cursor: None,
            }),
            Method::ResourcesRead => {
                let params: ResourcesReadParams = decode_params(params)?;
                self.read_resource(params).await
            }
            Method::ToolsList => to_value(ToolsListResult {
                tools: self.tools(),
                next_cursor: None,
            }),
            Method::ToolsCall => {
                let params: ToolsCallParams = decode_params(params)?;
                self.call_tool(params).await
            }
            Method::PromptsList => to_value(PromptsListResult {
                prompts: self.prompts(),
                next_cursor: None,
            }),
            Method::PromptsGet => {
                let params: PromptsGetParams = decode_params(params)?;
                to_value(self.get_prompt(&params)?)
            }
        }
    }

    /// Fixed capability descriptor returned by `initialize`.
    fn initialize(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                resources: Some(ResourcesCapability::default()),
                tools: Some(ToolsCapability::default()),
                prompts: Some(PromptsCapability::default()),
            },
            server_info: self.server_info.clone(),
            instructions: None,
        }
    }

    async fn read_resource(&self, params: ResourcesReadParams) -> Result<Value> {
        let payload = match ResourceTarget::parse(&params.uri)? {
            ResourceTarget::List(kind) => {
                self.list_entities(kind, params.cursor.as_deref()).await?
            }
            ResourceTarget::Single(kind, id) => self.fetch_entity(kind, id).await?,
        };

        to_value(ResourcesReadResult {
            contents: vec![crate::protocol::ResourceContents {
                uri: params.uri,
                mime_type: Some("application/json".to_string()),
                text: serde_json::to_string(&payload)?,
            }],
        })
    }

    /// Read one page of a collection through the typed paginated envelope.
    async fn list_entities(&self, kind: EntityKind, cursor: Option<&str>) -> Result<Value> {
        let collection = kind.collection();
        match kind {
            EntityKind::Tenant => to_value(self.upstream.list::<Tenant>(collection, cursor).await?),
            EntityKind::Workbench => {
                to_value(self.upstream.list::<Workbench>(collection, cursor).await?)
            }
            EntityKind::Request => {
                to_value(self.upstream.list::<RequestRecord>(collection, cursor).await?)
            }
            EntityKind::Task => to_value(self.upstream.list::<Task>(collection, cursor).await?),
            EntityKind::Queue => to_value(self.upstream.list::<Queue>(collection, cursor).await?),
            EntityKind::Role => to_value(self.upstream.list::<Role>(collection, cursor).await?),
            EntityKind::Agent => to_value(self.upstream.list::<Agent>(collection, cursor).await?),
        }
    }

    async fn fetch_entity(&self, kind: EntityKind, id: i64) -> Result<Value> {
        let collection = kind.collection();
        match kind {
            EntityKind::Tenant => to_value(self.upstream.get::<Tenant>(collection, id).await?),
            EntityKind::Workbench => {
                to_value(self.upstream.get::<Workbench>(collection, id).await?)
            }
            EntityKind::Request => {
                to_value(self.upstream.get::<RequestRecord>(collection, id).await?)
            }
            EntityKind::Task => to_value(self.upstream.get::<Task>(collection, id).await?),
            EntityKind::Queue => to_value(self.upstream.get::<Queue>(collection, id).await?),
            EntityKind::Role => to_value(self.upstream.get::<Role>(collection, id).await?),
            EntityKind::Agent => to_value(self.upstream.get::<Agent>(collection, id).await?),
        }
    }

    async fn call_tool(&self, params: ToolsCallParams) -> Result<Value> {
        match params.name.as_str() {
            "compute_health" => {
                let args: ComputeHealthArgs = decode_args(params.arguments)?;
                let status = health::evaluate(&args.created_at, args.threshold_seconds)?;
                tool_result(&status)
            }
            "create_request" => {
                let args: CreateRequestArgs = decode_args(params.arguments)?;
                // One key per logical operation: the client key passes
                // through unchanged, otherwise generate once per invocation.
                // A failed call is never retried here under a fresh key.
                let key = idempotency_key(args.idempotency_key);
                let body = json!({
                    "tenantId": args.tenant_id,
                    "workbenchId": args.workbench_id,
                    "payload": args.payload,
                });
                let created = self.upstream.create("requests", &body, &key).await?;
                tool_result(&created)
            }
            "update_task_status" => {
                let args: UpdateTaskStatusArgs = decode_args(params.arguments)?;
                let key = idempotency_key(args.idempotency_key);
                let body = json!({"status": args.status});
                let updated = self
                    .upstream
                    .update("tasks", args.task_id, &body, &key)
                    .await?;
                tool_result(&updated)
            }
            "delete_queue" => {
                let args: DeleteQueueArgs = decode_args(params.arguments)?;
                let key = idempotency_key(args.idempotency_key);
                self.upstream.delete("queues", args.queue_id, &key).await?;
                tool_result(&json!({"deleted": true, "id": args.queue_id}))
            }
            other => Err(Error::MethodNotFound(format!("unknown tool: {other}"))),
        }
    }

    /// Prompt handlers are pure: no proxy client, no I/O.
    fn get_prompt(&self, params: &PromptsGetParams) -> Result<PromptsGetResult> {
        match params.name.as_str() {
            "task_summary" => {
                let task_id = required_argument(params, "task_id")?;
                Ok(PromptsGetResult {
                    description: Some("Task summary request".to_string()),
                    messages: vec![
                        user_message("Please summarize task details for ID:"),
                        user_message(task_id),
                    ],
                })
            }
            "request_triage" => {
                let request_id = required_argument(params, "request_id")?;
                Ok(PromptsGetResult {
                    description: Some("Request triage recommendation".to_string()),
                    messages: vec![
                        user_message(
                            "Review this operations-center request and recommend a queue, \
                             priority and assignee. Request ID:",
                        ),
                        user_message(request_id),
                    ],
                })
            }
            other => Err(Error::MethodNotFound(format!("unknown prompt: {other}"))),
        }
    }
}

fn idempotency_key(client_key: Option<String>) -> IdempotencyKey {
    client_key.map_or_else(IdempotencyKey::generate, IdempotencyKey::from_client)
}

fn user_message(text: &str) -> PromptMessage {
    PromptMessage {
        role: "user".to_string(),
        content: Content::text(text),
    }
}

fn required_argument<'a>(params: &'a PromptsGetParams, name: &str) -> Result<&'a str> {
    params
        .arguments
        .as_ref()
        .and_then(|args| args.get(name))
        .map(String::as_str)
        .ok_or_else(|| Error::InvalidParams(format!("missing required argument: {name}")))
}

/// Wrap a handler result in the protocol's content envelope.
fn tool_result<T: serde::Serialize>(value: &T) -> Result<Value> {
    to_value(ToolsCallResult {
        content: vec![Content::text(serde_json::to_string(value)?)],
        is_error: false,
    })
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn decode_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T> {
    serde_json::from_value(params.unwrap_or_else(|| json!({})))
        .map_err(|e| Error::InvalidParams(e.to_string()))
}

fn decode_args<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| Error::InvalidParams(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;
    use crate::protocol::RequestId;

    fn registry() -> Registry {
        // Points at an unreachable mock host; tests below never touch it.
        let upstream = UpstreamClient::new(&UpstreamConfig::default()).unwrap();
        Registry::new(Arc::new(upstream))
    }

    fn request(method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: RequestId::Number(1),
            method: method.to_string(),
            params,
        }
    }

    // ── Method / URI parsing ──────────────────────────────────────────────

    #[test]
    fn method_parse_covers_all_served_methods() {
        assert_eq!(Method::parse("initialize"), Some(Method::Initialize));
        assert_eq!(Method::parse("resources/read"), Some(Method::ResourcesRead));
        assert_eq!(Method::parse("tools/call"), Some(Method::ToolsCall));
        assert_eq!(Method::parse("prompts/get"), Some(Method::PromptsGet));
        assert_eq!(Method::parse("resources/subscribe"), None);
        assert_eq!(Method::parse(""), None);
    }

    #[test]
    fn resource_target_parses_list_and_single() {
        assert_eq!(
            ResourceTarget::parse("ops://tenant/list").unwrap(),
            ResourceTarget::List(EntityKind::Tenant)
        );
        assert_eq!(
            ResourceTarget::parse("ops://task/42").unwrap(),
            ResourceTarget::Single(EntityKind::Task, 42)
        );
    }

    #[test]
    fn resource_target_rejects_foreign_schemes_and_bad_ids() {
        assert!(matches!(
            ResourceTarget::parse("file:///etc/passwd").unwrap_err(),
            Error::InvalidParams(_)
        ));
        assert!(matches!(
            ResourceTarget::parse("ops://tenant/abc").unwrap_err(),
            Error::InvalidParams(_)
        ));
        assert!(matches!(
            ResourceTarget::parse("ops://warehouse/list").unwrap_err(),
            Error::NotFound(_)
        ));
    }

    // ── Catalogs ──────────────────────────────────────────────────────────

    #[test]
    fn catalogs_cover_every_entity_and_capability_kind() {
        let registry = registry();
        assert_eq!(registry.resources().len(), EntityKind::ALL.len());
        assert_eq!(registry.tools().len(), 4);
        assert_eq!(registry.prompts().len(), 2);
        assert!(
            registry
                .resources()
                .iter()
                .any(|r| r.uri == "ops://tenant/list")
        );
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn initialize_returns_static_descriptor() {
        let response = registry().dispatch(request("initialize", None)).await;
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "opscenter-gateway");
        assert!(result["capabilities"]["resources"].is_object());
        assert!(result["capabilities"]["tools"].is_object());
        assert!(result["capabilities"]["prompts"].is_object());
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let response = registry().dispatch(request("frobnicate", None)).await;
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn missing_required_field_is_invalid_params() {
        let params = json!({"name": "compute_health", "arguments": {"createdAt": "2026-01-01T00:00:00Z"}});
        let response = registry().dispatch(request("tools/call", Some(params))).await;
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn unknown_tool_is_method_not_found() {
        let params = json!({"name": "launch_rockets", "arguments": {}});
        let response = registry().dispatch(request("tools/call", Some(params))).await;
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn compute_health_runs_without_upstream() {
        let params = json!({
            "name": "compute_health",
            "arguments": {"createdAt": "2020-01-01T00:00:00Z", "threshold_seconds": 60.0}
        });
        let response = registry().dispatch(request("tools/call", Some(params))).await;
        let result = response.result.unwrap();
        let text = result["content"][0]["text"].as_str().unwrap();
        let status: Value = serde_json::from_str(text).unwrap();
        assert_eq!(status["slaMet"], false);
        assert_eq!(status["threshold"], 60.0);
    }

    #[tokio::test]
    async fn prompts_are_pure_and_parameterized() {
        let params = json!({"name": "task_summary", "arguments": {"task_id": "17"}});
        let response = registry().dispatch(request("prompts/get", Some(params))).await;
        let result = response.result.unwrap();
        let messages = result["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[1]["content"]["text"], "17");
    }

    #[tokio::test]
    async fn prompt_without_required_argument_is_invalid_params() {
        let params = json!({"name": "task_summary"});
        let response = registry().dispatch(request("prompts/get", Some(params))).await;
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn tools_list_and_prompts_list_have_no_cursor() {
        let registry = registry();
        let tools = registry.dispatch(request("tools/list", None)).await;
        assert!(tools.result.unwrap().get("nextCursor").is_none());
        let prompts = registry.dispatch(request("prompts/list", None)).await;
        assert!(prompts.result.unwrap().get("nextCursor").is_none());
    }
}
