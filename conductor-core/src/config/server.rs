use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use utoipa::ToSchema;

pub const DEFAULT_SERVER_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_API_KEY_HEADER: &str = "x-api-key";

/// Static description of how to reach one tool server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerBinding {
    pub name: String,
    pub transport: ServerTransport,
    pub timeout: Duration,
}

impl ServerBinding {
    pub fn stdio(name: impl Into<String>, command: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            transport: ServerTransport::Stdio(StdioParams {
                command: command.into(),
                args,
                env: HashMap::new(),
                workdir: None,
            }),
            timeout: DEFAULT_SERVER_TIMEOUT,
        }
    }

    pub fn event_stream(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transport: ServerTransport::EventStream(EventStreamParams {
                url: url.into(),
                headers: BTreeMap::new(),
                auth: ServerAuth::None,
            }),
            timeout: DEFAULT_SERVER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn kind(&self) -> TransportKind {
        self.transport.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerTransport {
    Stdio(StdioParams),
    EventStream(EventStreamParams),
}

impl ServerTransport {
    pub fn kind(&self) -> TransportKind {
        match self {
            ServerTransport::Stdio(_) => TransportKind::Stdio,
            ServerTransport::EventStream(_) => TransportKind::EventStream,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdioParams {
    pub command: PathBuf,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub workdir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventStreamParams {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub auth: ServerAuth,
}

/// Header-based credentials presented when opening an event stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ServerAuth {
    #[default]
    None,
    ApiKey {
        header: String,
        key: String,
    },
    Bearer {
        token: String,
    },
    Basic {
        username: String,
        password: String,
    },
    /// Exchange client credentials for a bearer token before connecting.
    TokenEndpoint {
        url: String,
        client_id: String,
        client_secret: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    Stdio,
    #[serde(rename = "sse")]
    EventStream,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Stdio => f.write_str("stdio"),
            TransportKind::EventStream => f.write_str("sse"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawServer {
    name: String,
    #[serde(default)]
    transport: Option<String>,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default)]
    workdir: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    auth: Option<RawAuth>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum RawAuth {
    ApiKey {
        #[serde(default)]
        header: Option<String>,
        key: String,
    },
    Bearer {
        token: String,
    },
    Basic {
        username: String,
        password: String,
    },
    TokenEndpoint {
        url: String,
        client_id: String,
        client_secret: String,
    },
}

fn expand(value: &str) -> String {
    shellexpand::full(value)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

impl From<RawAuth> for ServerAuth {
    fn from(raw: RawAuth) -> Self {
        match raw {
            RawAuth::ApiKey { header, key } => ServerAuth::ApiKey {
                header: header.unwrap_or_else(|| DEFAULT_API_KEY_HEADER.to_string()),
                key: expand(&key),
            },
            RawAuth::Bearer { token } => ServerAuth::Bearer {
                token: expand(&token),
            },
            RawAuth::Basic { username, password } => ServerAuth::Basic {
                username: expand(&username),
                password: expand(&password),
            },
            RawAuth::TokenEndpoint {
                url,
                client_id,
                client_secret,
            } => ServerAuth::TokenEndpoint {
                url: expand(&url),
                client_id: expand(&client_id),
                client_secret: expand(&client_secret),
            },
        }
    }
}

impl TryFrom<RawServer> for ServerBinding {
    type Error = ConfigError;

    fn try_from(raw: RawServer) -> Result<Self, Self::Error> {
        let name = raw.name.trim().to_string();
        let invalid = |reason: &str| ConfigError::InvalidServer {
            server: name.clone(),
            reason: reason.to_string(),
        };
        if name.is_empty() {
            return Err(invalid("name must not be empty"));
        }

        let declared = raw.transport.as_deref().map(str::to_ascii_lowercase);
        let kind = match (declared.as_deref(), &raw.command, &raw.url) {
            (Some("stdio"), _, _) => TransportKind::Stdio,
            (Some("sse") | Some("event-stream") | Some("event_stream"), _, _) => {
                TransportKind::EventStream
            }
            (Some(_), _, _) => return Err(invalid("transport must be 'stdio' or 'sse'")),
            (None, Some(_), None) => TransportKind::Stdio,
            (None, None, Some(_)) => TransportKind::EventStream,
            (None, Some(_), Some(_)) => {
                return Err(invalid("set either 'command' or 'url', not both"));
            }
            (None, None, None) => return Err(invalid("missing 'command' or 'url'")),
        };

        let transport = match kind {
            TransportKind::Stdio => {
                let command = raw
                    .command
                    .as_deref()
                    .ok_or_else(|| invalid("stdio transport requires 'command'"))?;
                if raw.auth.is_some() {
                    return Err(invalid("'auth' only applies to sse transports"));
                }
                ServerTransport::Stdio(StdioParams {
                    command: PathBuf::from(expand(command)),
                    args: raw.args.iter().map(|arg| expand(arg)).collect(),
                    env: raw
                        .env
                        .into_iter()
                        .map(|(key, value)| (key, expand(&value)))
                        .collect(),
                    workdir: raw.workdir.map(|dir| PathBuf::from(expand(&dir))),
                })
            }
            TransportKind::EventStream => {
                let url = raw
                    .url
                    .as_deref()
                    .ok_or_else(|| invalid("sse transport requires 'url'"))?;
                let url = expand(url);
                if reqwest::Url::parse(&url).is_err() {
                    return Err(invalid("'url' is not an absolute URL"));
                }
                ServerTransport::EventStream(EventStreamParams {
                    url,
                    headers: raw
                        .headers
                        .into_iter()
                        .map(|(key, value)| (key, expand(&value)))
                        .collect(),
                    auth: raw.auth.map(ServerAuth::from).unwrap_or_default(),
                })
            }
        };

        let timeout = match raw.timeout_secs {
            Some(0) => return Err(invalid("timeout_secs must be greater than zero")),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_SERVER_TIMEOUT,
        };

        Ok(ServerBinding {
            name,
            transport,
            timeout,
        })
    }
}
