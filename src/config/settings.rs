use serde::Deserialize;

/// Top-level configuration settings for the hub.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub admin: AdminSettings,
    pub broker: BrokerSettings,
    pub log: LogSettings,
}

/// Where the WebSocket endpoint binds.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Where the debug/export HTTP endpoints bind.
///
/// When `token` is set, admin requests must present it as a bearer token.
#[derive(Debug, Deserialize, Clone)]
pub struct AdminSettings {
    pub host: String,
    pub port: u16,
    pub token: Option<String>,
}

/// Broker tuning.
///
/// `max_track_positions` caps how many positions a single track keeps; the
/// oldest are evicted first. `0` keeps every position.
#[derive(Debug, Deserialize, Clone)]
pub struct BrokerSettings {
    pub max_track_positions: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub admin: Option<PartialAdminSettings>,
    pub broker: Option<PartialBrokerSettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialAdminSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub max_track_positions: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            admin: AdminSettings {
                host: "127.0.0.1".to_string(),
                port: 8081,
                token: None,
            },
            broker: BrokerSettings {
                max_track_positions: 0,
            },
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl Settings {
    /// Overlay whatever the partial settings provide onto the defaults.
    pub fn merge(partial: PartialSettings) -> Self {
        let default = Settings::default();

        Settings {
            server: ServerSettings {
                host: partial
                    .server
                    .as_ref()
                    .and_then(|s| s.host.clone())
                    .unwrap_or(default.server.host),
                port: partial
                    .server
                    .as_ref()
                    .and_then(|s| s.port)
                    .unwrap_or(default.server.port),
            },
            admin: AdminSettings {
                host: partial
                    .admin
                    .as_ref()
                    .and_then(|a| a.host.clone())
                    .unwrap_or(default.admin.host),
                port: partial
                    .admin
                    .as_ref()
                    .and_then(|a| a.port)
                    .unwrap_or(default.admin.port),
                token: partial
                    .admin
                    .as_ref()
                    .and_then(|a| a.token.clone())
                    .filter(|t| !t.is_empty())
                    .or(default.admin.token),
            },
            broker: BrokerSettings {
                max_track_positions: partial
                    .broker
                    .as_ref()
                    .and_then(|b| b.max_track_positions)
                    .unwrap_or(default.broker.max_track_positions),
            },
            log: LogSettings {
                level: partial
                    .log
                    .as_ref()
                    .and_then(|l| l.level.clone())
                    .unwrap_or(default.log.level),
            },
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn admin_addr(&self) -> String {
        format!("{}:{}", self.admin.host, self.admin.port)
    }
}
