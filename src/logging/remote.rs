// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Export of entries to a remote log aggregator.
//!
//! The network client is supplied by the embedding application through
//! [`RemoteConnector`]; this module owns the mapping from entries to the
//! aggregator's payload shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::entry::{aggregator_severity, Field, LogEntry};
use super::pipeline::CloseFn;
use super::sink::LogSink;
use super::{Level, LogError};

/// Monitored resource the exported entries are attributed to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredResource {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// One entry as delivered to the aggregator client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteEntry {
    pub timestamp: DateTime<Utc>,
    pub severity: &'static str,
    pub payload: Map<String, Value>,
}

/// Client for a connected aggregator
pub trait RemoteClient: Send + Sync {
    /// Queue an entry for delivery
    fn log(&self, entry: RemoteEntry);

    /// Deliver everything queued so far
    fn flush(&self) -> anyhow::Result<()>;

    /// Flush and release the connection
    fn close(&self) -> anyhow::Result<()>;
}

/// Factory for [`RemoteClient`]s, invoked while a configuration is applied
pub trait RemoteConnector: Send + Sync {
    fn connect(&self, export: &RemoteExport) -> anyhow::Result<Arc<dyn RemoteClient>>;
}

/// Where and how to export entries remotely
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteExport {
    /// Project that owns the log; required
    pub project: String,
    /// Project billed for the API calls; defaults to `project` when empty
    pub quota_project: String,
    pub log_name: String,
    pub resource: Option<MonitoredResource>,
    #[serde(skip)]
    pub connector: Option<Arc<dyn RemoteConnector>>,
}

impl RemoteExport {
    pub fn new(project: impl Into<String>, log_name: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            log_name: log_name.into(),
            ..Default::default()
        }
    }

    pub fn with_connector(mut self, connector: Arc<dyn RemoteConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Project billed for the export
    pub fn billing_project(&self) -> &str {
        if self.quota_project.is_empty() {
            &self.project
        } else {
            &self.quota_project
        }
    }
}

impl fmt::Debug for RemoteExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteExport")
            .field("project", &self.project)
            .field("quota_project", &self.quota_project)
            .field("log_name", &self.log_name)
            .field("resource", &self.resource)
            .field("connector", &self.connector.is_some())
            .finish()
    }
}

/// Sink forwarding entries to a [`RemoteClient`]
pub struct RemoteSink {
    client: Arc<dyn RemoteClient>,
    threshold: Level,
    fields: Vec<Field>,
}

impl RemoteSink {
    pub fn new(client: Arc<dyn RemoteClient>, threshold: Level) -> Self {
        Self {
            client,
            threshold,
            fields: Vec::new(),
        }
    }

    /// Connect using the export's connector.
    ///
    /// Returns the sink and a hook that closes the client, to be run when the
    /// owning pipeline closes.
    pub fn connect(export: &RemoteExport, threshold: Level) -> Result<(Self, CloseFn), LogError> {
        if export.project.is_empty() {
            return Err(LogError::MissingRemoteTarget);
        }
        let connector = export
            .connector
            .as_ref()
            .ok_or_else(|| LogError::Remote("no remote connector configured".into()))?;
        let client = connector
            .connect(export)
            .map_err(|e| LogError::Remote(format!("failed to connect to {}: {:#}", export.project, e)))?;

        let closing = Arc::clone(&client);
        let close: CloseFn =
            Box::new(move || closing.close().map_err(|e| LogError::Remote(format!("{:#}", e))));
        Ok((Self::new(client, threshold), close))
    }

    fn payload(&self, entry: &LogEntry) -> Map<String, Value> {
        let mut payload = Map::new();
        for (k, v) in self.fields.iter().chain(&entry.fields) {
            payload.insert(k.clone(), v.clone());
        }
        payload.insert("logger".into(), Value::String(entry.scope.clone()));
        payload.insert("message".into(), Value::String(entry.message.clone()));
        if let Some(caller) = &entry.caller {
            payload.insert("caller".into(), Value::String(caller.short()));
        }
        if let Some(stack) = &entry.stack {
            payload.insert("stacktrace".into(), Value::String(stack.clone()));
        }
        payload
    }
}

impl LogSink for RemoteSink {
    fn enabled(&self, level: Level) -> bool {
        self.threshold.admits(level)
    }

    fn write(&self, entry: &LogEntry) -> Result<(), LogError> {
        self.client.log(RemoteEntry {
            timestamp: entry.time,
            severity: aggregator_severity(entry.level),
            payload: self.payload(entry),
        });
        Ok(())
    }

    fn flush(&self) -> Result<(), LogError> {
        self.client
            .flush()
            .map_err(|e| LogError::Remote(format!("{:#}", e)))
    }

    fn with_fields(&self, fields: &[Field]) -> Box<dyn LogSink> {
        let mut merged = self.fields.clone();
        merged.extend_from_slice(fields);
        Box::new(RemoteSink {
            client: Arc::clone(&self.client),
            threshold: self.threshold,
            fields: merged,
        })
    }
}
