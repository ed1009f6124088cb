//! Append-only record of directed exchanges between named participants.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use time::OffsetDateTime;

use crate::error::{codes, AppError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exchange {
    pub id: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub from: String,
    pub to: Option<String>,
    pub message: String,
    pub response: Option<Value>,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

/// Fields supplied by the caller; id and timestamp are assigned on record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExchange {
    pub from: String,
    pub to: Option<String>,
    pub message: String,
    pub response: Option<Value>,
    pub meta: Map<String, Value>,
}

impl NewExchange {
    pub fn new(from: impl Into<String>, to: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.map(str::to_string),
            message: message.into(),
            response: None,
            meta: Map::new(),
        }
    }

    pub fn with_response(mut self, response: impl Into<Value>) -> Self {
        self.response = Some(response.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// Serializable snapshot: `{"exchanges": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExchangeExport {
    pub exchanges: Vec<Exchange>,
}

#[derive(Debug, Clone, Default)]
pub struct ExchangeLog {
    exchanges: Vec<Exchange>,
}

impl ExchangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// Append an exchange and return its id (its zero-based insertion index).
    pub fn record(&mut self, entry: NewExchange) -> u64 {
        let id = self.exchanges.len() as u64;
        self.exchanges.push(Exchange {
            id,
            timestamp: OffsetDateTime::now_utc(),
            from: entry.from,
            to: entry.to,
            message: entry.message,
            response: entry.response,
            meta: entry.meta,
        });
        id
    }

    pub fn export(&self) -> ExchangeExport {
        ExchangeExport {
            exchanges: self.exchanges.clone(),
        }
    }

    /// Write the export as pretty UTF-8 JSON. The file is replaced atomically.
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        write_export(&self.export(), path)
    }

    /// Rebuild a log from a previously saved export so later records continue
    /// its id sequence.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let bytes = fs::read(path).map_err(|e| {
            AppError::new(codes::EXCHANGE_LOAD_FAILED, "Failed to read exchange log")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        let export: ExchangeExport = serde_json::from_slice(&bytes).map_err(|e| {
            AppError::new(codes::EXCHANGE_LOAD_FAILED, "Failed to decode exchange log")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;

        for (idx, ex) in export.exchanges.iter().enumerate() {
            if ex.id != idx as u64 {
                return Err(AppError::new(
                    codes::EXCHANGE_LOG_INVALID,
                    "Exchange ids must match their position in the log",
                )
                .with_details(format!("position={idx}; id={}", ex.id)));
            }
        }

        tracing::debug!(path = %path.display(), count = export.exchanges.len(), "loaded exchange log");
        Ok(Self {
            exchanges: export.exchanges,
        })
    }
}

fn write_export(export: &ExchangeExport, path: &Path) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(export).map_err(|e| {
        AppError::new(codes::EXCHANGE_EXPORT_FAILED, "Failed to encode exchange log")
            .with_details(e.to_string())
    })?;
    // Uniquely named sibling; removed on drop if it is never persisted.
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| {
        AppError::new(codes::EXCHANGE_EXPORT_FAILED, "Failed to create exchange log temp file")
            .with_details(format!("dir={}; err={}", dir.display(), e))
    })?;
    tmp.write_all(json.as_bytes()).map_err(|e| {
        AppError::new(codes::EXCHANGE_EXPORT_FAILED, "Failed to write exchange log")
            .with_details(format!("path={}; err={}", tmp.path().display(), e))
    })?;
    tmp.persist(path).map_err(|e| {
        AppError::new(
            codes::EXCHANGE_EXPORT_FAILED,
            "Failed to finalize exchange log write",
        )
        .with_details(format!("dest={}; err={}", path.display(), e.error))
    })?;
    tracing::debug!(path = %path.display(), count = export.exchanges.len(), "saved exchange log");
    Ok(())
}

/// Cloneable handle for recording into one log from several threads.
///
/// Appends are serialized, so ids still equal insertion order.
#[derive(Debug, Clone, Default)]
pub struct SharedExchangeLog {
    inner: Arc<Mutex<ExchangeLog>>,
}

impl SharedExchangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: NewExchange) -> u64 {
        self.inner.lock().record(entry)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn export(&self) -> ExchangeExport {
        self.inner.lock().export()
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        // Snapshot under the lock, write outside it.
        let export = self.export();
        write_export(&export, path)
    }
}
