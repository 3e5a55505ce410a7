use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::OperationService;
use crate::domain::{compute_balance, compute_totals, Cents, Operation, UserInfo};

/// Full history of one user, as written by [`Exporter::export_history_json`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub login: String,
    pub name: String,
    pub balance: Cents,
    pub deposited: Cents,
    pub withdrawn: Cents,
    pub operations: Vec<Operation>,
}

/// Exporter for converting a user's history to various formats
pub struct Exporter<'a> {
    operations: &'a OperationService,
}

impl<'a> Exporter<'a> {
    pub fn new(operations: &'a OperationService) -> Self {
        Self { operations }
    }

    /// Export the user's history to CSV, newest first.
    pub async fn export_history_csv<W: Write>(&self, info: &UserInfo, writer: W) -> Result<usize> {
        let history = self.operations.history(info.user.id).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "created_at",
            "type",
            "amount_cents",
            "subject",
            "message",
        ])?;

        for operation in &history {
            csv_writer.write_record(&[
                operation.id.to_string(),
                operation.created_at.to_rfc3339(),
                operation.operation_type.as_str().to_string(),
                operation.amount_cents.to_string(),
                operation.subject.clone(),
                operation.message.clone(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(history.len())
    }

    /// Export the user's history as a JSON snapshot.
    ///
    /// The balance and totals are computed from the exported operations, so
    /// the snapshot is self-consistent even if the ledger changed since
    /// `info` was loaded.
    pub async fn export_history_json<W: Write>(
        &self,
        info: &UserInfo,
        mut writer: W,
    ) -> Result<HistorySnapshot> {
        let operations = self.operations.history(info.user.id).await?;
        let totals = compute_totals(&operations)?;

        let snapshot = HistorySnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            login: info.user.login.clone(),
            name: info.user.name.clone(),
            balance: compute_balance(&operations)?,
            deposited: totals.deposited,
            withdrawn: totals.withdrawn,
            operations,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
