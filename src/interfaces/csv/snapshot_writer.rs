use crate::domain::account::Role;
use crate::domain::wallet::WalletStatus;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

/// Final wallet state row printed by the CLI.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct WalletSnapshot {
    pub email: String,
    pub role: Role,
    pub balance: Decimal,
    pub status: WalletStatus,
}

/// Writes wallet snapshots as CSV.
pub struct SnapshotWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> SnapshotWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_snapshots(mut self, snapshots: Vec<WalletSnapshot>) -> Result<()> {
        for snapshot in snapshots {
            self.writer.serialize(snapshot)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
