use crate::error::{Result, WalletError};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    Register,
    Approve,
    Deposit,
    Withdraw,
    Send,
    CashIn,
    CashOut,
    Block,
    Unblock,
}

/// One replay row.
///
/// Columns: `op, actor, counterparty, amount, role, nid`. `actor` is an
/// identity string (email or phone); unused trailing columns stay empty.
#[derive(Debug, Deserialize, Clone)]
pub struct Command {
    pub op: CommandKind,
    pub actor: String,
    #[serde(default)]
    pub counterparty: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub nid: Option<String>,
}

impl Command {
    pub fn required_amount(&self) -> Result<Decimal> {
        self.amount
            .ok_or_else(|| WalletError::InvalidAmount("amount is required".to_string()))
    }

    pub fn required_counterparty(&self) -> Result<&str> {
        self.counterparty
            .as_deref()
            .ok_or_else(|| WalletError::NotFound("counterparty".to_string()))
    }
}

/// Reads replay commands from a CSV source.
///
/// Wraps `csv::Reader` and yields an iterator over `Result<Command>`, so a
/// malformed row fails alone and the stream keeps going. Whitespace trimming
/// and flexible record lengths are handled automatically.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes commands.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(WalletError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "op, actor, counterparty, amount, role, nid\n\
                    register, alice@example.com, 01711111111, , user, 1234567890\n\
                    deposit, alice@example.com, , 500, ,";
        let reader = CommandReader::new(data.as_bytes());
        let results: Vec<Result<Command>> = reader.commands().collect();

        assert_eq!(results.len(), 2);
        let register = results[0].as_ref().unwrap();
        assert_eq!(register.op, CommandKind::Register);
        assert_eq!(register.counterparty.as_deref(), Some("01711111111"));
        assert_eq!(register.amount, None);

        let deposit = results[1].as_ref().unwrap();
        assert_eq!(deposit.op, CommandKind::Deposit);
        assert_eq!(deposit.amount, Some(dec!(500)));
    }

    #[test]
    fn test_reader_malformed_op() {
        let data = "op, actor, counterparty, amount, role, nid\n\
                    teleport, alice@example.com, , 1, ,";
        let reader = CommandReader::new(data.as_bytes());
        let results: Vec<Result<Command>> = reader.commands().collect();

        assert!(results[0].is_err());
    }

    #[test]
    fn test_kebab_case_ops() {
        let data = "op, actor, counterparty, amount, role, nid\n\
                    cash-in, agent@example.com, 01711111111, 300, ,";
        let reader = CommandReader::new(data.as_bytes());
        let command = reader.commands().next().unwrap().unwrap();
        assert_eq!(command.op, CommandKind::CashIn);
    }
}
