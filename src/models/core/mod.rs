//! Core domain model.

mod amount;
mod chain;
mod currency;
mod entities;

pub use amount::{from_base_units, parse_amount, AmountError};
pub use chain::{chain, ChainConfig, ChainKind, CHAINS};
pub use currency::{resolve_currency, ContractInfo, ContractMap, CurrencyId, AVAX_CONTRACTS};
pub use entities::{
	AddressTx, AddressTxMap, Balance, BlockTxIndex, Direction, TransactionDetail, Transfer,
	TransferKind, TransferTx, TxOutput, TxRef,
};
