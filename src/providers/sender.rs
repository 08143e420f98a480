use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use async_trait::async_trait;
use log::debug;

use crate::errors::Result;

/// Submits raw contract calls from one account and waits for their receipts.
///
/// `send` returns once the node accepted the transaction; a call the node
/// rejects up front (failed gas estimation, e.g. a CREATE2 salt already
/// used) is an error here, before anything waits on a receipt.
#[async_trait]
pub trait TxSender: Send + Sync {
    fn account(&self) -> Address;

    /// Next nonce of the sending account, pending transactions included.
    async fn next_nonce(&self) -> Result<u64>;

    async fn send(&self, to: Address, input: Bytes, nonce: Option<u64>) -> Result<TxHash>;

    /// Receipt as mined; the status is not checked.
    async fn receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt>;
}

pub struct ProviderSender {
    provider: DynProvider,
    from: Address,
    gas_price: Option<u128>,
    confirmations: u64,
}

impl ProviderSender {
    pub fn new(
        provider: DynProvider,
        from: Address,
        gas_price: Option<u128>,
        confirmations: u64,
    ) -> Self {
        Self {
            provider,
            from,
            gas_price,
            confirmations,
        }
    }
}

#[async_trait]
impl TxSender for ProviderSender {
    fn account(&self) -> Address {
        self.from
    }

    async fn next_nonce(&self) -> Result<u64> {
        Ok(self.provider.get_transaction_count(self.from).pending().await?)
    }

    async fn send(&self, to: Address, input: Bytes, nonce: Option<u64>) -> Result<TxHash> {
        let mut tx = TransactionRequest::default()
            .with_from(self.from)
            .with_to(to)
            .with_input(input);
        if let Some(price) = self.gas_price {
            tx = tx.with_gas_price(price);
        }
        if let Some(nonce) = nonce {
            tx = tx.with_nonce(nonce);
        }
        let pending = self.provider.send_transaction(tx).await?;
        debug!("Sent {} to {}", pending.tx_hash(), to);
        Ok(*pending.tx_hash())
    }

    async fn receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .with_required_confirmations(self.confirmations)
            .get_receipt()
            .await?;
        Ok(receipt)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::errors::DaoError;
    use alloy::primitives::{keccak256, B256};
    use alloy::rpc::types::Log;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// One transaction as the sender saw it.
    #[derive(Debug, Clone)]
    pub(crate) struct SentTx {
        pub to: Address,
        pub input: Bytes,
        pub nonce: Option<u64>,
        pub hash: TxHash,
    }

    /// What the scripted chain does with a transaction.
    pub(crate) enum Outcome {
        /// Rejected by the node before mining, like a failed gas estimate.
        Reject(String),
        /// Mined with the given status and event logs.
        Mined {
            success: bool,
            logs: Vec<alloy::primitives::Log>,
        },
    }

    type Script = Box<dyn Fn(&SentTx) -> Outcome + Send + Sync>;

    /// In-memory chain answering each transaction through `script`.
    pub(crate) struct ScriptedSender {
        account: Address,
        first_nonce: u64,
        script: Script,
        sent: Mutex<Vec<SentTx>>,
        receipts: Mutex<HashMap<TxHash, TransactionReceipt>>,
        nonce_queries: Mutex<u32>,
    }

    impl ScriptedSender {
        pub(crate) fn new<F>(script: F) -> Self
        where
            F: Fn(&SentTx) -> Outcome + Send + Sync + 'static,
        {
            Self {
                account: Address::repeat_byte(0xee),
                first_nonce: 7,
                script: Box::new(script),
                sent: Mutex::new(Vec::new()),
                receipts: Mutex::new(HashMap::new()),
                nonce_queries: Mutex::new(0),
            }
        }

        pub(crate) fn first_nonce(&self) -> u64 {
            self.first_nonce
        }

        pub(crate) fn sent(&self) -> Vec<SentTx> {
            self.sent.lock().unwrap().clone()
        }

        pub(crate) fn nonce_queries(&self) -> u32 {
            *self.nonce_queries.lock().unwrap()
        }
    }

    pub(crate) fn receipt(
        tx: &SentTx,
        from: Address,
        success: bool,
        logs: Vec<alloy::primitives::Log>,
    ) -> TransactionReceipt {
        let logs: Vec<Log> = logs
            .into_iter()
            .enumerate()
            .map(|(i, inner)| Log {
                inner,
                block_hash: Some(B256::repeat_byte(0xbb)),
                block_number: Some(100),
                transaction_hash: Some(tx.hash),
                transaction_index: Some(0),
                log_index: Some(i as u64),
                ..Default::default()
            })
            .collect();
        serde_json::from_value(json!({
            "type": "0x2",
            "status": if success { "0x1" } else { "0x0" },
            "cumulativeGasUsed": "0x5208",
            "logs": logs,
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "transactionHash": tx.hash,
            "transactionIndex": "0x0",
            "blockHash": B256::repeat_byte(0xbb),
            "blockNumber": "0x64",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x3b9aca00",
            "from": from,
            "to": tx.to,
            "contractAddress": null
        }))
        .unwrap()
    }

    #[async_trait]
    impl TxSender for ScriptedSender {
        fn account(&self) -> Address {
            self.account
        }

        async fn next_nonce(&self) -> Result<u64> {
            *self.nonce_queries.lock().unwrap() += 1;
            Ok(self.first_nonce)
        }

        async fn send(&self, to: Address, input: Bytes, nonce: Option<u64>) -> Result<TxHash> {
            let mut sent = self.sent.lock().unwrap();
            let hash = keccak256((sent.len() as u64).to_be_bytes());
            let tx = SentTx {
                to,
                input,
                nonce,
                hash,
            };
            match (self.script)(&tx) {
                Outcome::Reject(reason) => Err(DaoError::Rpc(reason)),
                Outcome::Mined { success, logs } => {
                    let receipt = receipt(&tx, self.account, success, logs);
                    self.receipts.lock().unwrap().insert(hash, receipt);
                    sent.push(tx);
                    Ok(hash)
                }
            }
        }

        async fn receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt> {
            self.receipts
                .lock()
                .unwrap()
                .get(&tx_hash)
                .cloned()
                .ok_or_else(|| DaoError::Rpc(format!("unknown transaction {}", tx_hash)))
        }
    }

    #[tokio::test]
    async fn test_scripted_receipt_status() {
        let sender = ScriptedSender::new(|tx| Outcome::Mined {
            success: tx.input.is_empty(),
            logs: vec![],
        });
        let ok = sender.send(Address::ZERO, Bytes::new(), None).await.unwrap();
        let failed = sender
            .send(Address::ZERO, Bytes::from_static(&[1]), None)
            .await
            .unwrap();
        assert_ne!(ok, failed);

        let receipt = sender.receipt(ok).await.unwrap();
        assert!(crate::providers::check_status(receipt, "ok").is_ok());

        let receipt = sender.receipt(failed).await.unwrap();
        match crate::providers::check_status(receipt, "mint") {
            Err(DaoError::Reverted { tx_hash, context }) => {
                assert_eq!(tx_hash, failed.to_string());
                assert_eq!(context, "mint");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
