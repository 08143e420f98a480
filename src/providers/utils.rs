use alloy::contract::{CallBuilder, CallDecoder};
use alloy::network::{Ethereum, EthereumWallet, ReceiptResponse};
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy::rpc::client::RpcClient;
use alloy::rpc::types::{Filter, Log, TransactionReceipt};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::Http;
use alloy::transports::layers::FallbackLayer;
use log::{debug, info};
use std::num::NonZeroUsize;
use tower::ServiceBuilder;
use url::Url;

use crate::errors::{DaoError, Result};
use crate::models::network::Network;

/// Inclusive block windows of at most `span` blocks covering `from..=to`.
pub fn block_ranges(from: u64, to: u64, span: u64) -> Vec<(u64, u64)> {
    let span = span.max(1);
    let mut ranges = Vec::new();
    let mut start = from;
    while start <= to {
        let end = start.saturating_add(span - 1).min(to);
        ranges.push((start, end));
        if end == u64::MAX {
            break;
        }
        start = end + 1;
    }
    ranges
}

/// `eth_getLogs` over `from..=to`, split into windows of `span` blocks so
/// endpoints with a range cap still answer.
pub async fn fetch_logs_in_ranges(
    provider: &DynProvider,
    filter: &Filter,
    from: u64,
    to: u64,
    span: u64,
) -> Result<Vec<Log>> {
    let mut logs = Vec::new();
    for (start, end) in block_ranges(from, to, span) {
        let window = filter.clone().from_block(start).to_block(end);
        let batch = provider.get_logs(&window).await?;
        debug!("Blocks {}..={}: {} logs", start, end, batch.len());
        logs.extend(batch);
    }
    Ok(logs)
}

/// Provider over one or more HTTP endpoints. With a signer the provider
/// fills and signs transactions locally; without one it is read-only.
pub fn create_provider(rpcs: Vec<Url>, signer: Option<PrivateKeySigner>) -> Result<DynProvider> {
    let rpc_len = NonZeroUsize::new(rpcs.len())
        .ok_or_else(|| DaoError::Config("At least one RPC URL is required".to_string()))?;
    let fallback_layer = FallbackLayer::default().with_active_transport_count(rpc_len);

    let transports = rpcs.into_iter().map(Http::new).collect::<Vec<_>>();

    let transport = ServiceBuilder::new()
        .layer(fallback_layer)
        .service(transports);
    let client = RpcClient::builder().transport(transport, false);

    let provider = match signer {
        Some(signer) => {
            info!("Signing as {}", signer.address());
            ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect_client(client)
                .erased()
        }
        None => ProviderBuilder::new().connect_client(client).erased(),
    };
    Ok(provider)
}

pub fn create_read_provider(rpcs: Vec<Url>) -> Result<DynProvider> {
    create_provider(rpcs, None)
}

/// Fails when the endpoint serves a different chain than the selected
/// address table.
pub async fn ensure_chain(provider: &DynProvider, network: &Network) -> Result<()> {
    let actual = provider.get_chain_id().await?;
    debug!("Endpoint chain id {}", actual);
    if actual != network.chain_id {
        return Err(DaoError::WrongChain {
            expected: network.chain_id,
            actual,
        });
    }
    Ok(())
}

pub fn with_gas_price<P, D>(call: CallBuilder<P, D>, gas_price: Option<u128>) -> CallBuilder<P, D>
where
    P: Provider,
    D: CallDecoder,
{
    match gas_price {
        Some(price) => call.gas_price(price),
        None => call,
    }
}

/// Turn a receipt with a failed status into `DaoError::Reverted`.
pub fn check_status(receipt: TransactionReceipt, context: &str) -> Result<TransactionReceipt> {
    if !receipt.status() {
        return Err(DaoError::Reverted {
            tx_hash: receipt.transaction_hash.to_string(),
            context: context.to_string(),
        });
    }
    debug!(
        "{}: confirmed in block {:?}, gas used {}",
        context,
        receipt.block_number,
        receipt.gas_used
    );
    Ok(receipt)
}

/// Wait for a submitted transaction and turn a failed status into an error.
pub async fn confirm(
    pending: PendingTransactionBuilder<Ethereum>,
    confirmations: u64,
    context: &str,
) -> Result<TransactionReceipt> {
    info!("{}: submitted {}", context, pending.tx_hash());
    let receipt = pending
        .with_required_confirmations(confirmations)
        .get_receipt()
        .await?;
    check_status(receipt, context)
}

/// Submit a contract call and wait for a successful receipt.
pub async fn send_and_confirm<P, D>(
    call: CallBuilder<P, D>,
    confirmations: u64,
    context: &str,
) -> Result<TransactionReceipt>
where
    P: Provider,
    D: CallDecoder,
{
    let pending = call.send().await?;
    confirm(pending, confirmations, context).await
}
