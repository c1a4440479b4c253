//! Fee market detection and per-transfer fee quotes.

use crate::blockchain::rpc::LedgerRpc;
use crate::blockchain::types::{BlockchainResult, FeeMarket, FeeQuote, TRANSFER_GAS_LIMIT};

/// Inspect the latest header: a positive base fee means an EIP-1559 market.
pub async fn probe_market(rpc: &dyn LedgerRpc) -> BlockchainResult<FeeMarket> {
    let market = match rpc.latest_base_fee().await? {
        Some(base_fee) if base_fee > 0 => FeeMarket::Dynamic,
        _ => FeeMarket::Legacy,
    };
    tracing::debug!(?market, "Fee market probed");
    Ok(market)
}

/// Compute fresh fee parameters for one plain transfer.
pub async fn quote(rpc: &dyn LedgerRpc, market: FeeMarket) -> BlockchainResult<FeeQuote> {
    match market {
        FeeMarket::Legacy => {
            let gas_price = rpc.gas_price().await?;
            Ok(FeeQuote::Legacy { gas_limit: TRANSFER_GAS_LIMIT, gas_price })
        }
        FeeMarket::Dynamic => {
            let tip_cap = rpc.max_priority_fee().await?;
            let base_fee = rpc.latest_base_fee().await?.unwrap_or_default();
            Ok(FeeQuote::Dynamic {
                gas_limit: TRANSFER_GAS_LIMIT,
                tip_cap,
                // Headroom for the base fee rising over the next few blocks
                fee_cap: base_fee.saturating_mul(2).saturating_add(tip_cap),
            })
        }
    }
}
