//! Runs against a Polygon fork with a DAO super app already created.
//!
//! ```sh
//! DAOIT_LIVE_RPC=http://127.0.0.1:8545 PRIVATE_KEY=... DAOIT_SUPER_APP=0x... \
//!     cargo test --test live_super_app -- --ignored --test-threads=1
//! ```

use alloy::primitives::{Address, U256};
use alloy::providers::DynProvider;
use alloy::signers::local::PrivateKeySigner;
use std::env;
use std::str::FromStr;
use url::Url;

use daoit::models::{Network, NetworkKind};
use daoit::providers::{create_provider, ensure_chain};
use daoit::services::streams::FlowRate;
use daoit::services::{StreamClient, SuperAppClient, TokenClient};

struct Live {
    provider: DynProvider,
    network: Network,
    account: Address,
    app: Address,
}

async fn live() -> Live {
    let rpc = env::var("DAOIT_LIVE_RPC").expect("DAOIT_LIVE_RPC not set");
    let key = env::var("PRIVATE_KEY").expect("PRIVATE_KEY not set");
    let app = env::var("DAOIT_SUPER_APP").expect("DAOIT_SUPER_APP not set");

    let signer = PrivateKeySigner::from_str(key.trim_start_matches("0x")).unwrap();
    let account = signer.address();
    let provider = create_provider(vec![Url::parse(&rpc).unwrap()], Some(signer)).unwrap();
    let network = Network::for_kind(NetworkKind::Localhost);
    ensure_chain(&provider, &network).await.unwrap();
    Live {
        provider,
        network,
        account,
        app: Address::from_str(&app).unwrap(),
    }
}

#[tokio::test]
#[ignore]
async fn toggles_deposits_and_streams() {
    let live = live().await;
    let app = SuperAppClient::new(live.provider, live.network, live.app, 1);
    assert!(app.is_manager(live.account).await.unwrap());

    assert!(!app.set_deposits_enabled(false).await.unwrap());
    assert!(app.set_deposits_enabled(true).await.unwrap());
    assert!(!app.set_streams_enabled(false).await.unwrap());
    assert!(app.set_streams_enabled(true).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn grant_mints_dao_tokens() {
    let live = live().await;
    let app = SuperAppClient::new(live.provider.clone(), live.network.clone(), live.app, 1);
    let tokens = TokenClient::new(live.provider, live.network, 1);

    let dao_token = app.info().await.unwrap().underlying;
    let before = tokens.balance_of(dao_token, live.account).await.unwrap();
    let amount = U256::from(100u64) * U256::from(10u64).pow(U256::from(18));
    app.grant(live.account, amount).await.unwrap();
    let after = tokens.balance_of(dao_token, live.account).await.unwrap();
    assert_eq!(after - before, amount);
}

#[tokio::test]
#[ignore]
async fn deposit_weth_issues_dao_tokens() {
    let live = live().await;
    let app = SuperAppClient::new(live.provider.clone(), live.network.clone(), live.app, 1);
    let tokens = TokenClient::new(live.provider, live.network, 1);

    let info = app.info().await.unwrap();
    let amount = U256::from(10u64).pow(U256::from(18));
    tokens.approve(info.want, live.app, amount).await.unwrap();

    let treasury_before = tokens.balance_of(info.want, info.treasury).await.unwrap();
    let before = tokens.balance_of(info.underlying, live.account).await.unwrap();
    app.deposit(info.want, amount, live.account).await.unwrap();
    let treasury_after = tokens.balance_of(info.want, info.treasury).await.unwrap();
    let after = tokens.balance_of(info.underlying, live.account).await.unwrap();
    assert!(treasury_after > treasury_before);
    assert!(after > before);
}

#[tokio::test]
#[ignore]
async fn stream_to_app_open_update_delete() {
    let live = live().await;
    let app = SuperAppClient::new(live.provider.clone(), live.network.clone(), live.app, 1);
    let streams = StreamClient::new(live.provider, live.network, 1);
    let token = app.info().await.unwrap().accepted_token;

    let rate: FlowRate = "31709791984".parse().unwrap();
    streams.open_stream(token, live.app, rate).await.unwrap();
    let to_app = streams.get_flow(token, live.account, live.app).await.unwrap();
    assert_eq!(to_app.flow_rate, rate);
    // the app streams DAO tokens back
    let back = streams.get_flow(token, live.app, live.account).await;
    assert!(back.is_ok());

    let faster: FlowRate = "31709799999".parse().unwrap();
    streams.update_stream(token, live.app, faster).await.unwrap();
    let to_app = streams.get_flow(token, live.account, live.app).await.unwrap();
    assert_eq!(to_app.flow_rate, faster);

    streams.delete_stream(token, live.account, live.app).await.unwrap();
    let to_app = streams.get_flow(token, live.account, live.app).await.unwrap();
    assert!(to_app.flow_rate.is_zero());
}
