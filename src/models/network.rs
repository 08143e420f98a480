use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::NetworkConfig;
use crate::errors::{DaoError, Result};
use crate::models::token_book::TokenBook;

/// Networks the DAO factory has been deployed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
    Rinkeby,
    Kovan,
    Mumbai,
    Polygon,
    /// Hardhat/Anvil fork of Polygon.
    Localhost,
}

impl NetworkKind {
    pub fn all() -> [NetworkKind; 5] {
        [
            NetworkKind::Rinkeby,
            NetworkKind::Kovan,
            NetworkKind::Mumbai,
            NetworkKind::Polygon,
            NetworkKind::Localhost,
        ]
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            NetworkKind::Rinkeby => 4,
            NetworkKind::Kovan => 42,
            NetworkKind::Mumbai => 80001,
            NetworkKind::Polygon => 137,
            NetworkKind::Localhost => 31337,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            NetworkKind::Rinkeby => "rinkeby",
            NetworkKind::Kovan => "kovan",
            NetworkKind::Mumbai => "mumbai",
            NetworkKind::Polygon => "polygon",
            NetworkKind::Localhost => "localhost",
        }
    }

    /// Chain name as listed by Tally's registration form.
    pub fn display_name(&self) -> &'static str {
        match self {
            NetworkKind::Rinkeby => "Ethereum Testnet Rinkeby",
            NetworkKind::Kovan => "Ethereum Testnet Kovan",
            NetworkKind::Mumbai => "Mumbai(Polygon) Testnet",
            NetworkKind::Polygon => "Matic(Polygon) Mainnet",
            NetworkKind::Localhost => "Localhost (Polygon fork)",
        }
    }

    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        Self::all().into_iter().find(|k| k.chain_id() == chain_id)
    }
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for NetworkKind {
    type Err = DaoError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase();
        if let Ok(chain_id) = key.parse::<u64>() {
            return Self::from_chain_id(chain_id).ok_or(DaoError::UnknownNetwork(s.to_string()));
        }
        match key.as_str() {
            "rinkeby" => Ok(NetworkKind::Rinkeby),
            "kovan" => Ok(NetworkKind::Kovan),
            "mumbai" => Ok(NetworkKind::Mumbai),
            "polygon" | "matic" => Ok(NetworkKind::Polygon),
            "localhost" | "hardhat" | "local" => Ok(NetworkKind::Localhost),
            _ => Err(DaoError::UnknownNetwork(s.to_string())),
        }
    }
}

/// Address table for one network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub kind: NetworkKind,
    pub chain_id: u64,
    pub block_explorer: Option<String>,
    pub dao_factory: Option<Address>,
    pub create2_factory: Option<Address>,
    pub resolver: Option<Address>,
    pub super_token_factory: Option<Address>,
    pub host: Option<Address>,
    pub cfa: Option<Address>,
    pub sf_governance: Option<Address>,
    pub router: Option<Address>,
    pub weth: Option<Address>,
    pub dai: Option<Address>,
    pub usdc: Option<Address>,
    pub gas_price_gwei: Option<u64>,
    pub tokens: TokenBook,
}

impl Network {
    pub fn for_kind(kind: NetworkKind) -> Self {
        match kind {
            NetworkKind::Rinkeby => rinkeby(),
            NetworkKind::Kovan => kovan(),
            NetworkKind::Mumbai => mumbai(),
            NetworkKind::Polygon => polygon(),
            NetworkKind::Localhost => localhost(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.key()
    }

    /// Resolve a required address or report which entry is missing.
    pub fn require(&self, name: &str, address: Option<Address>) -> Result<Address> {
        address.ok_or_else(|| DaoError::MissingAddress {
            network: self.name().to_string(),
            name: name.to_string(),
        })
    }

    pub fn dao_factory(&self) -> Result<Address> {
        self.require("dao_factory", self.dao_factory)
    }

    pub fn create2_factory(&self) -> Result<Address> {
        self.require("create2_factory", self.create2_factory)
    }

    pub fn host(&self) -> Result<Address> {
        self.require("host", self.host)
    }

    pub fn cfa(&self) -> Result<Address> {
        self.require("cfa", self.cfa)
    }

    /// Token selected in the "accepted token" field of the wizard.
    pub fn accepted_token(&self, symbol: &str) -> Result<Address> {
        self.tokens
            .get(symbol)
            .ok_or_else(|| DaoError::UnknownToken {
                network: self.name().to_string(),
                symbol: symbol.to_string(),
            })
    }

    /// Accepts either a token symbol from the table or a literal address.
    pub fn resolve_token(&self, symbol_or_address: &str) -> Result<Address> {
        if symbol_or_address.starts_with("0x") {
            return Address::from_str(symbol_or_address).map_err(|e| {
                DaoError::InvalidInput(format!(
                    "Invalid address format '{}': {}",
                    symbol_or_address, e
                ))
            });
        }
        self.accepted_token(symbol_or_address)
    }

    pub fn explorer_link(&self, address: Address) -> Option<String> {
        self.block_explorer
            .as_ref()
            .map(|base| format!("{}/address/{}", base.trim_end_matches('/'), address))
    }

    pub fn gas_price_wei(&self) -> Option<u128> {
        self.gas_price_gwei.map(|g| g as u128 * 1_000_000_000)
    }

    /// Apply factory overrides from the config file.
    pub fn with_overrides(mut self, overrides: &NetworkConfig) -> Result<Self> {
        if let Some(ref raw) = overrides.dao_factory {
            self.dao_factory = Some(parse_address("network.dao_factory", raw)?);
        }
        if let Some(ref raw) = overrides.create2_factory {
            self.create2_factory = Some(parse_address("network.create2_factory", raw)?);
        }
        if let Some(gwei) = overrides.gas_price_gwei {
            self.gas_price_gwei = Some(gwei);
        }
        Ok(self)
    }

    /// Every configured address with its label, used for display and for
    /// consistency checks.
    pub fn labelled_addresses(&self) -> Vec<(String, Address)> {
        let mut out = Vec::new();
        let fixed = [
            ("dao_factory", self.dao_factory),
            ("create2_factory", self.create2_factory),
            ("resolver", self.resolver),
            ("super_token_factory", self.super_token_factory),
            ("host", self.host),
            ("cfa", self.cfa),
            ("sf_governance", self.sf_governance),
            ("router", self.router),
            ("weth", self.weth),
            ("dai", self.dai),
            ("usdc", self.usdc),
        ];
        for (label, address) in fixed {
            if let Some(address) = address {
                out.push((label.to_string(), address));
            }
        }
        for (symbol, address) in self.tokens.iter() {
            out.push((format!("token.{}", symbol), address));
        }
        out
    }
}

fn parse_address(field: &str, raw: &str) -> Result<Address> {
    Address::from_str(raw.trim())
        .map_err(|e| DaoError::Config(format!("{}: invalid address '{}': {}", field, raw, e)))
}

const DAO_FACTORY_TESTNET: Address = address!("0xAa18cDA7c7c8894595B4e6bdEc7647Ff13e663ae");
const UNISWAP_V2_ROUTER: Address = address!("0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D");
const SUSHI_ROUTER: Address = address!("0x1b02dA8Cb0d097eB8D57A175b88c7D8b47997506");

fn rinkeby() -> Network {
    let kind = NetworkKind::Rinkeby;
    let weth = Some(address!("0xc778417E063141139Fce010982780140Aa0cD5Ab"));
    let dai = Some(address!("0x5592EC0cfb4dbc12D3aB100b257153436a1f0FEa"));
    let ethx = Some(address!("0xa623b2DD931C5162b7a0B25852f4024Db48bb1A0"));
    Network {
        kind,
        chain_id: kind.chain_id(),
        block_explorer: Some("https://rinkeby.etherscan.io".to_string()),
        dao_factory: Some(DAO_FACTORY_TESTNET),
        create2_factory: None,
        resolver: Some(address!("0x659635Fab0A0cef1293f7eb3c7934542B6A6B31A")),
        super_token_factory: Some(address!("0xd465e36e607d493cd4CC1e83bea275712BECd5E0")),
        host: Some(address!("0xeD5B5b32110c3Ded02a07c8b8e97513FAfb883B6")),
        cfa: Some(address!("0xF4C5310E51F6079F601a5fb7120bC72a70b96e2A")),
        sf_governance: None,
        router: Some(UNISWAP_V2_ROUTER),
        weth,
        dai,
        usdc: None,
        gas_price_gwei: Some(10),
        tokens: TokenBook::new(kind.chain_id())
            .with("WETH", weth)
            .with("DAI", dai)
            .with("ETHx", ethx)
            .with("WETHx", ethx)
            .with("fDAI", Some(address!("0x15F0Ca26781C3852f8166eD2ebce5D18265cceb7")))
            .with("fDAIx", Some(address!("0x745861AeD1EEe363b4AaA5F1994Be40b1e05Ff90")))
            .with("fUSDC", Some(address!("0xbe49ac1EadAc65dccf204D4Df81d650B50122aB2")))
            .with("fUSDCx", Some(address!("0x0F1D7C55A2B133E000eA10EeC03c774e0d6796e8"))),
    }
}

fn kovan() -> Network {
    let kind = NetworkKind::Kovan;
    let dai = Some(address!("0xFf795577d9AC8bD7D90Ee22b6C1703490b6512FD"));
    Network {
        kind,
        chain_id: kind.chain_id(),
        block_explorer: Some("https://kovan.etherscan.io".to_string()),
        dao_factory: None,
        create2_factory: None,
        resolver: Some(address!("0x851d3dd9dc97c1df1DA73467449B3893fc76D85B")),
        super_token_factory: Some(address!("0xF5F666AC8F581bAef8dC36C7C8828303Bd4F8561")),
        host: Some(address!("0xF0d7d1D47109bA426B9D8A3Cde1941327af1eea3")),
        cfa: Some(address!("0xECa8056809e7e8db04A8fF6e4E82cD889a46FE2F")),
        sf_governance: None,
        router: Some(UNISWAP_V2_ROUTER),
        weth: None,
        dai,
        usdc: None,
        gas_price_gwei: None,
        tokens: TokenBook::new(kind.chain_id())
            .with("DAI", dai)
            .with("DAIx", Some(address!("0x900B1D89FeC799D4D47b5dB345d6a460eb2530E8"))),
    }
}

fn mumbai() -> Network {
    let kind = NetworkKind::Mumbai;
    let weth = Some(address!("0x3C68CE8504087f89c640D02d133646d98e64ddd9"));
    let dai = Some(address!("0x001B3B4d0F3714Ca98ba10F6042DaEbF0B1B7b6F"));
    let usdc = Some(address!("0x2058A9D7613eEE744279e3856Ef0eAda5FCbaA7e"));
    Network {
        kind,
        chain_id: kind.chain_id(),
        block_explorer: Some("https://mumbai.polygonscan.com".to_string()),
        dao_factory: Some(DAO_FACTORY_TESTNET),
        create2_factory: None,
        resolver: Some(address!("0x8C54C83FbDe3C59e59dd6E324531FB93d4F504d3")),
        super_token_factory: Some(address!("0x200657E2f123761662567A1744f9ACAe50dF47E6")),
        host: Some(address!("0xEB796bdb90fFA0f28255275e16936D25d3418603")),
        cfa: Some(address!("0x49e565Ed1bdc17F3d220f72DF0857C26FA83F873")),
        sf_governance: None,
        router: Some(SUSHI_ROUTER),
        weth,
        dai,
        usdc,
        gas_price_gwei: Some(2),
        tokens: TokenBook::new(kind.chain_id())
            .with("WETH", weth)
            .with("DAI", dai)
            .with("USDC", usdc)
            .with("WETHx", Some(address!("0x7dA8ba196E747eec76246726Dc5BFC8a459BCD3e"))),
    }
}

fn polygon() -> Network {
    let kind = NetworkKind::Polygon;
    let weth = Some(address!("0x7ceB23fD6bC0adD59E62ac25578270cFf1b9f619"));
    let dai = Some(address!("0x8f3Cf7ad23Cd3CaDbD9735AFf958023239c6A063"));
    let usdc = Some(address!("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174"));
    let ethx = Some(address!("0x27e1e4E6BC79D93032abef01025811B7E4727e85"));
    Network {
        kind,
        chain_id: kind.chain_id(),
        block_explorer: Some("https://polygonscan.com".to_string()),
        dao_factory: Some(address!("0x1d8e39704619E07dd0bd27CadBa0D6F607e15977")),
        create2_factory: Some(address!("0x4a27c059FD7E383854Ea7DE6Be9c390a795f6eE3")),
        resolver: Some(address!("0xE0cc76334405EE8b39213E620587d815967af39C")),
        super_token_factory: Some(address!("0x2C90719f25B10Fc5646c82DA3240C76Fa5BcCF34")),
        host: Some(address!("0x3E14dC1b13c488a8d5D310918780c983bD5982E7")),
        cfa: Some(address!("0x6EeE6060f715257b970700bc2656De21dEdF074C")),
        sf_governance: Some(address!("0x3AD3f7A0965Ce6f9358AD5CCE86Bc2b05F1EE087")),
        router: Some(SUSHI_ROUTER),
        weth,
        dai,
        usdc,
        gas_price_gwei: None,
        tokens: TokenBook::new(kind.chain_id())
            .with("WETH", weth)
            .with("DAI", dai)
            .with("USDC", usdc)
            .with("ETHx", ethx)
            .with("WETHx", ethx)
            .with("USDCx", Some(address!("0xCAa7349CEA390F89641fe306D93591f87595dc1F")))
            .with("WBTC", Some(address!("0x1bfd67037b42cf73acf2047067bd4f2c47d9bfd6")))
            .with("WBTCx", Some(address!("0x4086eBf75233e8492F1BCDa41C7f2A8288c2fB92")))
            .with("DAIx", Some(address!("0x1305F6B6Df9Dc47159D12Eb7aC2804d4A33173c2"))),
    }
}

fn localhost() -> Network {
    let kind = NetworkKind::Localhost;
    let forked = polygon();
    let mut tokens = TokenBook::new(kind.chain_id());
    for (symbol, address) in forked.tokens.iter() {
        tokens.add(symbol, address);
    }
    Network {
        kind,
        chain_id: kind.chain_id(),
        block_explorer: None,
        gas_price_gwei: None,
        tokens,
        ..forked
    }
}
