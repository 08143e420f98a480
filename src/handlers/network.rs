use log::info;
use serde::Serialize;
use std::fmt::Write as _;

use crate::errors::Result;
use crate::handlers::Context;
use crate::models::network::{Network, NetworkKind};

#[derive(Debug, Serialize)]
pub struct NetworkResponse {
    pub name: String,
    pub display_name: String,
    pub chain_id: u64,
    pub block_explorer: Option<String>,
    pub addresses: Vec<(String, String)>,
}

impl From<&Network> for NetworkResponse {
    fn from(network: &Network) -> Self {
        Self {
            name: network.name().to_string(),
            display_name: network.kind.display_name().to_string(),
            chain_id: network.chain_id,
            block_explorer: network.block_explorer.clone(),
            addresses: network
                .labelled_addresses()
                .into_iter()
                .map(|(label, address)| (label, address.to_string()))
                .collect(),
        }
    }
}

pub fn render_network(network: &Network) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}, chain {})",
        network.name(),
        network.kind.display_name(),
        network.chain_id
    );
    for (label, address) in network.labelled_addresses() {
        let _ = writeln!(out, "  {:<20} {}", label, address);
    }
    out
}

/// `networks` - address table of the active network, or all of them
pub fn networks_handler(ctx: &Context, all: bool) -> Result<()> {
    info!("Handling networks command");

    let networks: Vec<Network> = if all {
        NetworkKind::all().into_iter().map(Network::for_kind).collect()
    } else {
        vec![ctx.network.clone()]
    };

    let response: Vec<NetworkResponse> = networks.iter().map(NetworkResponse::from).collect();
    let text = networks
        .iter()
        .map(render_network)
        .collect::<Vec<_>>()
        .join("\n");
    ctx.emit(&response, &text)
}
