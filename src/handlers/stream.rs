use log::{error, info};

use crate::cli::StreamCommand;
use crate::errors::Result;
use crate::handlers::Context;
use crate::services::streams::{verify_flow, FlowInfo, FlowRate, StreamClient};

fn render_flow(info: &FlowInfo) -> String {
    let mut text = format!(
        "{} -> {} ({}): {} wei/s",
        info.sender, info.receiver, info.token, info.flow_rate
    );
    if let Some(monthly) = info.flow_rate.per_month() {
        text.push_str(&format!(", {} wei/month", monthly));
    }
    text
}

/// `stream open|update|delete|show`
///
/// Every write is read back and compared with the requested rate; a deleted
/// stream must read back as zero.
pub async fn stream_handler(ctx: &Context, command: StreamCommand) -> Result<()> {
    match command {
        StreamCommand::Open {
            token,
            receiver,
            rate,
        } => {
            info!("Handling stream open command");
            let token = ctx.network.resolve_token(&token)?;
            let (provider, account) = ctx.signing_provider().await?;
            let client = StreamClient::new(provider, ctx.network.clone(), ctx.confirmations());
            client.open_stream(token, receiver, rate).await?;
            let flow = client.get_flow(token, account, receiver).await?;
            verify_flow(&flow, rate).map_err(|e| {
                error!("Stream opened but reads back differently: {}", e);
                e
            })?;
            ctx.emit(&flow, &render_flow(&flow))
        }
        StreamCommand::Update {
            token,
            receiver,
            rate,
        } => {
            info!("Handling stream update command");
            let token = ctx.network.resolve_token(&token)?;
            let (provider, account) = ctx.signing_provider().await?;
            let client = StreamClient::new(provider, ctx.network.clone(), ctx.confirmations());
            client.update_stream(token, receiver, rate).await?;
            let flow = client.get_flow(token, account, receiver).await?;
            verify_flow(&flow, rate)?;
            ctx.emit(&flow, &render_flow(&flow))
        }
        StreamCommand::Delete {
            token,
            sender,
            receiver,
        } => {
            info!("Handling stream delete command");
            let token = ctx.network.resolve_token(&token)?;
            let (provider, account) = ctx.signing_provider().await?;
            let sender = sender.unwrap_or(account);
            let client = StreamClient::new(provider, ctx.network.clone(), ctx.confirmations());
            client.delete_stream(token, sender, receiver).await?;
            let flow = client.get_flow(token, sender, receiver).await?;
            verify_flow(&flow, FlowRate::ZERO)?;
            ctx.emit(&flow, &render_flow(&flow))
        }
        StreamCommand::Show {
            token,
            sender,
            receiver,
        } => {
            info!("Handling stream show command");
            let token = ctx.network.resolve_token(&token)?;
            let sender = match sender {
                Some(sender) => sender,
                None => ctx.account()?,
            };
            let provider = ctx.read_provider().await?;
            let client = StreamClient::new(provider, ctx.network.clone(), ctx.confirmations());
            let flow = client.get_flow(token, sender, receiver).await?;
            let net = client.net_flow(token, receiver).await?;
            let text = format!("{}\nnet flow of {}: {} wei/s", render_flow(&flow), receiver, net);
            ctx.emit(&flow, &text)
        }
    }
}
