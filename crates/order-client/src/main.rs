// crates/order-client/src/main.rs

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use order_client::config::{ClientConfig, SideConfig};
use order_client::network::{self, Endpoint};
use order_client::session::OrderSession;
use order_protocol::text_codec::{format_ack, format_trade};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(name = "order-client")]
#[clap(about = "Submit one order to the matching engine, then cancel it")]
struct Cli {
    /// Engine endpoint: socket path, unix://path or tcp://host:port
    #[clap(short, long)]
    endpoint: Option<String>,

    /// TOML config file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Per-frame receive deadline in milliseconds
    #[clap(long)]
    recv_timeout_ms: Option<u64>,

    #[clap(long)]
    client_order_id: Option<u64>,

    #[clap(long)]
    price: Option<i64>,

    #[clap(long)]
    qty: Option<i32>,

    #[clap(long)]
    instrument: Option<u32>,

    #[clap(long, value_enum)]
    side: Option<SideConfig>,

    /// Mark the order immediate-or-cancel
    #[clap(long)]
    ioc: bool,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,
}

impl Cli {
    fn apply(&self, config: &mut ClientConfig) {
        if let Some(ep) = &self.endpoint {
            config.endpoint = ep.clone();
        }
        if let Some(ms) = self.recv_timeout_ms {
            config.recv_timeout_ms = Some(ms);
        }
        if let Some(cid) = self.client_order_id {
            config.order.client_order_id = cid;
        }
        if let Some(px) = self.price {
            config.order.price_ticks = px;
        }
        if let Some(qty) = self.qty {
            config.order.qty = qty;
        }
        if let Some(instr) = self.instrument {
            config.order.instrument_id = instr;
        }
        if let Some(side) = self.side {
            config.order.side = side;
        }
        if self.ioc {
            config.order.set_ioc(true);
        }
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let mut config = ClientConfig::load(cli.config.as_deref()).context("loading configuration")?;
    cli.apply(&mut config);
    let endpoint = config.endpoint()?;

    let res = match &endpoint {
        Endpoint::Tcp(addr) => {
            let stream = network::connect_tcp(addr)
                .await
                .with_context(|| format!("connecting to {}", endpoint))?;
            drive(stream, &endpoint, &config).await
        }
        #[cfg(unix)]
        Endpoint::Unix(path) => {
            let stream = network::connect_unix(path)
                .await
                .with_context(|| format!("connecting to {}", endpoint))?;
            drive(stream, &endpoint, &config).await
        }
        #[cfg(not(unix))]
        Endpoint::Unix(_) => anyhow::bail!("unix sockets are not supported on this platform"),
    };

    if let Err(err) = &res {
        error!("{:#}", err);
    }
    res
}

async fn drive<S>(stream: S, endpoint: &Endpoint, config: &ClientConfig) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    println!("client: connected to server at {}", endpoint);

    let mut session = OrderSession::new(stream, config.session_options());
    let order = config.order.new_order();

    session.submit_new(order).await.context("sending NEW")?;
    println!(
        "client: sent NEW order (cid={}, qty={}, price={})",
        order.client_order_id, order.qty, order.price_ticks
    );

    let new_ack = session.await_new_ack().await.context("waiting for NEW ACK")?;
    for fill in session.fills() {
        println!("{}", format_trade(fill));
    }
    println!("{}", format_ack("NEW ACK", &new_ack));

    if !new_ack.is_accepted() {
        println!("client: NEW order was rejected, cannot cancel");
        return session.close().await.context("closing connection");
    }

    println!(
        "client: sending CANCEL order for exch_oid={}",
        new_ack.exch_order_id
    );
    session
        .submit_cancel(config.order.cancel_request())
        .await
        .context("sending CANCEL")?;

    let cancel_ack = session
        .await_cancel_ack()
        .await
        .context("waiting for CANCEL ACK")?;
    println!("{}", format_ack("CANCEL ACK", &cancel_ack));

    session.close().await.context("closing connection")?;
    println!("client: workflow completed successfully");
    Ok(())
}
