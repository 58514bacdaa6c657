use clap::Parser;
use window_monitor_lib::config::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    window_monitor_lib::run(Args::parse()).await
}
