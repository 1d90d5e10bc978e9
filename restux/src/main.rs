use restux_config::RestuxConfig;
use restux_core::Master;
use utils::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cfg = match RestuxConfig::from_file("restux.conf") {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error reading restux.conf: {e}");
            eprintln!("Continuing with default configuration...");
            RestuxConfig::default()
        }
    };
    cfg.print();

    let master = Master::new(cfg);
    master.run().await?;

    Ok(())
}
