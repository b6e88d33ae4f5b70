use std::time::Duration;

use cometblue::CometBlue;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let addresses = cometblue::discover(Duration::from_secs(5)).await?;
    let address = addresses
        .first()
        .ok_or_else(|| anyhow::anyhow!("no thermostat found"))?;
    println!("reading {address}");

    let mut thermostat = CometBlue::new(address).with_pin(0);
    let values = thermostat
        .connected(async |t| {
            t.get_multiple(&["temperature", "battery", "datetime", "manualMode", "weekdays", "holidays"])
                .await
        })
        .await?;

    for (name, value) in &values {
        println!("{name}: {value:?}");
    }
    Ok(())
}
