//! `agentquest serve` — Start the HTTP API server.

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config()?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🎲 AgentQuest API");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Allowed origins: {}", config.gateway.allowed_origins.join(", "));

    agentquest_gateway::start(config).await?;

    Ok(())
}
