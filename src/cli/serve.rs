//! HTTP annotation service command

use super::helpers::build_annotator;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{debug, info};
use uqureader_core::{
    api::{ApiServer, ApiServerConfig},
    morphology::GrammarResources,
    ReaderConfig,
};

/// Handle serve command
pub async fn handle(
    addr: Option<String>,
    markup_files: Vec<PathBuf>,
    config: &ReaderConfig,
) -> anyhow::Result<()> {
    debug!("Starting annotation service...");

    let socket_addr: SocketAddr = match addr {
        Some(addr) => addr
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid address '{}': {}", addr, e))?,
        None => config.server.addr,
    };
    let annotator = build_annotator(config, &markup_files)?;

    println!();
    println!("Uqureader annotation service");
    println!();
    println!("   Address: http://{}", socket_addr);
    println!("   Batch budget: {} chars", config.remote.budget_chars);
    println!();
    println!("   Endpoints:");
    println!("   - POST /api/markup - Annotate text");
    println!("   - POST /api/token - Look up one token");
    println!("   - GET  /health - Health check");
    println!();

    let mut server = ApiServer::new(
        ApiServerConfig {
            addr: socket_addr,
            budget_chars: config.remote.budget_chars,
        },
        annotator,
    );
    if let Some(path) = &config.server.grammar_file {
        let grammar = GrammarResources::from_file(path)?;
        info!("Grammar metadata loaded from {}", path.display());
        server = server.with_grammar(grammar.into_handle());
    }
    server.serve().await
}
