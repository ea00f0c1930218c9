use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use rpc_http_gateway::config::load_config;
use rpc_http_gateway::http::{HttpServer, NumericTokenDecoder, RequestReader};
use rpc_http_gateway::lifecycle::{signals, Shutdown};
use rpc_http_gateway::observability::{logging, metrics};
use rpc_http_gateway::rpc::{
    BasicService, CanonicalResponse, DispatchRegistry, Dispatcher, ServiceRegistry,
};
use rpc_http_gateway::routing::ServiceBuilder;

#[derive(Parser)]
#[command(name = "rpc-http-gateway")]
#[command(about = "Form-encoded HTTP gateway in front of an RPC dispatch layer", long_about = None)]
struct Cli {
    /// Configuration file (`.json` for JSON, TOML otherwise)
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,

    /// Override `listener.bind_address`
    #[arg(short, long)]
    bind: Option<String>,

    /// Accept every token as anonymous (connection id 0)
    #[arg(long)]
    anonymous: bool,

    /// Build the route table, print it and exit
    #[arg(long)]
    check: bool,
}

/// Services compiled into this binary.
fn builtin_services() -> ServiceRegistry {
    let mut services = ServiceRegistry::new();
    services.bind_service(Arc::new(
        BasicService::new("echo")
            .with_handler("Echo", |req| Ok(CanonicalResponse::ok(req.payload.clone())))
            .with_handler("Ping", |_| Ok(CanonicalResponse::ok("pong"))),
    ));
    services
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "rpc-http-gateway starting"
    );

    // Initialize metrics server
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    // Build routes before anything listens
    let services = builtin_services();
    let mut registry = DispatchRegistry::new();
    registry.register_shape::<serde_json::Value>("json");

    let report = ServiceBuilder::new(&services).build(config.routing.clone(), &mut registry);
    for skipped in &report.skipped {
        tracing::warn!(reason = %skipped, "Route entry disabled");
    }

    if cli.check {
        for (pattern, route) in report.routes.patterns.iter() {
            for (name, operation) in route.operations.iter() {
                println!(
                    "{pattern} {name} -> module {} command {} ({}::{})",
                    route.module_id, operation.command_id, route.service, operation.handler
                );
            }
        }
        for skipped in &report.skipped {
            println!("skipped: {skipped}");
        }
        return Ok(());
    }

    let reader = if cli.anonymous {
        RequestReader::anonymous()
    } else {
        RequestReader::with_decoder(Arc::new(NumericTokenDecoder))
    };
    let dispatcher: Arc<dyn Dispatcher> = Arc::new(registry);
    let server = HttpServer::new(&config, report.routes, reader, dispatcher);

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let _signals = signals::spawn_signal_listener(shutdown.clone());

    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
