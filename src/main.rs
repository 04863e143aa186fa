use anyhow::Context;
use clap::Parser;
use compute_dispatch::auth::{Authenticator, OpenAuthenticator, StaticAuthenticator};
use compute_dispatch::backend::{ComputeRegistry, FunctionBackend, TaskSpec, WorkflowBackend};
use compute_dispatch::config::Config;
use compute_dispatch::dispatch::{handlers as dispatch_handlers, DispatchService};
use compute_dispatch::launchpad::{
    handlers as launchpad_handlers, HttpLaunchPad, LaunchPad, LocalLaunchPad,
};
use compute_dispatch::logging;
use compute_dispatch::queue::QueueNanny;
use compute_dispatch::store::MemoryResultStore;
use compute_dispatch::unpack::TaskUnpacker;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    config.validate()?;
    logging::init_logging(config.log_level);

    tracing::info!("Starting compute dispatch on {}", config.bind);

    // 1. Compute programs:
    let registry = ComputeRegistry::new();
    registry.register("mock", mock_compute);
    tracing::info!("Compute programs: {:?}", registry.list_programs());

    // 2. Result store:
    let store = Arc::new(MemoryResultStore::new());
    if let Some(path) = &config.references {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading references from {}", path.display()))?;
        let document: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("parsing references in {}", path.display()))?;
        store.load_references(&document)?;
    }

    // 3. Backends:
    let function_backend = Arc::new(FunctionBackend::new(registry.clone(), config.workers));

    let local_launchpad = match &config.launchpad_url {
        Some(_) => None,
        None => {
            let local = LocalLaunchPad::new(registry.clone(), config.workers);
            local.clone().start();
            Some(local)
        }
    };
    let launchpad: Arc<dyn LaunchPad> = match (&config.launchpad_url, &local_launchpad) {
        (Some(url), _) => {
            tracing::info!("Using remote workflow engine at {}", url);
            Arc::new(HttpLaunchPad::new(url))
        }
        (None, Some(local)) => local.clone(),
        (None, None) => anyhow::bail!("no workflow engine configured"),
    };
    let workflow_backend = Arc::new(WorkflowBackend::new(launchpad));

    // 4. Queue nanny + background reconciliation:
    let nanny = QueueNanny::new(store.clone());
    nanny
        .clone()
        .spawn_reconciler(config.reconcile_interval(), config.stale_after());

    // 5. Dispatch service:
    let authenticator: Arc<dyn Authenticator> = match config.credentials() {
        Some((user, password)) => Arc::new(StaticAuthenticator::new(user, password)),
        None => {
            tracing::warn!("No API credentials configured, authentication is disabled");
            Arc::new(OpenAuthenticator)
        }
    };
    let unpacker = Arc::new(TaskUnpacker::new(
        registry.clone(),
        &config.default_program,
        config.default_backend,
    ));
    let service = Arc::new(
        DispatchService::new(authenticator, store.clone(), unpacker, nanny)
            .with_backend(function_backend)
            .with_backend(workflow_backend)
            .with_reconcile_on_poll(config.reconcile_on_poll),
    );

    // 6. HTTP Router:
    let mut app = dispatch_handlers::routes(service);
    if config.serve_launchpad {
        if let Some(local) = local_launchpad {
            tracing::info!("Serving in-process workflow engine under /workflows");
            app = app.merge(launchpad_handlers::routes(local));
        }
    }

    // 7. Start HTTP server:
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("HTTP server listening on {}", config.bind);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Stand-in compute program for running the service without a quantum chemistry code.
///
/// Options: `delay_ms` simulates runtime, `fail` makes the computation fail with that message.
async fn mock_compute(spec: TaskSpec) -> anyhow::Result<serde_json::Value> {
    let delay = spec
        .options
        .get("delay_ms")
        .and_then(|v| v.as_u64())
        .unwrap_or(250);
    tokio::time::sleep(Duration::from_millis(delay)).await;

    if let Some(reason) = spec.options.get("fail").and_then(|v| v.as_str()) {
        anyhow::bail!("{}", reason);
    }

    Ok(serde_json::json!({
        "success": true,
        "return_value": 0.0,
        "provenance": {"program": "mock", "method": spec.method},
    }))
}
