use axum::Router;
use axum::routing::{get, post};
use tracing::*;
use tracing_subscriber::FmtSubscriber;

use bench_link::axumstate::AxumState;
use bench_link::config::BenchConfig;
use bench_link::http::{get_heartbeat, get_limits, handle_websocket_request, post_dashboard};
use bench_link::instrument::ScpiTransport;
use bench_link::instrument::meter::Multimeter;
use bench_link::instrument::supply::PowerSupply;

/// Application & Tokio executor entrypoint
#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        // all spans/events with a level higher than TRACE (e.g, debug, info, warn, etc.)
        // will be written to stdout.
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default tracing subscriber failed");

    let config = BenchConfig::from_env();
    info!("starting with {config:?}");

    // Open the instrument transports: the simulated bench by default, raw
    // SCPI sockets otherwise
    #[cfg(feature = "sim")]
    let (supply_transport, meter_transport): (Box<dyn ScpiTransport>, Box<dyn ScpiTransport>) = {
        let (supply, meter) = bench_link::instrument::sim::sim_bench();
        info!("simulated bench initialised");
        (Box::new(supply), Box::new(meter))
    };

    #[cfg(not(feature = "sim"))]
    let (supply_transport, meter_transport): (Box<dyn ScpiTransport>, Box<dyn ScpiTransport>) = (
        Box::new(connect_with_retry(&config.supply_resource).await),
        Box::new(connect_with_retry(&config.meter_resource).await),
    );

    // Initialize application state: one long-lived handle per instrument
    let state = AxumState::new(
        PowerSupply::new(supply_transport, config.settle),
        Multimeter::new(meter_transport),
        config.settle,
    );

    // Set up Axum routers
    let app = Router::new()
        // GET endpoints
        .route("/heartbeat", get(get_heartbeat))
        .route("/limits", get(get_limits))
        .route("/ws/test/{test_id}", get(handle_websocket_request))
        // POST endpoints
        .route("/dashboard", post(post_dashboard))
        // Give the routers access to the application state
        .with_state(state.clone());

    // Start serving webrequests
    info!("Axum Router & instrument handles initialised");
    info!("Listening on http://{}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Spin until the instrument accepts its SCPI socket
#[cfg(not(feature = "sim"))]
async fn connect_with_retry(resource: &str) -> bench_link::instrument::lxi::LxiTransport {
    use bench_link::instrument::lxi::LxiTransport;
    use tokio::time::{self, Duration};

    loop {
        match LxiTransport::connect(resource).await {
            Ok(transport) => break transport,
            Err(err) => {
                error!("Unable to open instrument transport: {err}, spinning...");
                time::sleep(Duration::from_millis(500)).await;
            }
        }
    }
}
