//! Demo binary: runs the positioning pipeline against a simulated radio.
//!
//! Pass a JSON configuration file path to override the compiled-in defaults.

use uwb_rtls::{
    AnchorRegistry, LeastSquaresSolver, MockRangingDriver, NearestAnchorSelector, Position,
    PositioningPipeline, RtlsConfig,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => RtlsConfig::load_from_file(path)?,
        None => RtlsConfig::default(),
    };

    let registry = AnchorRegistry::new(config.anchors.clone())?;

    // Simulated tag standing in the middle of the room
    let truth = Position::new(1.4, 1.2, 1.0);
    let mut driver = MockRangingDriver::new();
    for anchor in registry.iter() {
        driver.set_distance(anchor.address, truth.distance_to(&anchor.position));
    }

    let mut pipeline = PositioningPipeline::new(
        registry,
        NearestAnchorSelector,
        driver,
        LeastSquaresSolver::default(),
        config.tag,
    );

    for _ in 0..3 {
        match pipeline.perform_positioning_default() {
            Ok(estimate) => println!(
                "position: ({:.3}, {:.3}, {:.3})  error: {:.4} m",
                estimate.position.x, estimate.position.y, estimate.position.z, estimate.error
            ),
            Err(error) => eprintln!("positioning failed (status {}): {error}", error.status_code()),
        }
    }

    Ok(())
}
