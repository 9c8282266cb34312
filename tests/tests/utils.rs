use mock_service::{MockConfig, MockService};
use std::sync::OnceLock;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        let _ = FmtSubscriber::builder()
            .with_env_filter("stampede=debug,mock_service=debug,axum::rejection=trace")
            .try_init();
    });
}

/// Start a fresh mock orders service and return it with its base URL.
#[allow(unused)]
pub async fn mock(config: MockConfig) -> (MockService, String) {
    init();

    let service = MockService::new(config);
    let addr = service
        .clone()
        .spawn()
        .await
        .expect("mock service failed to bind");

    (service, format!("http://{addr}"))
}
