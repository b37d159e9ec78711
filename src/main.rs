mod telemetry;

use remindr_api::Application;
use remindr_infra::{run_migration, setup_context};
use telemetry::{get_subscriber, init_subscriber};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let subscriber = get_subscriber("remindr_server".into(), "info".into());
    init_subscriber(subscriber);

    let context = setup_context().await;
    run_migration()
        .await
        .expect("Database migrations to succeed");

    let app = Application::new(context).await?;
    app.start().await
}
