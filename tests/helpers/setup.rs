use remindr_api::Application;
use remindr_domain::User;
use remindr_infra::{Context, InMemoryDispatcher, InMemoryMessenger, Messengers};
use std::sync::Arc;

pub struct TestApp {
    pub ctx: Context,
    pub address: String,
    pub delivery_key: String,
    pub dispatcher: Arc<InMemoryDispatcher>,
    pub email: Arc<InMemoryMessenger>,
    pub sms: Arc<InMemoryMessenger>,
}

impl TestApp {
    pub async fn create_user(&self) -> User {
        let mut user = User::new("owner@example.com".into());
        user.phone = Some("+15555550123".into());
        self.ctx
            .repos
            .users
            .insert(&user)
            .await
            .expect("To insert user");
        user
    }
}

// Launch the application as a background task
pub async fn spawn_app() -> TestApp {
    let mut ctx = Context::create_inmemory();
    ctx.config.port = 0; // Random port

    let dispatcher = Arc::new(InMemoryDispatcher::new());
    ctx.dispatcher = dispatcher.clone();
    let email = Arc::new(InMemoryMessenger::new());
    let sms = Arc::new(InMemoryMessenger::new());
    ctx.messengers = Messengers {
        email: email.clone(),
        sms: sms.clone(),
        voice: Arc::new(InMemoryMessenger::new()),
    };
    let delivery_key = ctx.config.delivery_callback_key.clone();

    let application = Application::new(ctx.clone())
        .await
        .expect("Failed to build application.");
    let address = format!("http://localhost:{}/api/v1", application.port());

    let _ = actix_web::rt::spawn(async move {
        application
            .start()
            .await
            .expect("Expected application to start");
    });

    TestApp {
        ctx,
        address,
        delivery_key,
        dispatcher,
        email,
        sms,
    }
}
