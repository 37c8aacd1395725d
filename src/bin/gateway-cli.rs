use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;
use url::Url;

use admin_gateway::client::{build_http_client, AuthClient, ClientContext, ServiceClient};
use admin_gateway::config::{load_config, GatewayConfig};
use admin_gateway::effects::{ErrorState, LogNavigator, LogNotifier};
use admin_gateway::observability::logging::env_filter;
use admin_gateway::resilience::{Dispatcher, ErrorClassifier, RetryPolicy};
use admin_gateway::routing::ServiceRouter;
use admin_gateway::session::permissions::ACTIONS;
use admin_gateway::session::{MemoryStorage, SessionStore, User};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Call backend services through the admin gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Config file supplying retry, classifier and timeout settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue one dispatched GET and print the JSON response
    Call {
        /// Service name or prefix, e.g. notification or /notification_service
        #[arg(short, long)]
        service: String,

        /// Session token sent as the Authorization header
        #[arg(short, long)]
        token: String,

        /// User index sent as the index header
        #[arg(short, long, default_value = "")]
        index: String,

        /// Path below the service prefix
        path: String,
    },
    /// Sign in and print the account and, optionally, one page's permissions
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        remember: bool,

        /// Segment and page to check, e.g. Students/Enrollment
        #[arg(long)]
        page: Option<String>,
    },
    /// Print the resolved route table
    Routes,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(&config.observability))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Call {
            service,
            token,
            index,
            path,
        } => call(&cli.url, &config, &service, &token, &index, &path).await,
        Commands::Login {
            email,
            password,
            remember,
            page,
        } => login(&cli.url, &config, &email, &password, remember, page.as_deref()).await,
        Commands::Routes => {
            let router = ServiceRouter::from_config(&config.services)?;
            for (name, prefix, upstream) in router.routes() {
                println!("{:<16} {:<26} {}", name, prefix, upstream);
            }
            Ok(())
        }
    }
}

async fn call(
    base_url: &str,
    config: &GatewayConfig,
    service: &str,
    token: &str,
    index: &str,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let navigator = Arc::new(LogNavigator);
    let session = Arc::new(
        SessionStore::new(Arc::new(MemoryStorage::new()), navigator.clone())
            .with_login_route(config.classifier.login_route.clone()),
    );
    session.restore(
        token,
        User {
            index: index.to_string(),
            ..User::default()
        },
    );

    let classifier = ErrorClassifier::new(
        session.clone(),
        Arc::new(LogNotifier),
        navigator,
        Arc::new(ErrorState::new()),
    )
    .with_config(config.classifier.clone());

    let ctx = ClientContext::new(
        build_http_client(&config.timeouts)?,
        Url::parse(base_url)?,
        session,
        classifier,
    )
    .with_dispatcher(Dispatcher::new(RetryPolicy::from(&config.retries)));

    let prefix = config
        .service(service)
        .map(|route| route.prefix.clone())
        .ok_or_else(|| format!("unknown service '{}'", service))?;
    let client = ServiceClient::new(Arc::new(ctx), prefix);
    match client.get::<Value>(path).await? {
        Some(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        None => eprintln!("Not signed in, nothing sent"),
    }
    Ok(())
}

async fn login(
    base_url: &str,
    config: &GatewayConfig,
    email: &str,
    password: &str,
    remember: bool,
    page: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = SessionStore::new(Arc::new(MemoryStorage::new()), Arc::new(LogNavigator));
    let auth = AuthClient::new(build_http_client(&config.timeouts)?, Url::parse(base_url)?);

    let user = auth.login(&session, email, password, remember).await?;
    println!(
        "{} {} {} ({}{})",
        user.initials(),
        user.email,
        user.index,
        user.role,
        if user.is_super_admin() { ", all pages" } else { "" }
    );

    if let Some(page) = page {
        let (segment, page) = page
            .split_once('/')
            .ok_or("page must look like Segment/Page")?;
        auth.fetch_permissions(&session).await?;
        let flags = session.page_permissions(segment, page);
        let granted: Vec<&str> = ACTIONS.into_iter().filter(|a| flags.allows(a)).collect();
        println!("{}/{}: {}", segment, page, granted.join(", "));
    }
    Ok(())
}
