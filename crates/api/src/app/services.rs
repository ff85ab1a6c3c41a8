use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use cellcentre_auth::{AuthorizationGate, CredentialVerifier, TokenService};
use cellcentre_employees::{
    EmployeeFactory, EmployeeFilter, EmployeeRepository, NewEmployeeRequest, RoleRef,
    RoleRepository,
};
use cellcentre_events::{Connector, EventBus, EventFactory, PublishQueue, PublishWorker};
use cellcentre_infra::{InMemoryEmployeeStore, InMemoryRoleStore, PostgresEmployeeStore};

use crate::{AuthService, Config, EmployeeGateway};

/// Everything the HTTP handlers need, built once per process.
pub struct AppServices {
    pub auth: AuthService,
    pub gateway: EmployeeGateway,
    pub gate: AuthorizationGate,
}

/// Wire stores, token service, bus and publish queue.
///
/// Connects the bus first: the publish queue (and therefore the server)
/// refuses to start without a live broker connection.
pub async fn build_services(
    config: &Config,
    connector: Arc<dyn Connector>,
) -> anyhow::Result<(AppServices, PublishWorker)> {
    let tokens = Arc::new(
        TokenService::new(&config.jwt_secret)
            .context("token service")?
            .with_ttl(config.token_ttl),
    );
    let gate = AuthorizationGate::new(tokens.clone());
    let verifier = CredentialVerifier::new(config.password_policy);

    let bus = Arc::new(EventBus::new(connector).with_publish_timeout(config.publish_timeout));
    bus.connect(&config.nats_cluster_id, &config.nats_url)
        .await
        .context("event bus connect")?;
    let (publisher, worker) = PublishQueue::start(bus.clone(), EventFactory::employees())
        .await
        .context("publish queue")?;

    let (employees, roles) = stores(config).await?;
    let factory = EmployeeFactory::new(roles);

    if let (Some(email), Some(password)) = (
        config.bootstrap_admin_email.as_deref(),
        config.bootstrap_admin_password.as_deref(),
    ) {
        seed_admin(&employees, &factory, &verifier, email, password).await?;
    }

    let services = AppServices {
        auth: AuthService::new(employees.clone(), verifier.clone(), tokens),
        gateway: EmployeeGateway::new(
            gate.clone(),
            config.mutation_roles.clone(),
            employees,
            factory,
            verifier,
            publisher,
        ),
        gate,
    };
    Ok((services, worker))
}

/// Postgres stores when `DATABASE_URL` is set, in-memory ones otherwise.
async fn stores(
    config: &Config,
) -> anyhow::Result<(Arc<dyn EmployeeRepository>, Arc<dyn RoleRepository>)> {
    match config.database_url.as_deref() {
        Some(url) => {
            let employees = PostgresEmployeeStore::connect(url)
                .await
                .context("employee store connect")?;
            employees
                .ensure_schema()
                .await
                .context("employee store schema")?;
            let roles = employees.role_store();
            info!("using postgres employee storage");
            Ok((Arc::new(employees), Arc::new(roles)))
        }
        None => {
            info!("using in-memory employee storage");
            Ok((
                Arc::new(InMemoryEmployeeStore::new()),
                Arc::new(InMemoryRoleStore::with_defaults()),
            ))
        }
    }
}

async fn seed_admin(
    employees: &Arc<dyn EmployeeRepository>,
    factory: &EmployeeFactory,
    verifier: &CredentialVerifier,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    if employees.get(&EmployeeFilter::by_email(email)).await.is_ok() {
        return Ok(());
    }
    let request = NewEmployeeRequest {
        email: email.to_string(),
        password: password.to_string(),
        name: "Administrator".to_string(),
        phone: String::new(),
        roles: vec![RoleRef::by_name("admin")],
    };
    request.validate().context("bootstrap admin")?;
    let hash = verifier.hash(password).context("bootstrap admin password")?;
    let admin = factory
        .new_employee(&request, hash)
        .await
        .context("bootstrap admin roles")?;
    let admin = employees.create(admin).await.context("bootstrap admin")?;
    info!(employee_id = %admin.id, email, "bootstrap administrator created");
    Ok(())
}
