//! Mutation gateway: authorize, mutate through the store, hand the event to
//! the publish queue, return. The result never depends on publication.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use cellcentre_auth::{
    AuthError, AuthorizationGate, CredentialVerifier, IdentityClaims, RequestContext, RoleName,
};
use cellcentre_employees::{
    Employee, EmployeeError, EmployeeFactory, EmployeeFilter, EmployeeRepository,
    NewEmployeeRequest, StoreError, UpdateEmployeeRequest,
};
use cellcentre_events::{Mutation, PublishQueue};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("invalid employee data: {0}")]
    InvalidEntityData(String),

    #[error("invalid employee roles: {0}")]
    InvalidEntityRoles(String),

    #[error("store round-trip failed: {0}")]
    Persistence(#[from] StoreError),
}

impl From<EmployeeError> for GatewayError {
    fn from(e: EmployeeError) -> Self {
        match e {
            EmployeeError::InvalidData(msg) => GatewayError::InvalidEntityData(msg),
            EmployeeError::InvalidRoles(msg) => GatewayError::InvalidEntityRoles(msg),
            EmployeeError::Store(e) => GatewayError::Persistence(e),
        }
    }
}

pub struct EmployeeGateway {
    gate: AuthorizationGate,
    mutation_roles: Vec<RoleName>,
    employees: Arc<dyn EmployeeRepository>,
    factory: EmployeeFactory,
    verifier: CredentialVerifier,
    publisher: PublishQueue,
}

impl EmployeeGateway {
    pub fn new(
        gate: AuthorizationGate,
        mutation_roles: Vec<RoleName>,
        employees: Arc<dyn EmployeeRepository>,
        factory: EmployeeFactory,
        verifier: CredentialVerifier,
        publisher: PublishQueue,
    ) -> Self {
        Self {
            gate,
            mutation_roles,
            employees,
            factory,
            verifier,
            publisher,
        }
    }

    fn authorize(&self, ctx: &mut RequestContext) -> Result<IdentityClaims, GatewayError> {
        Ok(self.gate.authorize_roles(ctx, &self.mutation_roles)?)
    }

    /// Token required, no role.
    #[instrument(skip(self, ctx), err(Display))]
    pub async fn get_employee(
        &self,
        ctx: &mut RequestContext,
        filter: &EmployeeFilter,
    ) -> Result<Employee, GatewayError> {
        if ctx.claims().is_none() {
            self.gate.authenticate(ctx)?;
        }
        if filter.is_empty() {
            return Err(GatewayError::InvalidParameters(
                "filter needs an id or an email".to_string(),
            ));
        }
        Ok(self.employees.get(filter).await?.redacted())
    }

    #[instrument(skip_all, fields(email = %request.email), err(Display))]
    pub async fn new_employee(
        &self,
        ctx: &mut RequestContext,
        request: NewEmployeeRequest,
    ) -> Result<Employee, GatewayError> {
        let claims = self.authorize(ctx)?;
        request.validate()?;

        let password_hash = self.verifier.hash(&request.password).map_err(|_| {
            GatewayError::InvalidEntityData("password could not be hashed".to_string())
        })?;
        let employee = self.factory.new_employee(&request, password_hash).await?;
        let stored = self.employees.create(employee).await?;

        info!(employee_id = %stored.id, by = %claims.login, "employee created");
        self.publisher
            .submit(claims, Mutation::Created(stored.redacted()));
        Ok(stored.redacted())
    }

    #[instrument(skip_all, fields(employee_id = %request.id), err(Display))]
    pub async fn update_employee(
        &self,
        ctx: &mut RequestContext,
        request: UpdateEmployeeRequest,
    ) -> Result<Employee, GatewayError> {
        let claims = self.authorize(ctx)?;
        request.validate()?;

        let password_hash = match request.password.as_deref() {
            Some(password) => Some(self.verifier.hash(password).map_err(|_| {
                GatewayError::InvalidEntityData("password could not be hashed".to_string())
            })?),
            None => None,
        };
        let changes = self.factory.changes(&request, password_hash).await?;
        let updated = self.employees.update(request.id, changes).await?;

        info!(employee_id = %updated.id, by = %claims.login, "employee updated");
        self.publisher.submit(claims, Mutation::Updated(request));
        Ok(updated.redacted())
    }

    #[instrument(skip(self, ctx), err(Display))]
    pub async fn delete_employee(
        &self,
        ctx: &mut RequestContext,
        filter: EmployeeFilter,
    ) -> Result<(), GatewayError> {
        let claims = self.authorize(ctx)?;
        if filter.is_empty() {
            return Err(GatewayError::InvalidParameters(
                "filter needs an id or an email".to_string(),
            ));
        }
        self.employees.delete(&filter).await?;

        info!(by = %claims.login, "employee deleted");
        self.publisher.submit(claims, Mutation::Deleted(filter));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellcentre_auth::{AUTHORIZATION_KEY, PasswordPolicy, RequestMetadata, TokenService};
    use cellcentre_core::{EmployeeId, EntityId};
    use cellcentre_employees::RoleRef;
    use cellcentre_events::{
        Broker, EMPLOYEES_CHANNEL, EventBus, EventEnvelope, EventFactory, EventType,
        InMemoryBroker, InMemoryConnector, PublishWorker, decode, handler_fn,
    };
    use cellcentre_infra::{InMemoryEmployeeStore, InMemoryRoleStore};

    struct Fixture {
        gateway: EmployeeGateway,
        tokens: Arc<TokenService>,
        store: Arc<InMemoryEmployeeStore>,
        _worker: PublishWorker,
    }

    async fn fixture() -> Fixture {
        fixture_on(Arc::new(InMemoryBroker::new())).await
    }

    async fn fixture_on(broker: Arc<InMemoryBroker>) -> Fixture {
        let tokens = Arc::new(TokenService::new("gateway-secret").unwrap());
        let bus = Arc::new(EventBus::new(Arc::new(InMemoryConnector::new(broker))));
        bus.connect("cell-centre", "mem://").await.unwrap();
        let (publisher, worker) = PublishQueue::start(bus, EventFactory::employees())
            .await
            .unwrap();
        let store = Arc::new(InMemoryEmployeeStore::new());
        let gateway = EmployeeGateway::new(
            AuthorizationGate::new(tokens.clone()),
            vec![RoleName::from("admin")],
            store.clone(),
            EmployeeFactory::new(Arc::new(InMemoryRoleStore::with_defaults())),
            CredentialVerifier::new(PasswordPolicy::low_cost()),
            publisher,
        );
        Fixture {
            gateway,
            tokens,
            store,
            _worker: worker,
        }
    }

    fn ctx_with_roles(tokens: &TokenService, roles: &[&str]) -> RequestContext {
        let now = chrono::Utc::now();
        let claims = IdentityClaims {
            entity: "employee".to_string(),
            entity_id: EntityId::new(),
            login: "boss@page.com".to_string(),
            roles: roles.iter().map(|r| RoleName::from(r.to_string())).collect(),
            issued_at: now,
            expires_at: now + chrono::Duration::minutes(5),
        };
        let token = tokens.sign(&claims).unwrap();
        RequestContext::new(RequestMetadata::new().with(AUTHORIZATION_KEY, token))
    }

    fn request(email: &str) -> NewEmployeeRequest {
        NewEmployeeRequest {
            email: email.to_string(),
            password: "pw".to_string(),
            name: "N".to_string(),
            phone: String::new(),
            roles: vec![RoleRef::by_name("serviceman")],
        }
    }

    #[tokio::test]
    async fn create_stores_hashed_credential_and_returns_redacted() {
        let f = fixture().await;
        let mut ctx = ctx_with_roles(&f.tokens, &["admin"]);
        let created = f.gateway.new_employee(&mut ctx, request("x@page.com")).await.unwrap();
        assert!(created.password_hash.is_empty());
        assert_eq!(created.roles[0].name, "serviceman");

        let stored = f
            .store
            .get(&EmployeeFilter::by_id(created.id))
            .await
            .unwrap();
        assert!(stored.password_hash.starts_with("$argon2id$"));
        assert_eq!(ctx.claims().map(|c| c.login.as_str()), Some("boss@page.com"));
    }

    #[tokio::test]
    async fn mutation_without_allowed_role_touches_nothing() {
        let f = fixture().await;
        let mut ctx = ctx_with_roles(&f.tokens, &["serviceman"]);
        let err = f
            .gateway
            .new_employee(&mut ctx, request("x@page.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Auth(AuthError::InsufficientRights)));
        assert!(f.store.is_empty());
        assert!(ctx.claims().is_none());
    }

    #[tokio::test]
    async fn update_with_empty_roles_is_rejected() {
        let f = fixture().await;
        let mut ctx = ctx_with_roles(&f.tokens, &["admin"]);
        let mut update = UpdateEmployeeRequest::new(EmployeeId::new());
        update.roles = Some(vec![]);
        let err = f.gateway.update_employee(&mut ctx, update).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidEntityRoles(_)));
    }

    #[tokio::test]
    async fn delete_of_missing_employee_is_a_persistence_error() {
        let f = fixture().await;
        let mut ctx = ctx_with_roles(&f.tokens, &["admin"]);
        let err = f
            .gateway
            .delete_employee(&mut ctx, EmployeeFilter::by_email("ghost@page.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Persistence(StoreError::NotFound(_))));

        let err = f
            .gateway
            .delete_employee(&mut ctx, EmployeeFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidParameters(_)));
    }

    #[tokio::test]
    async fn reads_need_only_a_token() {
        let f = fixture().await;
        let mut admin = ctx_with_roles(&f.tokens, &["admin"]);
        let created = f.gateway.new_employee(&mut admin, request("r@page.com")).await.unwrap();

        let mut reader = ctx_with_roles(&f.tokens, &[]);
        let found = f
            .gateway
            .get_employee(&mut reader, &EmployeeFilter::by_email("r@page.com"))
            .await
            .unwrap();
        assert_eq!(found.id, created.id);

        let mut anonymous = RequestContext::new(RequestMetadata::new());
        let err = f
            .gateway
            .get_employee(&mut anonymous, &EmployeeFilter::by_email("r@page.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Auth(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn published_events_name_the_employees_aggregate() {
        let broker = Arc::new(InMemoryBroker::new());
        let seen = Arc::new(std::sync::Mutex::new(Vec::<EventEnvelope>::new()));
        let sink = seen.clone();
        let _observer = broker
            .queue_subscribe(
                EMPLOYEES_CHANNEL,
                "gateway-observer",
                "gateway-durable",
                handler_fn(move |payload| {
                    let sink = sink.clone();
                    async move {
                        sink.lock().unwrap().push(decode(&payload).unwrap());
                    }
                }),
            )
            .await
            .unwrap();

        let Fixture {
            gateway,
            tokens,
            _worker: worker,
            ..
        } = fixture_on(broker).await;
        let mut ctx = ctx_with_roles(&tokens, &["admin"]);
        let created = gateway.new_employee(&mut ctx, request("e@page.com")).await.unwrap();
        let mut update = UpdateEmployeeRequest::new(created.id);
        update.name = Some("Renamed".to_string());
        gateway.update_employee(&mut ctx, update).await.unwrap();
        gateway
            .delete_employee(&mut ctx, EmployeeFilter::by_email("e@page.com"))
            .await
            .unwrap();
        worker.shutdown().await;

        for _ in 0..50 {
            if seen.lock().unwrap().len() == 3 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let seen = seen.lock().unwrap();
        let types: Vec<EventType> = seen.iter().map(|e| e.event_type()).collect();
        assert_eq!(
            types,
            vec![EventType::NewEntity, EventType::UpdateEntity, EventType::DeleteEntity]
        );
        for event in seen.iter() {
            assert_eq!(event.channel(), EMPLOYEES_CHANNEL);
            assert_eq!(event.aggregate_type(), EMPLOYEES_CHANNEL);
            assert_eq!(event.originator().login, "boss@page.com");
        }
        assert_eq!(seen[0].aggregate_id(), created.id.to_string());
        assert_eq!(seen[2].aggregate_id(), "e@page.com");
    }
}
