use crate::api::{Backend, ClientError, HttpBackend};
use crate::cart::CartContext;
use crate::clients::CartClient;
use crate::config::{Config, ConfigError};
use crate::dashboard::{CustomerOrders, DriverDashboard};
use crate::model::Role;
use crate::routing::{OsrmRouter, RouteProvider, RoutingError};
use crate::session::{Session, SessionError};
use crate::store::{FileStore, KeyValueStore, StoreError};
use crate::tracker::DeliveryTracker;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum SystemError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Routing(#[from] RoutingError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("Actor task failed: {0}")]
    Task(#[from] JoinError),
}

/// The external collaborators every session shares.
#[derive(Clone)]
pub struct Infrastructure {
    pub backend: Arc<dyn Backend>,
    pub store: Arc<dyn KeyValueStore>,
    pub routes: Arc<dyn RouteProvider>,
}

impl Infrastructure {
    /// HTTP backend, JSON file store and OSRM routing as configured.
    pub fn from_config(config: &Config) -> Result<Self, SystemError> {
        Ok(Self {
            backend: Arc::new(HttpBackend::new(&config.api)?),
            store: Arc::new(FileStore::open(&config.storage.path)?),
            routes: Arc::new(OsrmRouter::new(&config.routing)?),
        })
    }
}

pub struct CustomerServices {
    pub cart: CartClient,
    pub orders: CustomerOrders,
}

pub struct DriverServices {
    pub dashboard: DriverDashboard,
}

/// Services selected by the session's role. Chosen once, when the system starts.
pub enum RoleServices {
    Customer(CustomerServices),
    Driver(DriverServices),
}

/// Everything one signed-in session runs.
///
/// `AppSystem` is the explicit context object handed to the presentation layer: it
/// owns the session, the role's services and every background task they started.
///
/// ```ignore
/// let infra = Infrastructure::from_config(&config)?;
/// let system = match AppSystem::resume(&config, infra.clone()) {
///     Some(system) => system,
///     None => AppSystem::login(&config, infra, email, password).await?,
/// };
///
/// if let RoleServices::Customer(customer) = &system.services {
///     customer.cart.add_or_update(item, 1).await?;
/// }
///
/// system.shutdown().await?;
/// ```
pub struct AppSystem {
    pub session: Session,
    pub services: RoleServices,
    config: Config,
    infra: Infrastructure,
    handles: Vec<JoinHandle<()>>,
}

impl AppSystem {
    /// Starts the services for an authenticated session.
    pub fn start(session: Session, config: &Config, infra: Infrastructure) -> Self {
        infra.backend.set_token(Some(session.token.clone()));
        let mut handles = Vec::new();

        let services = match session.role {
            Role::Customer => {
                let (cart_actor, cart) = crate::cart::new(config.pricing.delivery_fee);
                handles.push(tokio::spawn(cart_actor.run(CartContext {
                    store: infra.store.clone(),
                    backend: infra.backend.clone(),
                })));
                RoleServices::Customer(CustomerServices {
                    cart,
                    orders: CustomerOrders::new(infra.backend.clone()),
                })
            }
            Role::Driver => RoleServices::Driver(DriverServices {
                dashboard: DriverDashboard::start(infra.backend.clone(), config.polling.badges()),
            }),
        };
        info!(role = %session.role, "Session services started");

        Self {
            session,
            services,
            config: config.clone(),
            infra,
            handles,
        }
    }

    /// Signs in and starts the session's services.
    pub async fn login(
        config: &Config,
        infra: Infrastructure,
        email: &str,
        password: &str,
    ) -> Result<Self, SystemError> {
        let session = Session::login(
            infra.backend.as_ref(),
            infra.store.as_ref(),
            config.api.login_timeout(),
            email,
            password,
        )
        .await?;
        Ok(Self::start(session, config, infra))
    }

    /// Resumes a persisted session, if there is a readable one.
    pub fn resume(config: &Config, infra: Infrastructure) -> Option<Self> {
        let session = Session::restore(infra.store.as_ref())?;
        Some(Self::start(session, config, infra))
    }

    pub fn role(&self) -> Role {
        self.session.role
    }

    /// A tracker for one order or delivery. Dropping it cancels its work.
    pub fn tracker(&self) -> DeliveryTracker {
        DeliveryTracker::new(
            self.infra.backend.clone(),
            self.infra.routes.clone(),
            &self.config.polling,
        )
    }

    /// Stops every background task and waits for the actors to exit.
    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down session services...");
        let AppSystem {
            services, handles, ..
        } = self;

        // Dropping the clients closes the actors' channels.
        match services {
            RoleServices::Customer(customer) => drop(customer),
            RoleServices::Driver(mut driver) => driver.dashboard.stop().await,
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Actor task failed");
                return Err(e.into());
            }
        }

        info!("Session shutdown complete.");
        Ok(())
    }

    /// Shuts down and forgets the persisted session and cart.
    pub async fn logout(self) -> Result<(), SystemError> {
        let infra = self.infra.clone();
        self.shutdown().await?;
        infra.backend.set_token(None);
        Session::logout(infra.store.as_ref())?;
        Ok(())
    }
}
