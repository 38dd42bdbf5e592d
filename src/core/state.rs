//! Application State - Stato globale dell'applicazione
//!
//! Contiene tutti i repository, configurazioni e stato condiviso
//! necessario per gestire l'applicazione.

use crate::core::Config;
use crate::integrations::{FileStorage, LocalStorage, PaymentGateway, StripeGateway};
use crate::repositories::{
    ApplicationRepository, ChatRepository, CommentRepository, ConnectionRepository,
    MessageRepository, NotificationRepository, PaymentRepository, PostRepository,
    ProfileRepository, SubmissionRepository, SubscriptionRepository, TaskRepository,
    UserRepository,
};
use crate::ws::usermap::UserMap;
use sqlx::MySqlPool;
use std::sync::Arc;

/// Stato globale dell'applicazione condiviso tra tutte le route e middleware
pub struct AppState {
    pub user: UserRepository,
    pub profile: ProfileRepository,
    pub post: PostRepository,
    pub comment: CommentRepository,
    pub application: ApplicationRepository,
    pub task: TaskRepository,
    pub submission: SubmissionRepository,
    pub chat: ChatRepository,
    pub msg: MessageRepository,
    pub connection: ConnectionRepository,
    pub notification: NotificationRepository,
    pub subscription: SubscriptionRepository,
    pub payment: PaymentRepository,

    /// Configurazione caricata all'avvio (segreto JWT, piani, limiti upload)
    pub config: Config,

    /// Mappa concorrente degli utenti online con i loro canali WebSocket
    pub users_online: UserMap,

    /// Dove finiscono gli upload
    pub storage: Arc<dyn FileStorage>,

    /// None quando Stripe non è configurato: gli endpoint di pagamento rispondono 503
    pub payments: Option<Arc<dyn PaymentGateway>>,
}

impl AppState {
    /// Crea una nuova istanza di AppState inizializzando tutti i repository
    /// con il pool di connessioni fornito.
    pub fn new(pool: MySqlPool, config: Config) -> Self {
        let storage: Arc<dyn FileStorage> = Arc::new(LocalStorage::new(
            config.upload_dir.clone(),
            format!("{}/uploads", config.public_base_url.trim_end_matches('/')),
        ));
        let payments = StripeGateway::from_config(&config)
            .map(|gateway| Arc::new(gateway) as Arc<dyn PaymentGateway>);

        Self {
            user: UserRepository::new(pool.clone()),
            profile: ProfileRepository::new(pool.clone()),
            post: PostRepository::new(pool.clone()),
            comment: CommentRepository::new(pool.clone()),
            application: ApplicationRepository::new(pool.clone()),
            task: TaskRepository::new(pool.clone()),
            submission: SubmissionRepository::new(pool.clone()),
            chat: ChatRepository::new(pool.clone()),
            msg: MessageRepository::new(pool.clone()),
            connection: ConnectionRepository::new(pool.clone()),
            notification: NotificationRepository::new(pool.clone()),
            subscription: SubscriptionRepository::new(pool.clone()),
            payment: PaymentRepository::new(pool),
            config,
            users_online: UserMap::new(),
            storage,
            payments,
        }
    }

    /// Sostituisce il gateway di pagamento (usato nei test)
    pub fn with_payment_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.payments = Some(gateway);
        self
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt_secret
    }
}
