//! Repositories module - Coordinatore per tutti i repository del progetto
//!
//! Questo modulo organizza i repository in sotto-moduli separati per una migliore manutenibilità.
//! Ogni repository gestisce le operazioni di database per una specifica entità.

// ************************* NOTA SU SQLX ************************* //

/*
   Le query usano la variante verificata a run-time di sqlx:
   sqlx::query_as::<_, Post>("SELECT ... FROM posts WHERE post_id = ?")
       .bind(post_id)
       .fetch_optional(&self.connection_pool)
       .await
   Così il crate compila anche senza un database raggiungibile (niente DATABASE_URL in build,
   niente cartella .sqlx da tenere allineata). La corrispondenza tra colonne e campi la fa
   #[derive(sqlx::FromRow)] sulle entità, e i test #[sqlx::test] la verificano contro lo schema
   delle migrations.

   Metodo da chiamare in base alle righe attese:
   Nessuna (INSERT/UPDATE/DELETE)  .execute(...).await       -> MySqlQueryResult (rows_affected, last_insert_id)
   Zero o una                      .fetch_optional(...).await -> Option<T>
   Esattamente una                 .fetch_one(...).await      -> T, RowNotFound se manca (COUNT, EXISTS)
   Tante                           .fetch_all(...).await      -> Vec<T>

   Gli enum sono colonne VARCHAR: in scrittura si fa bind di `as_str()`, in lettura ci pensa
   #[sqlx(try_from = "String")]. Le query dinamiche (update parziali, feed con filtri) passano
   da QueryBuilder, mai da format! con valori dell'utente: format! si usa solo per incollare
   le liste di colonne costanti.

   Le scritture su più righe che devono essere atomiche aprono una transazione
   (`self.connection_pool.begin()`) ed eseguono su `&mut *tx`.
*/

// ************************* MODULI REPOSITORY ************************* //

pub mod application;
pub mod chat;
pub mod comment;
pub mod connection;
pub mod message;
pub mod notification;
pub mod post;
pub mod profile;
pub mod submission;
pub mod subscription;
pub mod task;
pub mod traits;
pub mod user;

// Re-esportazione dei trait per facilitare l'import
pub use traits::{Create, Delete, Read, ReadMany, Update};

// Re-esportazione delle struct dei repository per facilitare l'import
pub use application::ApplicationRepository;
pub use chat::ChatRepository;
pub use comment::CommentRepository;
pub use connection::ConnectionRepository;
pub use message::MessageRepository;
pub use notification::NotificationRepository;
pub use post::PostRepository;
pub use profile::ProfileRepository;
pub use submission::SubmissionRepository;
pub use subscription::{PaymentCompletion, PaymentRepository, SubscriptionRepository};
pub use task::TaskRepository;
pub use user::UserRepository;
