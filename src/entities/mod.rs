//! Entities module - Entità del dominio applicativo
//!
//! Questo modulo contiene tutte le entità (models) che rappresentano i dati persistiti nel database.
//! Ogni entity corrisponde a una tabella nel database.

pub mod application;
pub mod chat;
pub mod connection;
pub mod enums;
pub mod message;
pub mod notification;
pub mod post;
pub mod profile;
pub mod subscription;
pub mod task;
pub mod user;

// Re-exports per facilitare l'import
pub use application::Application;
pub use chat::{Chat, ChatParticipant};
pub use connection::Connection;
pub use enums::{
    ApplicationStatus, ConnectionStatus, NotificationKind, PaymentStatus, PostType,
    SubmissionStatus, TaskStatus,
};
pub use message::Message;
pub use notification::Notification;
pub use post::{Comment, Post, PostWithStats};
pub use profile::{Education, Experience, Skill};
pub use subscription::{Payment, Subscription};
pub use task::{Submission, Task};
pub use user::User;
