//! DTOs module - Data Transfer Objects
//!
//! Questo modulo contiene tutti i DTOs usati per la comunicazione client-server.
//! I DTOs separano la rappresentazione esterna (API) dalla rappresentazione interna (entities).

pub mod application;
pub mod chat;
pub mod connection;
pub mod message;
pub mod notification;
pub mod post;
pub mod query;
pub mod subscription;
pub mod task;
pub mod upload;
pub mod user;
pub mod ws_event;

pub use application::{
    ApplicationDTO, CreateApplicationDTO, NewApplication, UpdateApplicationStatusDTO,
};
pub use chat::{ChatDTO, CreateChatDTO, NewChat};
pub use connection::{ConnectionDTO, NewConnection};
pub use message::{CreateMessageDTO, MessageDTO, SendMessageDTO};
pub use notification::{CreateNotificationDTO, NotificationDTO, UnreadCountDTO};
pub use post::{
    CommentDTO, CreateCommentDTO, CreatePostDTO, NewComment, NewPost, PostDTO, UpdatePostDTO,
};
pub use query::{FeedQuery, MessagesQuery, NotificationsQuery, UserSearchQuery};
pub use subscription::{CheckoutRequestDTO, CheckoutSessionDTO, NewPayment, SubscriptionDTO};
pub use task::{
    CreateSubmissionDTO, CreateTaskDTO, NewSubmission, NewTask, ReviewSubmissionDTO,
    SubmissionDTO, TaskDTO, UpdateTaskDTO,
};
pub use upload::UploadDTO;
pub use user::{
    AuthResponseDTO, CreateEducationDTO, CreateExperienceDTO, CreateUserDTO, LoginDTO, NewUser,
    ProfileDTO, ReplaceSkillsDTO, UpdateProfileDTO, UserDTO,
};
pub use ws_event::{ClientMessageDTO, PushEvent};
