//! Enumerazioni - Tipi enumerati utilizzati nelle entità
//!
//! Nel database sono salvati come stringhe maiuscole (colonne VARCHAR); la
//! conversione avviene con `as_str()` in scrittura e `TryFrom<String>` in
//! lettura (`#[sqlx(try_from = "String")]` sui campi delle entità).

use serde::{Deserialize, Serialize};

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                match value.as_str() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!("invalid {} value '{}'", stringify!($name), other)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// ********************* ENUMERAZIONI UTILI **********************//

string_enum! {
    /// Tipo di post: solo PROJECT e RECRUITMENT accettano candidature
    PostType {
        Project => "PROJECT",
        Recruitment => "RECRUITMENT",
        Status => "STATUS",
    }
}

impl PostType {
    pub fn accepts_applications(&self) -> bool {
        matches!(self, PostType::Project | PostType::Recruitment)
    }
}

string_enum! {
    ApplicationStatus {
        Pending => "PENDING",
        Approved => "APPROVED",
        Rejected => "REJECTED",
    }
}

string_enum! {
    TaskStatus {
        Open => "OPEN",
        Completed => "COMPLETED",
        Closed => "CLOSED",
    }
}

string_enum! {
    SubmissionStatus {
        Pending => "PENDING",
        Accepted => "ACCEPTED",
        Rejected => "REJECTED",
    }
}

string_enum! {
    ConnectionStatus {
        Pending => "PENDING",
        Accepted => "ACCEPTED",
    }
}

string_enum! {
    NotificationKind {
        ConnectionRequest => "CONNECTION_REQUEST",
        ConnectionAccepted => "CONNECTION_ACCEPTED",
        ApplicationReceived => "APPLICATION_RECEIVED",
        ApplicationStatus => "APPLICATION_STATUS",
        PostLiked => "POST_LIKED",
        PostCommented => "POST_COMMENTED",
        TaskAssigned => "TASK_ASSIGNED",
        SubmissionReceived => "SUBMISSION_RECEIVED",
        SubmissionReviewed => "SUBMISSION_REVIEWED",
    }
}

string_enum! {
    PaymentStatus {
        Pending => "PENDING",
        Completed => "COMPLETED",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_strings_match_serde_names() {
        let json = serde_json::to_string(&NotificationKind::ApplicationStatus).unwrap();
        assert_eq!(json, "\"APPLICATION_STATUS\"");
        assert_eq!(
            NotificationKind::try_from("APPLICATION_STATUS".to_string()),
            Ok(NotificationKind::ApplicationStatus)
        );
    }

    #[test]
    fn unknown_value_is_rejected() {
        assert!(PostType::try_from("BLOG".to_string()).is_err());
    }

    #[test]
    fn only_project_and_recruitment_accept_applications() {
        assert!(PostType::Project.accepts_applications());
        assert!(PostType::Recruitment.accepts_applications());
        assert!(!PostType::Status.accepts_applications());
    }
}
