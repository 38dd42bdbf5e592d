use dashmap::DashMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

use crate::dtos::PushEvent;

/// Utenti con un WebSocket aperto: user_id -> canale verso il task di scrittura
pub struct UserMap {
    users_online: DashMap<i32, UnboundedSender<PushEvent>>,
}

impl Default for UserMap {
    fn default() -> Self {
        Self::new()
    }
}

impl UserMap {
    pub fn new() -> Self {
        UserMap {
            users_online: DashMap::new(),
        }
    }

    /// Una sola connessione per utente: una nuova sostituisce la precedente
    #[instrument(skip(self, tx))]
    pub fn register_online(&self, user_id: i32, tx: UnboundedSender<PushEvent>) {
        if self.users_online.insert(user_id, tx).is_some() {
            info!("User {} reconnected, previous socket replaced", user_id);
        }
        info!("Total online users: {}", self.users_online.len());
    }

    /// Rimuove l'utente solo se il canale registrato è ancora quello della connessione che chiude
    #[instrument(skip(self, tx))]
    pub fn remove_from_online(&self, user_id: &i32, tx: &UnboundedSender<PushEvent>) {
        if self
            .users_online
            .remove_if(user_id, |_, current| current.same_channel(tx))
            .is_some()
        {
            info!("User {} removed from online", user_id);
        }
    }

    #[instrument(skip(self, event))]
    pub fn send_if_online(&self, user_id: &i32, event: PushEvent) {
        if let Some(entry) = self.users_online.get(user_id) {
            if let Err(e) = entry.value().send(event) {
                warn!("Failed to push event to user {}: {:?}", user_id, e);
            }
        } else {
            debug!("User {} not online, event not pushed", user_id);
        }
    }

    pub fn online_count(&self) -> usize {
        self.users_online.len()
    }

    pub fn is_user_online(&self, user_id: &i32) -> bool {
        self.users_online.contains_key(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn events_reach_online_users_only() {
        let map = UserMap::new();
        let (tx, mut rx) = unbounded_channel();
        map.register_online(1, tx);

        map.send_if_online(&1, PushEvent::Error("hello".to_string()));
        map.send_if_online(&2, PushEvent::Error("nobody".to_string()));

        assert!(matches!(rx.try_recv(), Ok(PushEvent::Error(ref s)) if s == "hello"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn stale_connection_does_not_remove_newer_one() {
        let map = UserMap::new();
        let (old_tx, _old_rx) = unbounded_channel();
        let (new_tx, _new_rx) = unbounded_channel();

        map.register_online(1, old_tx.clone());
        map.register_online(1, new_tx.clone());
        map.remove_from_online(&1, &old_tx);
        assert!(map.is_user_online(&1));

        map.remove_from_online(&1, &new_tx);
        assert!(!map.is_user_online(&1));
        assert_eq!(map.online_count(), 0);
    }
}
