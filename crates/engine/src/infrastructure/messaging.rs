//! Messaging adapter that logs whispers and keeps a delivery record.

use std::sync::Mutex;

use async_trait::async_trait;

use npcvibes_domain::UserId;

use crate::infrastructure::ports::{MessagingPort, Notification, TransportError};

/// A whisper as it was handed to the chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub recipients: Vec<UserId>,
    pub notification: Notification,
}

/// Writes every whisper to the log and remembers it.
#[derive(Default)]
pub struct TracingMessenger {
    deliveries: Mutex<Vec<Delivery>>,
    alerts: Mutex<Vec<String>>,
}

impl TracingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl MessagingPort for TracingMessenger {
    async fn whisper(
        &self,
        recipients: &[UserId],
        notification: &Notification,
    ) -> Result<(), TransportError> {
        if recipients.is_empty() {
            return Ok(());
        }

        let mut unique: Vec<UserId> = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            if !unique.contains(recipient) {
                unique.push(recipient.clone());
            }
        }

        tracing::info!(
            recipients = ?unique,
            title = %notification.title(),
            "{}",
            notification.body()
        );

        self.deliveries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(Delivery {
                recipients: unique,
                notification: notification.clone(),
            });
        Ok(())
    }

    async fn alert(&self, message: &str) -> Result<(), TransportError> {
        tracing::error!(alert = message, "User-visible failure");
        self.alerts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(message.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_recipients_are_collapsed() {
        let messenger = TracingMessenger::new();
        let gm = UserId::new("gm");
        let notification = Notification::FirstSight {
            pc_name: "Aria".into(),
            npc_name: "Bram".into(),
        };

        messenger
            .whisper(&[gm.clone(), gm.clone()], &notification)
            .await
            .expect("whisper");

        let deliveries = messenger.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].recipients, vec![gm]);
    }

    #[tokio::test]
    async fn no_recipients_means_no_delivery() {
        let messenger = TracingMessenger::new();
        let notification = Notification::FirstSight {
            pc_name: "Aria".into(),
            npc_name: "Bram".into(),
        };
        messenger.whisper(&[], &notification).await.expect("whisper");
        assert!(messenger.deliveries().is_empty());
    }
}
