// libs/messaging-cell/src/services/messages.rs
use std::sync::Arc;

use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, instrument};

use security_cell::{AuditEntry, AuditEventType, SecurityServices};
use shared_database::{now_timestamp, Database};
use shared_models::auth::User;

use crate::models::{ConversationSummary, DirectMessage, MessagingError, PREVIEW_CHARS};

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<DirectMessage> {
    let read: i64 = row.get(6)?;
    Ok(DirectMessage {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        sender_name: row.get(3)?,
        content: row.get(4)?,
        timestamp: row.get(5)?,
        read: read != 0,
    })
}

pub struct MessagingService {
    db: Database,
    security: Arc<SecurityServices>,
}

impl MessagingService {
    pub fn new(db: Database, security: Arc<SecurityServices>) -> Self {
        Self { db, security }
    }

    fn reveal(&self, mut message: DirectMessage) -> DirectMessage {
        if !message.content.is_empty() {
            message.content = self.security.cipher.decrypt(&message.content);
        }
        message
    }

    #[instrument(skip(self, sender, content), fields(sender_id = sender.id))]
    pub async fn send(&self, sender: &User, receiver_id: i64, content: &str) -> Result<i64, MessagingError> {
        if content.trim().is_empty() {
            return Err(MessagingError::EmptyContent);
        }

        let encrypted = self.security.cipher.encrypt(content)?;
        let sender_id = sender.id;
        let sender_name = sender.username.clone();

        let message_id = self
            .db
            .call(move |conn| {
                let recipient: Option<i64> = conn
                    .query_row("SELECT id FROM users WHERE id = ?1", [receiver_id], |row| row.get(0))
                    .optional()?;
                if recipient.is_none() {
                    return Ok(None);
                }

                conn.execute(
                    "INSERT INTO messages (sender_id, receiver_id, sender_name, content, timestamp, read)
                     VALUES (?1, ?2, ?3, ?4, ?5, 0)",
                    params![sender_id, receiver_id, sender_name, encrypted, now_timestamp()],
                )?;
                Ok(Some(conn.last_insert_rowid()))
            })
            .await?
            .ok_or(MessagingError::UnknownRecipient)?;

        self.security
            .audit
            .log(
                AuditEntry::new(AuditEventType::MessageSent)
                    .with_user(sender_id.to_string())
                    .with_details(format!("To user {}", receiver_id)),
            )
            .await;

        Ok(message_id)
    }

    /// Both directions between `user_id` and `partner_id`, oldest first.
    ///
    /// Messages the partner sent to `user_id` are marked read once fetched.
    pub async fn conversation(&self, user_id: i64, partner_id: i64) -> Result<Vec<DirectMessage>, MessagingError> {
        let messages = self
            .db
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, sender_id, receiver_id, sender_name, content, timestamp, read
                     FROM messages
                     WHERE (sender_id = ?1 AND receiver_id = ?2) OR (sender_id = ?2 AND receiver_id = ?1)
                     ORDER BY timestamp ASC, id ASC",
                )?;
                let rows = stmt
                    .query_map(params![user_id, partner_id], message_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;

                let marked = conn.execute(
                    "UPDATE messages SET read = 1 WHERE sender_id = ?1 AND receiver_id = ?2 AND read = 0",
                    params![partner_id, user_id],
                )?;
                debug!("Marked {} messages from {} as read", marked, partner_id);

                Ok(rows)
            })
            .await?;

        Ok(messages.into_iter().map(|m| self.reveal(m)).collect())
    }

    /// One entry per partner, most recent conversation first.
    pub async fn conversations(&self, user_id: i64) -> Result<Vec<ConversationSummary>, MessagingError> {
        let messages = self
            .db
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, sender_id, receiver_id, sender_name, content, timestamp, read
                     FROM messages
                     WHERE sender_id = ?1 OR receiver_id = ?1
                     ORDER BY timestamp DESC, id DESC",
                )?;
                let rows = stmt
                    .query_map([user_id], message_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        let mut summaries: Vec<ConversationSummary> = Vec::new();
        for message in messages {
            let from_partner = message.sender_id != user_id;
            let partner_id = if from_partner {
                message.sender_id
            } else {
                message.receiver_id
            };

            let index = match summaries.iter().position(|s| s.partner_id == partner_id) {
                Some(index) => index,
                None => {
                    let message = self.reveal(message.clone());
                    summaries.push(ConversationSummary {
                        partner_id,
                        partner_name: if from_partner {
                            message.sender_name
                        } else {
                            "You".to_string()
                        },
                        last_message: message.content.chars().take(PREVIEW_CHARS).collect(),
                        last_timestamp: message.timestamp,
                        unread: 0,
                    });
                    summaries.len() - 1
                }
            };

            if from_partner && !message.read {
                summaries[index].unread += 1;
            }
        }

        Ok(summaries)
    }
}
