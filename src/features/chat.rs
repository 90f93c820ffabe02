//! Chat replies for the web surface, grounded in the knowledge state.

use chrono::Utc;
use uuid::Uuid;

use crate::llm::{prompts, LlmClient};
use crate::store::{ChatMessage, ChatRole, Store};

use super::concept_summary;
use super::FeatureError;

/// Number of prior messages replayed into the chat prompt.
const CHAT_HISTORY_WINDOW: usize = 10;

/// Append the user message to the session, generate a reply, and persist both.
///
/// # Errors
///
/// Returns `FeatureError::Store` for an unknown session and
/// `FeatureError::Llm` on transport failure.
pub async fn chat_reply(
    store: &mut Store,
    llm: &LlmClient,
    session_id: Uuid,
    message: &str,
) -> Result<ChatMessage, FeatureError> {
    store
        .push_message(
            session_id,
            ChatMessage {
                role: ChatRole::User,
                content: message.to_string(),
                at: Utc::now(),
            },
        )
        .await?;

    let history: String = store
        .session(session_id)
        .map(|s| {
            s.messages
                .iter()
                .rev()
                .take(CHAT_HISTORY_WINDOW)
                .rev()
                .map(|m| match m.role {
                    ChatRole::User => format!("Learner: {}", m.content),
                    ChatRole::Assistant => format!("Eumicus: {}", m.content),
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    let user = format!(
        "Knowledge graph summary:\n{}\n\nGoals: {}\n\nConversation so far:\n{history}\n\nReply to the last learner message.",
        concept_summary(store.graph()),
        store.profile().goals.join("; ")
    );

    let reply_text = llm.complete(prompts::CHAT_SYSTEM_PROMPT, &user).await?;
    let reply = ChatMessage {
        role: ChatRole::Assistant,
        content: reply_text,
        at: Utc::now(),
    };
    store.push_message(session_id, reply.clone()).await?;
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, LlmProvider};
    use async_trait::async_trait;

    struct CannedProvider(String);

    #[async_trait]
    impl LlmProvider for CannedProvider {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_chat_reply_appends_both_messages() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path()).await.unwrap();
        let session = store.create_session().await.unwrap();
        let llm = LlmClient::with_provider(
            Box::new(CannedProvider("Review BFS today.".to_string())),
            "test",
        );

        let reply = chat_reply(&mut store, &llm, session.id, "What should I review?")
            .await
            .unwrap();

        assert_eq!(reply.role, ChatRole::Assistant);
        assert_eq!(reply.content, "Review BFS today.");
        let messages = &store.session(session.id).unwrap().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::User);
    }

    #[tokio::test]
    async fn test_chat_reply_unknown_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path()).await.unwrap();
        let llm = LlmClient::with_provider(Box::new(CannedProvider(String::new())), "test");

        let result = chat_reply(&mut store, &llm, Uuid::new_v4(), "hi").await;
        assert!(matches!(result, Err(FeatureError::Store(_))));
    }
}
