//! In-memory doubles for the core ports, shared by unit tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use parley_types::chat::{Chat, ChatMessage, ChatRole};
use parley_types::error::{AuthError, RepositoryError};
use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError, StreamEvent, Usage};
use parley_types::search::{SearchError, SearchHit};
use parley_types::user::User;
use uuid::Uuid;

use crate::auth::credentials::{IssuedToken, PasswordHasher, TokenCodec};
use crate::auth::repository::UserRepository;
use crate::chat::repository::ChatRepository;
use crate::llm::provider::{LlmProvider, LlmStream};
use crate::search::backend::SearchBackend;

// --- Generation backend ---

/// One step of a scripted stream.
#[derive(Clone, Debug)]
pub enum Step {
    Text(String),
    Fail(String),
    NotConfigured,
    Sleep(Duration),
    /// Never yields again.
    Stall,
}

pub fn text(s: &str) -> Step {
    Step::Text(s.to_string())
}

/// Reply to a non-streaming call.
#[derive(Clone, Debug)]
pub enum Reply {
    Text(String),
    Fail,
    NotConfigured,
    Slow(Duration),
}

#[derive(Clone)]
pub struct MockProvider {
    pub script: Vec<Step>,
    pub reply: Reply,
    pub streamed: Arc<Mutex<Vec<CompletionRequest>>>,
    pub completed: Arc<Mutex<Vec<CompletionRequest>>>,
    /// Set when a stream returned by `stream` is dropped.
    pub stream_dropped: Arc<AtomicBool>,
}

impl MockProvider {
    pub fn new(script: Vec<Step>, reply: Reply) -> Self {
        Self {
            script,
            reply,
            streamed: Arc::default(),
            completed: Arc::default(),
            stream_dropped: Arc::default(),
        }
    }

    pub fn streaming(script: Vec<Step>) -> Self {
        Self::new(script, Reply::Text("NO_SEARCH".into()))
    }
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send {
        self.completed.lock().unwrap().push(request.clone());
        let reply = self.reply.clone();
        let model = request.model.clone();
        async move {
            let content = match reply {
                Reply::Text(text) => text,
                Reply::Fail => {
                    return Err(LlmError::Provider {
                        message: "unreachable".into(),
                    });
                }
                Reply::NotConfigured => return Err(LlmError::NotConfigured),
                Reply::Slow(delay) => {
                    tokio::time::sleep(delay).await;
                    "SEARCH".to_string()
                }
            };
            Ok(CompletionResponse {
                content,
                model,
                stop_reason: None,
                usage: Usage::default(),
            })
        }
    }

    fn stream(&self, request: CompletionRequest) -> LlmStream {
        self.streamed.lock().unwrap().push(request);
        let script = self.script.clone();
        let flag = DropFlag(self.stream_dropped.clone());
        Box::pin(async_stream::stream! {
            let _flag = flag;
            for step in script {
                match step {
                    Step::Text(text) => yield Ok(StreamEvent::TextDelta { text }),
                    Step::Fail(message) => yield Err(LlmError::Stream(message)),
                    Step::NotConfigured => yield Err(LlmError::NotConfigured),
                    Step::Sleep(delay) => tokio::time::sleep(delay).await,
                    Step::Stall => std::future::pending::<()>().await,
                }
            }
            yield Ok(StreamEvent::Done);
        })
    }
}

// --- Transcript store ---

#[derive(Clone, Default)]
pub struct InMemoryChats {
    pub chats: Arc<Mutex<HashMap<Uuid, Chat>>>,
    /// Appends of this role fail with a query error.
    pub fail_role: Arc<Mutex<Option<ChatRole>>>,
    pub appends: Arc<AtomicUsize>,
    pub lookup_delay: Option<Duration>,
}

impl InMemoryChats {
    pub fn with_chat(chat: Chat) -> Self {
        let repo = Self::default();
        repo.chats.lock().unwrap().insert(chat.id, chat);
        repo
    }

    pub fn messages(&self, chat_id: &Uuid) -> Vec<ChatMessage> {
        self.chats
            .lock()
            .unwrap()
            .get(chat_id)
            .map(|c| c.messages.clone())
            .unwrap_or_default()
    }

    pub fn fail_appends_of(&self, role: ChatRole) {
        *self.fail_role.lock().unwrap() = Some(role);
    }
}

impl ChatRepository for InMemoryChats {
    fn create_chat(&self, chat: &Chat) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        let mut chats = self.chats.lock().unwrap();
        let result = if chats.contains_key(&chat.id) {
            Err(RepositoryError::Conflict("chat id".into()))
        } else {
            chats.insert(chat.id, chat.clone());
            Ok(())
        };
        async move { result }
    }

    fn find_owned(
        &self,
        chat_id: &Uuid,
        owner_id: &Uuid,
    ) -> impl Future<Output = Result<Option<Chat>, RepositoryError>> + Send {
        let found = self
            .chats
            .lock()
            .unwrap()
            .get(chat_id)
            .filter(|c| &c.user_id == owner_id)
            .cloned();
        let delay = self.lookup_delay;
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Ok(found)
        }
    }

    fn append_message(
        &self,
        chat_id: &Uuid,
        owner_id: &Uuid,
        message: &ChatMessage,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        let result = if *self.fail_role.lock().unwrap() == Some(message.role) {
            Err(RepositoryError::Query("disk full".into()))
        } else {
            let mut chats = self.chats.lock().unwrap();
            match chats.get_mut(chat_id).filter(|c| &c.user_id == owner_id) {
                Some(chat) => {
                    chat.messages.push(message.clone());
                    chat.updated_at = message.created_at;
                    self.appends.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
                None => Err(RepositoryError::NotFound),
            }
        };
        async move { result }
    }

    fn delete_owned(
        &self,
        chat_id: &Uuid,
        owner_id: &Uuid,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        let mut chats = self.chats.lock().unwrap();
        let owned = chats.get(chat_id).is_some_and(|c| &c.user_id == owner_id);
        let result = if owned {
            chats.remove(chat_id);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        };
        async move { result }
    }

    fn list_owned(
        &self,
        owner_id: &Uuid,
    ) -> impl Future<Output = Result<Vec<Chat>, RepositoryError>> + Send {
        let mut owned: Vec<Chat> = self
            .chats
            .lock()
            .unwrap()
            .values()
            .filter(|c| &c.user_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        async move { Ok(owned) }
    }
}

// --- Search ---

#[derive(Clone, Default)]
pub struct RecordingSearch {
    pub hits: Vec<SearchHit>,
    pub fail: bool,
    /// Sleep this long before answering.
    pub delay: Option<Duration>,
    pub queries: Arc<Mutex<Vec<String>>>,
}

impl RecordingSearch {
    pub fn returning(hits: Vec<(&str, &str)>) -> Self {
        Self {
            hits: hits
                .into_iter()
                .map(|(title, snippet)| SearchHit {
                    title: title.to_string(),
                    snippet: snippet.to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }
}

impl SearchBackend for RecordingSearch {
    fn name(&self) -> &str {
        "recording"
    }

    fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<SearchHit>, SearchError>> + Send {
        self.queries.lock().unwrap().push(query.to_string());
        let result = if self.fail {
            Err(SearchError::Transport("connection refused".into()))
        } else {
            Ok(self.hits.iter().take(limit).cloned().collect())
        };
        let delay = self.delay;
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }
}

// --- Accounts ---

#[derive(Clone, Default)]
pub struct InMemoryUsers {
    pub users: Arc<Mutex<HashMap<Uuid, User>>>,
}

impl UserRepository for InMemoryUsers {
    fn create_user(&self, user: &User) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        let mut users = self.users.lock().unwrap();
        let result = if users.values().any(|u| u.email == user.email) {
            Err(RepositoryError::Conflict("users.email".into()))
        } else {
            users.insert(user.id, user.clone());
            Ok(())
        };
        async move { result }
    }

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send {
        let found = self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned();
        async move { Ok(found) }
    }

    fn find_by_id(
        &self,
        user_id: &Uuid,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send {
        let found = self.users.lock().unwrap().get(user_id).cloned();
        async move { Ok(found) }
    }
}

/// Reversible "hash" so tests can assert on stored values.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        Ok(format!("plain${password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        Ok(hash == format!("plain${password}"))
    }
}

/// Token is the user id prefixed with `t.`.
pub struct PlainTokens;

impl TokenCodec for PlainTokens {
    fn issue(&self, user_id: Uuid) -> Result<IssuedToken, AuthError> {
        Ok(IssuedToken {
            token: format!("t.{user_id}"),
            expires_at: chrono::Utc::now() + chrono::Duration::hours(1),
        })
    }

    fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        token
            .strip_prefix("t.")
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or(AuthError::InvalidToken)
    }
}
