//! Chat routing: small talk, file-grounded answers, retrieval, fallback.

use crate::server::error::ApiError;
use crate::server::state::AppState;
use regex::Regex;
use scholar_ai::{truncate_chars, RagAnswer};
use scholar_core::UserId;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::{debug, warn};

pub const INITIALIZING: &str = "System is initializing, please try again in a moment.";
pub const NO_CONTEXT: &str = "I'm not sure about that based on the current curriculum data.";
pub const EMPTY_FILE: &str = "I couldn't read any text from that file.";
pub const APOLOGY: &str = "Sorry, I ran into a problem answering that. Please try again later.";

/// Patterns matched against the lowercased query, first match wins.
static GREETINGS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"^(hi|hello|hey)\b", "Hello! How can I help you today?"),
        (r"^(bye|goodbye|see you)\b", "Goodbye! Have a great day."),
    ]
    .into_iter()
    .filter_map(|(pattern, reply)| Regex::new(pattern).ok().map(|re| (re, reply)))
    .collect()
});

static NON_WORD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[\s\W]+").ok());

static THANKS: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b(thankyou|thanks|thanx|thx|ty)\b").ok());

/// Which path produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatSource {
    SmallTalk,
    File,
    Rag,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub response: String,
    pub source: ChatSource,
}

impl ChatReply {
    fn new(response: impl Into<String>, source: ChatSource) -> Self {
        Self {
            response: response.into(),
            source,
        }
    }

    /// The "initializing" notice is not an answer and is not stored.
    pub fn should_persist(&self) -> bool {
        self.response != INITIALIZING
    }
}

/// Canned reply for greetings, farewells and thanks.
pub fn small_talk(query: &str) -> Option<&'static str> {
    let q = query.trim().to_lowercase();

    let greeting = GREETINGS
        .iter()
        .find(|(re, _)| re.is_match(&q))
        .map(|(_, reply)| *reply);
    if greeting.is_some() {
        return greeting;
    }

    // "thank you!" and "thank-you" both collapse to "thankyou"
    let normalized = match NON_WORD.as_ref() {
        Some(re) => re.replace_all(&q, "").into_owned(),
        None => q,
    };
    match THANKS.as_ref() {
        Some(re) if re.is_match(&normalized) => Some("You're welcome!"),
        _ => None,
    }
}

/// Produce a reply for one question.
///
/// Only caller mistakes are errors (empty query, unknown file). Failures of
/// the hosted services degrade to [`APOLOGY`].
pub async fn dispatch(
    state: &AppState,
    user_id: UserId,
    query: &str,
    file_id: Option<&str>,
) -> Result<ChatReply, ApiError> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return Err(ApiError::BadRequest("Query must not be empty".to_string()));
    }

    if let Some(reply) = small_talk(&q) {
        debug!("Small talk reply");
        return Ok(ChatReply::new(reply, ChatSource::SmallTalk));
    }

    if let Some(file_id) = file_id.filter(|id| !id.trim().is_empty()) {
        let file = state.db.get_uploaded_file(user_id, file_id)?;
        if file.content_text.trim().is_empty() {
            return Ok(ChatReply::new(EMPTY_FILE, ChatSource::File));
        }

        let Some(qa) = state.qa.as_ref() else {
            return Ok(ChatReply::new(INITIALIZING, ChatSource::Fallback));
        };

        let (text, truncated) = truncate_chars(&file.content_text, state.config.chat.max_file_chars);
        if truncated {
            debug!("Truncated {} to {} characters", file.filename, state.config.chat.max_file_chars);
        }

        return Ok(match qa.answer_from_text(&q, &file.filename, &text).await {
            Ok(answer) => ChatReply::new(answer, ChatSource::File),
            Err(e) => {
                warn!("File-grounded answer failed: {}", e);
                ChatReply::new(APOLOGY, ChatSource::Fallback)
            }
        });
    }

    let Some(qa) = state.qa.as_ref() else {
        return Ok(ChatReply::new(INITIALIZING, ChatSource::Fallback));
    };

    Ok(match qa.answer(&q).await {
        Ok(RagAnswer::Answered { answer, sources }) => {
            debug!("Answered from {}", sources.join(", "));
            ChatReply::new(answer, ChatSource::Rag)
        }
        Ok(RagAnswer::NoContext) => ChatReply::new(NO_CONTEXT, ChatSource::Fallback),
        Err(e) => {
            warn!("Retrieval answer failed: {}", e);
            ChatReply::new(APOLOGY, ChatSource::Fallback)
        }
    })
}
