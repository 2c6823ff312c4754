/**
 * Real-time Event Frames
 *
 * Wire format of the real-time channel. Every frame is a JSON text message
 * of the form `{"event": <name>, "data": <payload>}`.
 *
 * Client frames are decoded by hand from an envelope that keeps `data` as a
 * borrowed `RawValue`, so a `note-update` payload can be re-broadcast
 * byte-for-byte without a decode/encode round trip.
 *
 * # Client events
 *
 * - `authenticate` - token string, raw or `Bearer <token>`
 * - `join-note` / `leave-note` - note id (number or numeric string)
 * - `note-update` - `{noteId, title?, content}`
 * - `logout` - close the channel
 *
 * # Server events
 *
 * - `authenticated`, `auth-error`, `joined-note`, `note-updated`,
 *   `update-rejected`, `error`
 */
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;

use crate::shared::error::SharedError;
use crate::shared::{NoteId, UserId};

#[derive(Deserialize)]
struct Envelope<'a> {
    event: String,
    #[serde(borrow, default)]
    data: Option<&'a RawValue>,
}

/// Frame received from a client
#[derive(Debug, Clone, Copy)]
pub enum ClientEvent<'a> {
    /// Present a credential for this connection
    Authenticate(&'a RawValue),
    /// Subscribe to updates of a note
    JoinNote(NoteId),
    /// Stop receiving updates of a note
    LeaveNote(NoteId),
    /// Edit a note; the payload is kept verbatim
    NoteUpdate(&'a RawValue),
    /// Close the channel
    Logout,
}

impl<'a> ClientEvent<'a> {
    /// Decode a text frame
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` for frames that are not a JSON envelope and
    /// `ValidationError` for unknown event names or a missing/invalid `data`.
    pub fn parse(frame: &'a str) -> Result<Self, SharedError> {
        let envelope: Envelope<'a> = serde_json::from_str(frame)?;
        match envelope.event.as_str() {
            "authenticate" => Ok(Self::Authenticate(require_data(envelope.data)?)),
            "join-note" => Ok(Self::JoinNote(parse_note_id(require_data(envelope.data)?)?)),
            "leave-note" => Ok(Self::LeaveNote(parse_note_id(require_data(envelope.data)?)?)),
            "note-update" => Ok(Self::NoteUpdate(require_data(envelope.data)?)),
            "logout" => Ok(Self::Logout),
            other => Err(SharedError::validation(
                "event",
                format!("unknown event '{}'", other),
            )),
        }
    }

    /// Event name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Self::Authenticate(_) => "authenticate",
            Self::JoinNote(_) => "join-note",
            Self::LeaveNote(_) => "leave-note",
            Self::NoteUpdate(_) => "note-update",
            Self::Logout => "logout",
        }
    }
}

fn require_data(data: Option<&RawValue>) -> Result<&RawValue, SharedError> {
    data.ok_or_else(|| SharedError::validation("data", "missing event payload"))
}

fn parse_note_id(raw: &RawValue) -> Result<NoteId, SharedError> {
    let repr: NoteIdRepr = serde_json::from_str(raw.get())
        .map_err(|_| SharedError::validation("noteId", "must be a note id"))?;
    repr.into_id()
}

/// Extract the token string carried by an `authenticate` frame
///
/// Accepts a bare JSON string or an object with a `token` field.
pub fn parse_token(raw: &RawValue) -> Result<String, SharedError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TokenRepr {
        Bare(String),
        Wrapped { token: String },
    }

    match serde_json::from_str::<TokenRepr>(raw.get()) {
        Ok(TokenRepr::Bare(token)) | Ok(TokenRepr::Wrapped { token }) => Ok(token),
        Err(_) => Err(SharedError::validation("token", "must be a string")),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NoteIdRepr {
    Number(NoteId),
    Text(String),
}

impl NoteIdRepr {
    fn into_id(self) -> Result<NoteId, SharedError> {
        match self {
            Self::Number(id) => Ok(id),
            Self::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| SharedError::validation("noteId", "must be numeric")),
        }
    }
}

fn deserialize_note_id<'de, D>(deserializer: D) -> Result<NoteId, D::Error>
where
    D: Deserializer<'de>,
{
    NoteIdRepr::deserialize(deserializer)?
        .into_id()
        .map_err(serde::de::Error::custom)
}

/// Body of a `note-update` frame
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NoteUpdatePayload {
    #[serde(rename = "noteId", deserialize_with = "deserialize_note_id")]
    pub note_id: NoteId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
}

impl NoteUpdatePayload {
    /// Decode the payload of a `note-update` frame
    pub fn from_raw(raw: &RawValue) -> Result<Self, SharedError> {
        serde_json::from_str(raw.get())
            .map_err(|e| SharedError::validation("data", format!("invalid note update: {}", e)))
    }

    /// Best-effort note id of a payload that failed full decoding
    pub fn peek_note_id(raw: &RawValue) -> Option<NoteId> {
        #[derive(Deserialize)]
        struct Peek {
            #[serde(rename = "noteId")]
            note_id: NoteIdRepr,
        }
        serde_json::from_str::<Peek>(raw.get())
            .ok()
            .and_then(|peek| peek.note_id.into_id().ok())
    }
}

/// Body of an `update-rejected` frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateRejectedNotice {
    #[serde(rename = "noteId")]
    pub note_id: Option<NoteId>,
    pub reason: String,
}

/// Body of an `error` frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorNotice {
    pub message: String,
}

/// Frame sent to a client
#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent<'a> {
    /// Identity accepted; carries the principal id
    Authenticated(UserId),
    /// Identity rejected; carries the reason
    AuthError(String),
    /// Room joined; carries the note id
    JoinedNote(NoteId),
    /// A note changed; carries the payload exactly as it was received
    NoteUpdated(&'a RawValue),
    /// The sender's own edit was refused
    UpdateRejected(UpdateRejectedNotice),
    /// A frame could not be understood
    Error(ErrorNotice),
}

impl ServerEvent<'_> {
    /// Serialize into a text frame
    pub fn to_frame(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }
}
