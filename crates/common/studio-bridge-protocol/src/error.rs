use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("message is missing a string `type` field")]
    MissingKind,

    #[error("unknown message kind `{0}`")]
    UnknownKind(String),

    #[error("malformed `{kind}` message")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}
