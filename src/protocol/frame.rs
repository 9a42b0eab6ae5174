//! Wire frames for the chat protocol
//!
//! Inbound, one frame is a JSON positional triple:
//! ```text
//! ["name", ["Alice"], {}]
//! ```
//! Outbound, one frame is a JSON object naming the client-side operation:
//! ```text
//! {"name": "message", "args": ["Alice", "hello"], "kwargs": {}}
//! ```
//! Frame boundaries are provided by the websocket layer; nothing here splits
//! or merges frames.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// A decoded inbound frame: one command invocation.
///
/// Arguments stay untyped at this boundary; each command validates its own
/// shape when invoked.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Command to invoke
    pub command: String,
    /// Positional arguments
    pub args: Vec<Value>,
    /// Keyword arguments
    pub kwargs: Map<String, Value>,
}

impl Invocation {
    pub fn new(command: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            command: command.into(),
            args,
            kwargs: Map::new(),
        }
    }

    /// Decode an inbound text frame.
    ///
    /// Anything other than a well-formed `[command, args, kwargs]` triple is
    /// an error, and errors here are terminal for the connection.
    pub fn decode(text: &str) -> Result<Self> {
        let (command, args, kwargs): (String, Vec<Value>, Map<String, Value>) =
            serde_json::from_str(text)?;
        Ok(Self {
            command,
            args,
            kwargs,
        })
    }
}

/// An outbound frame: a client-side operation with its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// Client-side operation to invoke
    pub name: String,
    /// Positional arguments
    pub args: Vec<Value>,
    /// Keyword arguments
    pub kwargs: Map<String, Value>,
}

impl Reply {
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
            kwargs: Map::new(),
        }
    }

    /// A chat message frame: `("message", [sender, text])`.
    pub fn message(sender: &str, text: &str) -> Self {
        Self::new("message", vec![Value::from(sender), Value::from(text)])
    }

    /// Encode this frame for one websocket text message.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_invocation() {
        let frame = Invocation::decode(r#"["name", ["Alice"], {}]"#).unwrap();
        assert_eq!(frame.command, "name");
        assert_eq!(frame.args, vec![json!("Alice")]);
        assert!(frame.kwargs.is_empty());
    }

    #[test]
    fn test_decode_invocation_with_kwargs() {
        let frame = Invocation::decode(r#"["message", ["hi"], {"urgent": true}]"#).unwrap();
        assert_eq!(frame.command, "message");
        assert_eq!(frame.kwargs.get("urgent"), Some(&json!(true)));
    }

    #[test]
    fn test_decode_rejects_malformed_frames() {
        assert!(Invocation::decode("not json").is_err());
        assert!(Invocation::decode(r#"{"command": "name"}"#).is_err());
        assert!(Invocation::decode(r#"["name", ["Alice"]]"#).is_err());
        assert!(Invocation::decode(r#"["name", "Alice", {}]"#).is_err());
        assert!(Invocation::decode(r#"[42, [], {}]"#).is_err());
    }

    #[test]
    fn test_message_frame_shape() {
        let reply = Reply::message("Alice", "hello");
        let encoded: Value = serde_json::from_str(&reply.encode().unwrap()).unwrap();

        assert_eq!(
            encoded,
            json!({"name": "message", "args": ["Alice", "hello"], "kwargs": {}})
        );
    }

    #[test]
    fn test_reply_roundtrip() {
        let reply = Reply::message("System", "Welcome to the chatroom.");
        let decoded: Reply = serde_json::from_str(&reply.encode().unwrap()).unwrap();
        assert_eq!(reply, decoded);
    }
}
