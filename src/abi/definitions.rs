//! Event ABIs of the interop predeploys.

/// Events of the L2-to-L2 cross-domain messenger.
pub const MESSENGER_EVENTS_JSON: &str = r#"[
    {
        "type": "event",
        "name": "SentMessage",
        "inputs": [
            {"name": "destination", "type": "uint256", "indexed": true},
            {"name": "target", "type": "address", "indexed": true},
            {"name": "messageNonce", "type": "uint256", "indexed": true},
            {"name": "sender", "type": "address", "indexed": false},
            {"name": "message", "type": "bytes", "indexed": false}
        ],
        "anonymous": false
    },
    {
        "type": "event",
        "name": "RelayedMessage",
        "inputs": [
            {"name": "source", "type": "uint256", "indexed": true},
            {"name": "messageNonce", "type": "uint256", "indexed": true},
            {"name": "messageHash", "type": "bytes32", "indexed": true}
        ],
        "anonymous": false
    },
    {
        "type": "event",
        "name": "FailedRelayedMessage",
        "inputs": [
            {"name": "source", "type": "uint256", "indexed": true},
            {"name": "messageNonce", "type": "uint256", "indexed": true},
            {"name": "messageHash", "type": "bytes32", "indexed": true}
        ],
        "anonymous": false
    }
]"#;

/// Events of the cross-L2 inbox.
pub const INBOX_EVENTS_JSON: &str = r#"[
    {
        "type": "event",
        "name": "ExecutingMessage",
        "inputs": [
            {"name": "msgHash", "type": "bytes32", "indexed": true},
            {
                "name": "id",
                "type": "tuple",
                "indexed": false,
                "components": [
                    {"name": "origin", "type": "address"},
                    {"name": "blockNumber", "type": "uint256"},
                    {"name": "logIndex", "type": "uint256"},
                    {"name": "timestamp", "type": "uint256"},
                    {"name": "chainId", "type": "uint256"}
                ]
            }
        ],
        "anonymous": false
    }
]"#;

/// Name of the messenger event that starts a cross-chain message.
pub const SENT_MESSAGE_EVENT: &str = "SentMessage";

/// Name of the inbox event that executes a cross-chain message.
pub const EXECUTING_MESSAGE_EVENT: &str = "ExecutingMessage";
