use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueRequest {
    pub participant_id: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

/// Inbound WebSocket client message
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    Register { participant_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_register_message() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"register","participantId":"p1"}"#).unwrap();
        let ClientMessage::Register { participant_id } = msg;
        assert_eq!(participant_id, "p1");
    }

    #[test]
    fn test_enqueue_request_optional_fields() {
        let req: EnqueueRequest = serde_json::from_str(r#"{"participantId":"p1"}"#).unwrap();
        assert_eq!(req.participant_id, "p1");
        assert!(req.category.is_none());
        assert!(req.region.is_none());
    }
}
