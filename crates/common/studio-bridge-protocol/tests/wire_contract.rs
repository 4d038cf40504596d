use serde_json::json;
use studio_bridge_protocol::{
    DecodeError, GuestMessage, HostMessage, InboundFrame, OutboundFrame,
};

#[test]
fn host_messages_from_the_wire() {
    let frames = [
        json!({"type": "init"}),
        json!({"type": "screenshot"}),
        json!({"type": "functionCall", "name": "play", "args": {"row": 1, "column": 1}}),
        json!({"type": "modelResponse", "requestId": "0", "text": "hi"}),
    ];

    let decoded: Vec<HostMessage> = frames
        .into_iter()
        .map(|frame| HostMessage::from_value(frame).expect("known kind"))
        .collect();

    assert_eq!(
        decoded,
        vec![
            HostMessage::Init,
            HostMessage::Screenshot,
            HostMessage::FunctionCall {
                name: "play".into(),
                args: json!({"row": 1, "column": 1}),
            },
            HostMessage::ModelResponse {
                request_id: "0".into(),
                text: "hi".into(),
            },
        ]
    );
}

#[test]
fn outbound_frame_carries_target_origin() {
    let frame = OutboundFrame {
        target_origin: "https://host.example".into(),
        data: GuestMessage::Chat {
            text: "Welcome!".into(),
        },
    };

    assert_eq!(
        serde_json::to_value(&frame).unwrap(),
        json!({
            "targetOrigin": "https://host.example",
            "data": {"type": "chat", "text": "Welcome!"},
        })
    );
}

#[test]
fn inbound_frame_keeps_unknown_payloads_raw() {
    let frame: InboundFrame = serde_json::from_value(json!({
        "origin": "https://host.example",
        "data": {"type": "theme", "dark": true},
    }))
    .unwrap();

    assert_eq!(frame.origin, "https://host.example");
    assert!(matches!(
        HostMessage::from_value(frame.data),
        Err(DecodeError::UnknownKind(kind)) if kind == "theme"
    ));
}
