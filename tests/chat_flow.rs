mod common;

use std::sync::Arc;
use std::time::Duration;

use carelink_lib::commands::{ChatView, CHAT_GREETING};
use carelink_lib::models::{FileAttachment, Role, Submission, SubmissionStatus};
use carelink_lib::services::chat_gateway::ChatGateway;
use carelink_lib::services::conversation::{
    Conversation, EMPTY_REPLY_FALLBACK, TRANSPORT_FAILURE_FALLBACK,
};
use carelink_lib::services::notifier::EventBus;
use carelink_lib::Error;
use common::{closed_endpoint, MockServer, SLOW_DELAY};

#[tokio::test]
async fn cholesterol_question_yields_two_messages() {
    let server = MockServer::spawn().await;
    let chat = ChatView::mount(&EventBus::new(), server.gateway("/cholesterol"));
    assert_eq!(chat.placeholder(), Some(CHAT_GREETING));

    chat.submit(Submission::text("What is my cholesterol level?").simplified(false))
        .await
        .expect("submit");

    let messages = chat.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].content, "What is my cholesterol level?");
    assert!(messages[0].attachment.is_none());
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, "Your cholesterol is normal.");
    assert!(messages[0].id < messages[1].id);
    assert_eq!(chat.placeholder(), None);
}

#[tokio::test]
async fn assistant_content_is_the_reply_verbatim() {
    let server = MockServer::spawn().await;
    let chat = ChatView::mount(&EventBus::new(), server.gateway("/x"));

    for message in ["hello", "another one", ""] {
        let reply = chat.submit(Submission::text(message)).await.expect("submit");
        assert_eq!(reply.content, "X");
    }
    assert_eq!(chat.messages().len(), 6);
    assert_eq!(server.state.hits(), 3);
}

#[tokio::test]
async fn multipart_fields_follow_the_contract() {
    let server = MockServer::spawn().await;
    let chat = ChatView::mount(&EventBus::new(), server.gateway("/echo"));

    chat.submit(Submission::text("plain")).await.expect("plain");
    let file = FileAttachment::new("labs.pdf", "application/pdf", b"%PDF-1.7".to_vec());
    chat.submit(Submission::text("with file").with_file(file).simplified(true))
        .await
        .expect("with file");

    let requests = server.state.requests();
    assert_eq!(requests.len(), 2);

    let plain = &requests[0];
    assert_eq!(plain.text("message").as_deref(), Some("plain"));
    assert!(plain.field("file").is_none());
    assert!(plain.field("isEli5").is_none());

    let with_file = &requests[1];
    assert_eq!(with_file.text("isEli5").as_deref(), Some("true"));
    let file_field = with_file.field("file").expect("file field");
    assert_eq!(file_field.file_name.as_deref(), Some("labs.pdf"));
    assert_eq!(file_field.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(file_field.data, b"%PDF-1.7");

    let messages = chat.messages();
    assert_eq!(messages[1].content, "Echo: plain");
    let attachment = messages[2].attachment.as_ref().expect("attachment");
    assert_eq!(attachment.name, "labs.pdf");
    assert_eq!(attachment.media_type, "application/pdf");
    assert!(messages[3].attachment.is_none());
}

#[tokio::test]
async fn error_status_renders_transport_fallback() {
    let server = MockServer::spawn().await;
    let chat = ChatView::mount(&EventBus::new(), server.gateway("/fail"));

    let reply = chat.submit(Submission::text("hi")).await.expect("submit");
    assert_eq!(reply.content, TRANSPORT_FAILURE_FALLBACK);
    assert!(!chat.is_loading());
    assert_eq!(chat.status(), SubmissionStatus::Failed);
    assert_eq!(chat.messages().len(), 2);
}

#[tokio::test]
async fn malformed_json_renders_transport_fallback() {
    let server = MockServer::spawn().await;
    let chat = ChatView::mount(&EventBus::new(), server.gateway("/garbage"));

    let reply = chat.submit(Submission::text("hi")).await.expect("submit");
    assert_eq!(reply.content, TRANSPORT_FAILURE_FALLBACK);
    assert_eq!(chat.status(), SubmissionStatus::Failed);
}

#[tokio::test]
async fn unreachable_backend_renders_transport_fallback() {
    let gateway = ChatGateway::new(&closed_endpoint().await, Some(Duration::from_secs(2)))
        .expect("gateway");
    let chat = ChatView::mount(&EventBus::new(), gateway);

    let reply = chat.submit(Submission::text("hi")).await.expect("submit");
    assert_eq!(reply.content, TRANSPORT_FAILURE_FALLBACK);
    assert!(!chat.is_loading());
}

#[tokio::test]
async fn empty_body_renders_empty_reply_fallback() {
    let server = MockServer::spawn().await;
    let chat = ChatView::mount(&EventBus::new(), server.gateway("/empty"));

    let reply = chat.submit(Submission::text("hi")).await.expect("submit");
    assert_eq!(reply.content, EMPTY_REPLY_FALLBACK);
    assert_ne!(reply.content, TRANSPORT_FAILURE_FALLBACK);
    assert_eq!(chat.status(), SubmissionStatus::Succeeded);
}

#[tokio::test]
async fn legacy_response_field_is_rendered() {
    let server = MockServer::spawn().await;
    let chat = ChatView::mount(&EventBus::new(), server.gateway("/legacy"));

    let reply = chat.submit(Submission::text("hi")).await.expect("submit");
    assert_eq!(reply.content, "from the legacy field");
}

#[tokio::test]
async fn second_submission_while_in_flight_is_rejected() {
    let server = MockServer::spawn().await;
    let chat = ChatView::mount(&EventBus::new(), server.gateway("/slow"));

    let (first, second) = tokio::join!(
        chat.submit(Submission::text("first")),
        chat.submit(Submission::text("second")),
    );

    assert_eq!(first.expect("first").content, "slow answer");
    assert!(matches!(second, Err(Error::Busy)));
    assert_eq!(server.state.hits(), 1);

    let messages = chat.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "first");
    assert!(!chat.is_loading());
}

#[tokio::test]
async fn cancelling_aborts_the_outstanding_call() {
    let server = MockServer::spawn().await;
    let gateway = server.gateway("/slow");
    let conversation = Arc::new(Conversation::new());

    let task = {
        let conversation = conversation.clone();
        tokio::spawn(async move {
            conversation
                .submit(&gateway, Submission::text("leaving soon"))
                .await
        })
    };

    tokio::time::sleep(SLOW_DELAY / 3).await;
    assert!(conversation.is_loading());
    conversation.cancel();

    let result = task.await.expect("join");
    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(!conversation.is_loading());
    assert_eq!(conversation.len(), 1);
}

#[tokio::test]
async fn abandoned_submission_frees_the_slot() {
    let server = MockServer::spawn().await;
    let chat = ChatView::mount(&EventBus::new(), server.gateway("/slow"));

    let abandoned = tokio::time::timeout(SLOW_DELAY / 6, chat.submit(Submission::text("a"))).await;
    assert!(abandoned.is_err());
    assert!(!chat.is_loading());
    assert_eq!(chat.status(), SubmissionStatus::Idle);

    let reply = chat.submit(Submission::text("b")).await.expect("next submit");
    assert_eq!(reply.content, "slow answer");

    let contents: Vec<String> = chat.messages().into_iter().map(|m| m.content).collect();
    assert_eq!(contents, vec!["a", "b", "slow answer"]);
    assert!(!chat.is_loading());
}
