//! Driving a session through the async command queue

mod common;

use memeprobe::queue::SessionQueue;
use memeprobe::{contract, scenarios, Error, PageSession, Viewport};

async fn start() -> SessionQueue {
    SessionQueue::start(|| {
        let session: Box<dyn PageSession> = Box::new(common::session(common::inline_page()));
        Ok(session)
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn queued_actions_run_in_order() {
    let queue = start().await;
    queue.set_viewport(Viewport::default()).await.unwrap();
    queue.visit("/").await.unwrap();
    queue
        .type_text(contract::TEXT_INPUT, contract::TYPED_TEXT)
        .await
        .unwrap();
    assert_eq!(queue.value(contract::TEXT_INPUT).await.unwrap(), contract::TYPED_TEXT);
    assert!(queue.is_visible(contract::MEME_TEXT).await.unwrap());

    let nodes = queue.text_nodes().await.unwrap();
    assert!(nodes
        .iter()
        .any(|n| n.path == "p#meme-text" && n.text == contract::TYPED_TEXT));

    let frame = queue.bounding_rect(contract::IMAGE_CONTAINER).await.unwrap();
    assert_eq!(frame.width, 502.0);
    queue.close().await.unwrap();
}

#[tokio::test]
async fn upload_through_the_queue() {
    let queue = start().await;
    queue.visit("/").await.unwrap();
    let fixture = common::fixtures().load(contract::UPLOAD_FIXTURE).unwrap();
    queue
        .upload_file(contract::MEME_INSERT, fixture)
        .await
        .unwrap();
    let src = queue
        .attribute(contract::MEME_IMAGE, "src")
        .await
        .unwrap()
        .unwrap();
    assert!(src.starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn clones_share_one_session() {
    let queue = start().await;
    let other = queue.clone();
    queue.visit("/").await.unwrap();
    other.click("#water").await.unwrap();
    assert_eq!(
        queue
            .computed_style(contract::IMAGE_CONTAINER, "border")
            .await
            .unwrap(),
        "5px double rgb(0, 0, 255)"
    );
    queue.reload().await.unwrap();
    assert_eq!(
        other
            .computed_style(contract::IMAGE_CONTAINER, "border")
            .await
            .unwrap(),
        contract::DEFAULT_BORDER
    );
}

#[tokio::test]
async fn scenario_run_on_the_worker() {
    let queue = start().await;
    let report = queue
        .run_scenarios(scenarios::filtered(Some("thumbnails")), common::fixtures())
        .await
        .unwrap();
    assert_eq!(report.outcomes.len(), 1);
    assert!(report.all_passed());
}

#[tokio::test]
async fn failed_factory_is_reported() {
    let err = SessionQueue::start(|| Err(Error::InitializationError("no browser".into())))
        .await
        .err()
        .expect("start must fail");
    assert!(err.to_string().contains("no browser"));
}

#[tokio::test]
async fn requests_after_close_fail() {
    let queue = start().await;
    let other = queue.clone();
    queue.close().await.unwrap();
    assert!(other.visit("/").await.is_err());
}
