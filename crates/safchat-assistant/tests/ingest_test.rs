mod common;

use std::time::Duration;

use common::*;
use safchat_assistant::openai::BatchStatus;
use safchat_assistant::{AssistantConfig, AssistantError, CancellationToken, FileIngestor, PollPolicy};

fn ingestor(api: std::sync::Arc<ScriptedApi>) -> FileIngestor {
    FileIngestor::new(api, &AssistantConfig::new("sk-test"))
        .with_policy(PollPolicy::new(Duration::from_millis(1)).with_timeout(Duration::from_secs(5)))
}

#[tokio::test]
async fn test_upload_and_attach_waits_for_indexing() {
    let api = ScriptedApi::new().with(|s| {
        s.batch_statuses = [BatchStatus::InProgress, BatchStatus::InProgress, BatchStatus::Completed].into();
    });

    let file_id = ingestor(api.clone())
        .upload_and_attach(
            "vs_1",
            b"%PDF-1.7".to_vec(),
            "policy.pdf",
            "application/pdf",
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(file_id, "file-1");
    assert_eq!(api.count("get_file_batch"), 2);

    let state = api.state.lock().unwrap();
    assert_eq!(state.uploads[0].file_name, "policy.pdf");
    assert_eq!(state.uploads[0].purpose, "assistants");
    assert_eq!(
        state.batches_created,
        vec![("vs_1".to_string(), vec!["file-1".to_string()])]
    );
}

#[tokio::test]
async fn test_failed_or_cancelled_batch_is_an_error() {
    for status in [BatchStatus::Failed, BatchStatus::Cancelled] {
        let api = ScriptedApi::new().with(|s| {
            s.batch_statuses = [BatchStatus::InProgress, status].into();
        });

        let err = ingestor(api)
            .upload_and_attach("vs_1", b"x".to_vec(), "a.txt", "text/plain", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.orphaned_file_id(), Some("file-1"));
        match err.into_root_cause() {
            AssistantError::BatchFailed { status: reported, body, .. } => {
                assert_eq!(reported, status.to_string());
                assert!(body.contains("vsfb_1"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[tokio::test]
async fn test_indexing_times_out() {
    let api = ScriptedApi::new().with(|s| {
        s.batch_statuses = [BatchStatus::InProgress].into();
    });
    let ingestor = FileIngestor::new(api.clone(), &AssistantConfig::new("sk-test")).with_policy(
        PollPolicy::new(Duration::from_millis(5)).with_timeout(Duration::from_millis(30)),
    );

    let err = ingestor
        .attach("vs_1", &["file-9".to_string()], &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(err.to_string().contains("in_progress"));
    assert!(api.count("get_file_batch") >= 1);
}

#[tokio::test]
async fn test_upload_failure_skips_attachment() {
    let api = ScriptedApi::new().with(|s| s.fail_upload = true);

    let err = ingestor(api.clone())
        .upload_and_attach("vs_1", vec![0; 16], "big.bin", "", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AssistantError::Api { .. }));
    assert_eq!(api.count("create_file_batch"), 0);
}

#[tokio::test]
async fn test_blank_inputs_are_rejected() {
    let api = ScriptedApi::new();
    let ingestor = ingestor(api.clone());
    let cancel = CancellationToken::new();

    let err = ingestor
        .upload_and_attach(" ", b"x".to_vec(), "a.txt", "text/plain", &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, AssistantError::InvalidInput(_)));

    let err = ingestor
        .upload_and_attach("vs_1", b"x".to_vec(), "", "text/plain", &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, AssistantError::InvalidInput(_)));

    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_detach_and_delete_are_idempotent() {
    let api = ScriptedApi::new();
    let ingestor = ingestor(api.clone());
    let cancel = CancellationToken::new();

    ingestor.detach("vs_1", "file-1", &cancel).await.unwrap();
    ingestor.detach("vs_1", "file-1", &cancel).await.unwrap();
    ingestor.delete("file-1", &cancel).await.unwrap();
    ingestor.delete("file-1", &cancel).await.unwrap();

    let state = api.state.lock().unwrap();
    assert_eq!(state.deleted, vec!["vs_1/file-1".to_string(), "file-1".to_string()]);
}
