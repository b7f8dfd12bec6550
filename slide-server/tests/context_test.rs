use std::sync::Arc;
use std::time::Duration;

use slide_api::GatewayError;
use slide_server::context::{IntegrationContext, IntegrationOptions};
use slide_server::errors::{EntityError, SetupError};
use slide_server::models::{CoverCommand, CoverStatus};

use crate::common::mock_gateway::{Command, MockGateway, options, setup, unique_id};

mod common;

#[tokio::test]
async fn test_setup_registers_cover_and_switch_per_slide() {
    let gateway = Arc::new(MockGateway::with_positions(&[0.0, 1.0, 0.5]));
    let context = setup(&gateway).await;

    assert_eq!(context.covers().count(), 3);
    assert_eq!(context.switches().count(), 3);

    let cover = context.cover(&unique_id(2)).unwrap();
    assert_eq!(cover.name(), "Slide 2");
    assert_eq!(cover.view().await.status, CoverStatus::Closed);

    let switch = context
        .switch(&format!("{}_touch_and_go", unique_id(2)))
        .unwrap();
    assert!(switch.is_on().await);
    assert_eq!(gateway.login_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rejected_credentials_register_nothing() {
    let gateway = Arc::new(MockGateway::with_positions(&[0.0]));
    gateway.fail_login(GatewayError::AuthenticationFailed("invalid password".to_string()));

    let result = IntegrationContext::setup(gateway.clone(), options()).await;

    assert!(matches!(result, Err(SetupError::AuthenticationFailed(_))));
    assert_eq!(gateway.overview_calls(), 0);
}

#[tokio::test]
async fn test_unreachable_cloud_is_not_ready() {
    let gateway = Arc::new(MockGateway::with_positions(&[0.0]));
    gateway.fail_overview(Some(GatewayError::Unavailable("connection refused".to_string())));

    let result = IntegrationContext::setup(gateway.clone(), options()).await;

    match result {
        Err(e) => assert!(e.is_retryable()),
        Ok(_) => panic!("setup succeeded without a first refresh"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_polling_updates_entities() {
    let gateway = Arc::new(MockGateway::with_positions(&[0.0]));
    let context = setup(&gateway).await;
    context.start().await;

    gateway.set_position(1, Some(0.95));
    tokio::time::sleep(Duration::from_secs(61)).await;

    assert_eq!(gateway.overview_calls(), 2);
    let view = context.cover(&unique_id(1)).unwrap().view().await;
    assert_eq!(view.status, CoverStatus::Closed);
    assert_eq!(view.position, Some(100));

    context.unload().await;
}

#[tokio::test(start_paused = true)]
async fn test_start_twice_runs_one_poll_loop() {
    let gateway = Arc::new(MockGateway::with_positions(&[0.0]));
    let context = setup(&gateway).await;
    context.start().await;
    context.start().await;

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(gateway.overview_calls(), 2);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(gateway.overview_calls(), 3);

    context.unload().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_poll_marks_entities_unavailable() {
    let gateway = Arc::new(MockGateway::with_positions(&[0.3]));
    let context = setup(&gateway).await;
    context.start().await;

    gateway.fail_overview(Some(GatewayError::Unavailable("cloud down".to_string())));
    tokio::time::sleep(Duration::from_secs(61)).await;

    let view = context.cover(&unique_id(1)).unwrap().view().await;
    assert_eq!(view.status, CoverStatus::Unavailable);
    assert!(!view.available);
    assert_eq!(view.position, Some(30));

    gateway.fail_overview(None);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(context.cover(&unique_id(1)).unwrap().view().await.available);

    context.unload().await;
}

#[tokio::test(start_paused = true)]
async fn test_scan_loop_queries_each_slide() {
    let gateway = Arc::new(MockGateway::with_positions(&[0.0, 1.0]));
    let context = Arc::new(
        IntegrationContext::setup(
            gateway.clone(),
            IntegrationOptions {
                scan_interval: Some(Duration::from_secs(20)),
                ..Default::default()
            },
        )
        .await
        .unwrap(),
    );
    context.start().await;

    gateway.set_position(1, Some(0.5));
    tokio::time::sleep(Duration::from_secs(21)).await;

    assert_eq!(gateway.info_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert_eq!(gateway.overview_calls(), 1);
    assert_eq!(
        context.cover(&unique_id(1)).unwrap().view().await.position,
        Some(50)
    );

    context.unload().await;
}

#[tokio::test(start_paused = true)]
async fn test_open_command_runs_in_background() {
    let gateway = Arc::new(MockGateway::with_positions(&[1.0]));
    let context = setup(&gateway).await;

    let accepted = context
        .run_command(&unique_id(1), CoverCommand::Open)
        .await
        .unwrap();
    assert_eq!(accepted.command, CoverCommand::Open);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(gateway.commands(), vec![Command::SetPosition(1, 0.0)]);
    assert_eq!(
        context.cover(&unique_id(1)).unwrap().view().await.status,
        CoverStatus::Opening
    );

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(
        gateway.commands(),
        vec![Command::SetPosition(1, 0.0), Command::SetPosition(1, 0.0)]
    );
    let instants = gateway.command_instants();
    assert_eq!(instants[1] - instants[0], Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_open_skips_correction() {
    let gateway = Arc::new(MockGateway::with_positions(&[1.0]));
    let context = setup(&gateway).await;

    context.run_command(&unique_id(1), CoverCommand::Open).await.unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;
    context.run_command(&unique_id(1), CoverCommand::Stop).await.unwrap();
    tokio::time::sleep(Duration::from_secs(20)).await;

    assert_eq!(
        gateway.commands(),
        vec![Command::SetPosition(1, 0.0), Command::Stop(1)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_unload_drops_pending_correction() {
    let gateway = Arc::new(MockGateway::with_positions(&[0.0]));
    let context = setup(&gateway).await;
    context.start().await;

    context.run_command(&unique_id(1), CoverCommand::Close).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    context.unload().await;

    assert_eq!(gateway.commands(), vec![Command::SetPosition(1, 1.0)]);
    assert!(matches!(
        context.run_command(&unique_id(1), CoverCommand::Open).await,
        Err(EntityError::Unloaded)
    ));
}

#[tokio::test]
async fn test_unknown_cover_command() {
    let gateway = Arc::new(MockGateway::with_positions(&[0.0]));
    let context = setup(&gateway).await;

    assert!(matches!(
        context.run_command("missing", CoverCommand::Stop).await,
        Err(EntityError::CoverNotFound)
    ));
    assert!(matches!(
        context
            .run_command(&unique_id(1), CoverCommand::SetPosition { position: 101 })
            .await,
        Err(EntityError::InvalidPosition(101))
    ));
    assert!(gateway.commands().is_empty());
}

#[tokio::test]
async fn test_set_position_converges_after_poll() {
    let gateway = Arc::new(MockGateway::with_positions(&[0.0, 1.0]));
    let context = setup(&gateway).await;

    let first = context.cover(&unique_id(1)).unwrap();
    first.set_cover_position(40).await.unwrap();
    assert_eq!(first.view().await.status, CoverStatus::Closing);

    let second = context.cover(&unique_id(2)).unwrap();
    second.set_cover_position(90).await.unwrap();
    assert_eq!(second.view().await.status, CoverStatus::Opening);

    gateway.set_position(1, Some(0.4));
    gateway.set_position(2, Some(0.9));
    context.refresh().await.unwrap();

    let first = first.view().await;
    assert!(!first.is_opening && !first.is_closing);
    assert_eq!(first.status, CoverStatus::Open);
    assert_eq!(first.position, Some(40));

    let second = second.view().await;
    assert!(!second.is_opening && !second.is_closing);
    assert_eq!(second.status, CoverStatus::Closed);
    assert_eq!(second.position, Some(100));
    assert_eq!(second.is_closed, Some(true));
}
