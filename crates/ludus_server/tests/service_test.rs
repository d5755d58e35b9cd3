//! Tests for request-level game operations.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ludus_rules::{Color, GameConfig, MoveSequence};
use ludus_server::{
    ClaimOutcome, Coordinator, ErrorKind, GameService, MemoryStore, ServerConfig, SessionEntry,
    SessionStore, StateView, StoreError,
};
use tokio::sync::watch;

const POLL: Duration = Duration::from_millis(10);

fn service_over(store: Arc<dyn SessionStore>) -> GameService {
    let coordinator = Coordinator::new(Arc::clone(&store), POLL, 3);
    GameService::new(store, coordinator, GameConfig::default(), 64)
}

fn service() -> (Arc<dyn SessionStore>, GameService) {
    let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
    (Arc::clone(&store), service_over(store))
}

/// Creates a small game and seats two players; returns (game id, white, black).
async fn seated_game(service: &GameService) -> (String, StateView, StateView) {
    let id = service
        .create_game(Some("5,5,3,2"))
        .await
        .expect("Create failed");
    let white = service.join_game(&id, "Marcus").await.expect("Join failed");
    let black = service.join_game(&id, "Livia").await.expect("Join failed");
    (id, white, black)
}

#[tokio::test]
async fn test_join_assigns_white_then_black() {
    let (_, service) = service();
    let (id, white, black) = seated_game(&service).await;

    assert_eq!(white.game_id(), &id);
    assert_eq!(*white.player_color(), Color::White);
    assert_eq!(white.player_name(), "Marcus");
    assert!(white.opponent_name().is_empty());

    assert_eq!(*black.player_color(), Color::Black);
    assert_eq!(black.player_name(), "Livia");
    assert_eq!(black.opponent_name(), "Marcus");
    assert_eq!(*black.turn(), Color::Black);
    assert_eq!(*black.winner(), None);
    assert_eq!(black.board().rank_count(), 5);

    let err = service.join_game(&id, "Gaius").await.unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::GameFull {
            white_name: "Marcus".to_string(),
            black_name: "Livia".to_string()
        }
    );
}

#[tokio::test]
async fn test_end_to_end_small_game() {
    let (_, service) = service();
    let (id, white, black) = seated_game(&service).await;

    let after = service
        .submit_move(&id, black.player_id(), "0,0,1,0")
        .await
        .expect("Black opening");
    assert_eq!(*after.turn(), Color::White);

    let after = service
        .submit_move(&id, white.player_id(), "4,4,3,4")
        .await
        .expect("White reply");
    assert_eq!(*after.turn(), Color::Black);

    let after = service
        .submit_move(&id, black.player_id(), "1,0,1,1")
        .await
        .expect("Black second move");
    assert_eq!(*after.turn(), Color::White);
    assert_eq!(*after.winner(), None);

    let white_view = service
        .fetch_state(&id, white.player_id())
        .await
        .expect("Fetch failed");
    assert_eq!(white_view.board(), after.board());
    assert_eq!(*white_view.player_color(), Color::White);
}

#[tokio::test]
async fn test_move_out_of_turn_rejected() {
    let (_, service) = service();
    let (id, white, _) = seated_game(&service).await;
    let err = service
        .submit_move(&id, white.player_id(), "4,0,3,0")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::IllegalMove);
    assert_eq!(err.message, "Cannot make move on black's turn.");
}

#[tokio::test]
async fn test_bad_moves_rejected_without_commit() {
    let (store, service) = service();
    let (id, _, black) = seated_game(&service).await;

    let err = service
        .submit_move(&id, black.player_id(), "0,0")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Malformed);

    let err = service
        .submit_move(&id, black.player_id(), "0,0,1,1")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::IllegalMove);

    assert!(store.get_game(&id).await.unwrap().move_seq().is_empty());
}

#[tokio::test]
async fn test_foreign_seat_is_unauthorized() {
    let (_, service) = service();
    let (id, _, _) = seated_game(&service).await;

    let err = service.fetch_state(&id, "intruder").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);

    let err = service
        .submit_move(&id, "intruder", "0,0,1,0")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);

    let (_tx, rx) = watch::channel(false);
    let err = service.wait_for_turn(&id, "intruder", rx).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);
}

#[tokio::test]
async fn test_unknown_game() {
    let (_, service) = service();
    let err = service.fetch_state("missing", "anyone").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::GameDoesntExist);
    assert_eq!(
        err.message,
        "No game exists with the given ID. Maybe you aren't using the full link?"
    );
}

#[tokio::test]
async fn test_create_game_validation() {
    let (store, service) = service();

    let id = service.create_game(None).await.unwrap();
    assert_eq!(store.get_game(&id).await.unwrap().config(), "8,12,6,5");

    let err = service.create_game(Some("5,5")).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Malformed);

    let err = service.create_game(Some("3,5,1,1")).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidConfig);

    let err = service.create_game(Some("65,8,1,1")).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidConfig);
}

#[tokio::test]
async fn test_from_config_uses_settings() {
    let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
    let config =
        ServerConfig::from_toml("default_game_config = \"6,6,2,3\"\nmax_board_dimension = 10")
            .unwrap();
    let service = GameService::from_config(Arc::clone(&store), &config).unwrap();

    let id = service.create_game(None).await.unwrap();
    assert_eq!(store.get_game(&id).await.unwrap().config(), "6,6,2,3");
    let err = service.create_game(Some("11,8,1,1")).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidConfig);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_wait_for_turn_releases_after_opponent_moves() {
    let (_, service) = service();
    let (id, white, black) = seated_game(&service).await;

    let (_tx, rx) = watch::channel(false);
    let waiter = {
        let service = service.clone();
        let (id, seat) = (id.clone(), white.player_id().clone());
        tokio::spawn(async move { service.wait_for_turn(&id, &seat, rx).await })
    };

    tokio::time::sleep(POLL * 5).await;
    assert!(!waiter.is_finished());

    service
        .submit_move(&id, black.player_id(), "0,0,1,0")
        .await
        .unwrap();

    let view = tokio::time::timeout(Duration::from_secs(2), waiter)
        .await
        .expect("Wait should resolve")
        .unwrap()
        .unwrap()
        .expect("Not cancelled");
    assert_eq!(*view.turn(), Color::White);
    assert_eq!(*view.player_color(), Color::White);
}

#[tokio::test]
async fn test_wait_for_turn_cancelled() {
    let (_, service) = service();
    let (id, white, _) = seated_game(&service).await;
    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();
    let result = service.wait_for_turn(&id, white.player_id(), rx).await;
    assert!(matches!(result, Ok(None)));
}

/// Store whose records fail to replay, standing in for corrupted storage.
#[derive(Debug, Default)]
struct CorruptStore {
    inner: MemoryStore,
}

#[async_trait]
impl SessionStore for CorruptStore {
    async fn add_game(&self, config: &GameConfig) -> Result<SessionEntry, StoreError> {
        self.inner.add_game(config).await
    }

    async fn get_game(&self, id: &str) -> Result<SessionEntry, StoreError> {
        let entry = self.inner.get_game(id).await?;
        Ok(SessionEntry::new(
            entry.id().clone(),
            entry.white_id().clone(),
            entry.black_id().clone(),
            entry.white_name().clone(),
            entry.black_name().clone(),
            entry.config().clone(),
            "9,9,9,9".to_string(),
            *entry.created_at(),
        ))
    }

    async fn set_move_seq(
        &self,
        id: &str,
        moves: &MoveSequence,
    ) -> Result<SessionEntry, StoreError> {
        self.inner.set_move_seq(id, moves).await
    }

    async fn claim_seat(
        &self,
        id: &str,
        color: Color,
        name: &str,
    ) -> Result<ClaimOutcome, StoreError> {
        self.inner.claim_seat(id, color, name).await
    }
}

#[tokio::test]
async fn test_unreplayable_record_is_internal() {
    let store: Arc<dyn SessionStore> = Arc::new(CorruptStore::default());
    let service = service_over(Arc::clone(&store));
    let id = service.create_game(Some("5,5,3,2")).await.unwrap();
    let entry = store.get_game(&id).await.unwrap();

    let err = service.fetch_state(&id, entry.white_id()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Internal);
    assert_eq!(err.public_message(), "InternalServerError");
}
