/// Console line protocol end to end against a temp data directory
mod common;

use arena_economy::catalog::loader::WEAPONS_FILE;
use arena_economy::server::GameServer;
use common::{test_config, ADMIN, ALICE};

#[tokio::test]
async fn test_new_server_creates_catalog_documents() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let _server = GameServer::new(config.clone()).await.unwrap();
    assert!(config.storage.catalog_dir().join(WEAPONS_FILE).exists());
    assert!(config.storage.profiles_dir().is_dir());
}

#[tokio::test]
async fn test_console_session_flow() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.rate_limit.max_actions = 100;
    let server = GameServer::new(config).await.unwrap();

    assert_eq!(server.handle_line(&format!("connect {}", ALICE)), format!("{} connected", ALICE));
    assert_eq!(
        server.handle_line(&format!("{} purchase-weapon python", ALICE)),
        "bought weapon python for 300 tokens, balance 200"
    );
    assert_eq!(
        server.handle_line(&format!("{} purchase-weapon python", ALICE)),
        "error: weapon 'python' is already owned"
    );
    assert_eq!(
        server.handle_line(&format!("{} cycle-weapon primary next", ALICE)),
        "primary weapon: lr300"
    );
    assert!(server
        .handle_line(&format!("{} wager 5", ALICE))
        .starts_with("error: bet 5 is outside 10-100"));
    assert!(server
        .handle_line(&format!("{} fly", ALICE))
        .starts_with("error: usage:"));

    server.handle_line(&format!("connect {}", ADMIN));
    assert_eq!(
        server.handle_line(&format!("kill {} {}", ADMIN, ALICE)),
        format!("{} killed {}", ADMIN, ALICE)
    );
    assert_eq!(server.handle_line(&format!("{} balance", ADMIN)), "balance 10010");

    assert_eq!(server.handle_line("save-all"), "saved 2, failed 0");
    assert!(server.handle_line("reload-catalog").starts_with("catalog reloaded: 10 weapons"));
    assert_eq!(server.handle_line(&format!("disconnect {}", ALICE)), format!("{} disconnected", ALICE));
    assert_eq!(
        server.handle_line(&format!("disconnect {}", ALICE)),
        format!("{} was not connected", ALICE)
    );
    assert!(server.handle_line("hello").starts_with("unknown input"));
    assert_eq!(server.handle_line("   "), "");

    server.shutdown();
    assert_eq!(server.processor().sessions().active_count(), 0);
    assert_eq!(server.processor().sessions().store().count_profiles(), 2);
}
