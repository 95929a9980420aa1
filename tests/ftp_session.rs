mod common;

use common::{within, TestServer};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_greeting_and_stub_login() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    assert_eq!(client.greeting, "220 Welcome to pasvftpd");
    assert_eq!(client.command("USER anonymous").await, "331 Please specify the password");
    assert_eq!(client.command("PASS whatever").await, "230 Login successful");
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unknown_command_keeps_connection_open() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    assert_eq!(client.command("MKD newdir").await, "500 Unknown command");
    assert_eq!(client.command("xyzzy").await, "500 Unknown command");
    assert!(client.command("USER bob").await.starts_with("331"));
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_missing_argument_is_a_reply_not_a_crash() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    assert!(client.command("STOR").await.starts_with("501"));
    assert!(client.command("RETR").await.starts_with("501"));
    assert!(client.command("USER x").await.starts_with("331"));
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_data_commands_require_pasv() {
    let server = TestServer::start().await;
    common::write_file(server.root.path(), "present.txt", b"data");
    let mut client = server.connect().await;
    assert_eq!(client.command("LIST").await, "425 Use PASV first");
    assert_eq!(client.command("RETR present.txt").await, "425 Use PASV first");
    assert_eq!(client.command("STOR new.txt").await, "425 Use PASV first");
    assert!(!server.path("new.txt").exists());
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_store_then_retrieve_hello() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    client.login().await;

    let stored = client.upload("foo.txt", b"hello").await;
    assert_eq!(stored, "226 Transfer complete (5 bytes)");
    assert_eq!(std::fs::read(server.path("foo.txt")).unwrap(), b"hello");

    let (done, content) = client.download("foo.txt").await;
    assert_eq!(done, "226 Transfer complete (5 bytes)");
    assert_eq!(content, b"hello");
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_round_trip_larger_than_buffers() {
    let server = TestServer::start_with(|config| {
        config.upload_buffer_size = Some(512);
        config.download_buffer_size = Some(700);
    })
    .await;
    let mut client = server.connect().await;
    let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();

    let stored = client.upload("big.bin", &content).await;
    assert_eq!(stored, format!("226 Transfer complete ({} bytes)", content.len()));
    let (done, fetched) = client.download("big.bin").await;
    assert_eq!(done, format!("226 Transfer complete ({} bytes)", content.len()));
    assert_eq!(fetched, content);
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_store_truncates_existing_file() {
    let server = TestServer::start().await;
    common::write_file(server.root.path(), "note.txt", b"a much longer original body");
    let mut client = server.connect().await;
    assert!(client.upload("note.txt", b"short").await.starts_with("226"));
    assert_eq!(std::fs::read(server.path("note.txt")).unwrap(), b"short");
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_retrieve_missing_file_sends_no_bytes() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    let mut data = client.pasv().await;
    assert_eq!(client.command("RETR missing.txt").await, "550 File not found");

    let mut received = Vec::new();
    let _ = within(data.read_to_end(&mut received)).await;
    assert!(received.is_empty());
    assert!(server.eventually(|r| r.listener_count() == 0).await);
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_non_utf8_command_is_rejected() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    client.send_raw(b"STOR caf\xe9.txt\r\n").await;
    assert_eq!(
        client.reply().await.expect("reply"),
        "501 Syntax error in parameters or arguments"
    );
    assert!(client.command("USER still-here").await.starts_with("331"));
    assert_eq!(std::fs::read_dir(server.root.path()).unwrap().count(), 0);
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_path_escape_is_rejected() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    client.pasv().await;
    assert_eq!(
        client.command("RETR ../../etc/passwd").await,
        "550 Path is outside of the allowed area"
    );
    assert_eq!(
        client.command("STOR ../escaped.txt").await,
        "550 Path is outside of the allowed area"
    );
    let parent = server.root.path().parent().unwrap();
    assert!(!parent.join("escaped.txt").exists());
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_list_names_entries() {
    let server = TestServer::start().await;
    common::write_file(server.root.path(), "a.txt", b"1");
    common::write_file(server.root.path(), "b.txt", b"22");
    std::fs::create_dir(server.path("docs")).unwrap();

    let mut client = server.connect().await;
    let (done, mut names) = client.list().await;
    names.sort();
    assert_eq!(names, vec!["a.txt", "b.txt", "docs"]);
    assert!(done.starts_with("226 Directory send OK"));
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_pasv_leaves_one_listener() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;

    let first = client.command("PASV").await;
    assert!(first.starts_with("227"));
    assert_eq!(server.registry.listener_count(), 1);
    let second = client.command("PASV").await;
    assert!(second.starts_with("227"));
    assert_eq!(server.registry.listener_count(), 1);

    // The surviving listener is the second one.
    let mut data = within(pasvftpd::core_network::pasv::connect_pasv(&second))
        .await
        .unwrap();
    client.send("LIST").await;
    assert!(client.reply().await.unwrap().starts_with("150"));
    let mut listing = Vec::new();
    within(data.read_to_end(&mut listing)).await.unwrap();
    assert!(client.reply().await.unwrap().starts_with("226"));
    assert_eq!(server.registry.listener_count(), 0);
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_data_connection_timeout() {
    let server = TestServer::start_with(|config| config.data_connect_timeout_ms = Some(200)).await;
    let mut client = server.connect().await;
    assert!(client.command("PASV").await.starts_with("227"));
    assert_eq!(client.command("LIST").await, "425 Data connection timeout");
    assert_eq!(server.registry.listener_count(), 0);
    assert!(client.command("USER still-here").await.starts_with("331"));
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_store_timeout_leaves_existing_file_alone() {
    let server = TestServer::start_with(|config| config.data_connect_timeout_ms = Some(200)).await;
    common::write_file(server.root.path(), "keep.txt", b"precious contents");
    let mut client = server.connect().await;
    assert!(client.command("PASV").await.starts_with("227"));
    assert_eq!(client.command("STOR keep.txt").await, "425 Data connection timeout");
    assert_eq!(std::fs::read(server.path("keep.txt")).unwrap(), b"precious contents");
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_quit_closes_connection_once() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    assert_eq!(client.command("QUIT").await, "221 Goodbye");
    client.send("QUIT").await;
    assert_eq!(client.reply().await, None);
    assert!(server.eventually(|r| r.session_count() == 0).await);
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pipelined_commands_answer_in_order() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    client.send("USER a\r\nPASS b\r\nNOOP\r\nQUIT").await;
    assert!(client.reply().await.unwrap().starts_with("331"));
    assert!(client.reply().await.unwrap().starts_with("230"));
    assert!(client.reply().await.unwrap().starts_with("500"));
    assert!(client.reply().await.unwrap().starts_with("221"));
    assert_eq!(client.reply().await, None);
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_disconnect_tears_down_session_and_listener() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    assert!(client.command("PASV").await.starts_with("227"));
    assert_eq!(server.registry.session_count(), 1);
    drop(client);

    assert!(server
        .eventually(|r| r.session_count() == 0 && r.listener_count() == 0)
        .await);
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_disconnect_cancels_worker_waiting_for_peer() {
    let server = TestServer::start_with(|config| config.data_connect_timeout_ms = Some(60_000)).await;
    let mut client = server.connect().await;
    assert!(client.command("PASV").await.starts_with("227"));
    client.send("LIST").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    drop(client);

    // Well inside the 60 s connect bound.
    assert!(server
        .eventually(|r| r.session_count() == 0 && r.listener_count() == 0)
        .await);
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_disconnect_cancels_upload_in_progress() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    let mut data = client.pasv().await;
    client.send("STOR up.bin").await;
    assert!(client.reply().await.expect("STOR reply").starts_with("150"));
    data.write_all(b"partial").await.unwrap();
    drop(client);

    // The data socket stays open; the upload must not pin the session.
    assert!(server
        .eventually(|r| r.session_count() == 0 && r.listener_count() == 0)
        .await);
    drop(data);
    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_closes_live_sessions() {
    let server = TestServer::start().await;
    let mut client = server.connect().await;
    client.login().await;
    let registry = server.registry.clone();
    server.stop().await;
    assert_eq!(registry.session_count(), 0);
    assert_eq!(client.reply().await, None);
}
