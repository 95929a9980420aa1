#![allow(dead_code)]

use pasvftpd::core_network::pasv::connect_pasv;
use pasvftpd::core_session::SessionRegistry;
use pasvftpd::{Config, Server, ServerConfig};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const STEP: Duration = Duration::from_secs(10);

pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(STEP, fut)
        .await
        .expect("step timed out")
}

pub struct TestServer {
    pub port: u16,
    pub registry: Arc<SessionRegistry>,
    pub root: tempfile::TempDir,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<anyhow::Result<()>>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(tweak: impl FnOnce(&mut ServerConfig)) -> Self {
        let root = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.server.listen_port = 0;
        config.server.root_dir = root.path().display().to_string();
        config.server.worker_threads = 4;
        tweak(&mut config.server);

        let server = Server::bind(&config).await.unwrap();
        let port = server.local_addr().unwrap().port();
        let registry = server.registry();
        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(server.run(async move {
            let _ = rx.await;
        }));

        Self {
            port,
            registry,
            root,
            shutdown: Some(tx),
            task: Some(task),
        }
    }

    pub fn path(&self, name: &str) -> std::path::PathBuf {
        self.root.path().join(name)
    }

    pub async fn connect(&self) -> Client {
        Client::connect(self.port).await
    }

    /// Polls until `check` holds or the step bound elapses.
    pub async fn eventually(&self, check: impl Fn(&SessionRegistry) -> bool) -> bool {
        for _ in 0..200 {
            if check(&self.registry) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        check(&self.registry)
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            within(task).await.unwrap().unwrap();
        }
    }
}

pub struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    pub greeting: String,
}

impl Client {
    pub async fn connect(port: u16) -> Self {
        let stream = within(TcpStream::connect(("127.0.0.1", port))).await.unwrap();
        let (reader, writer) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(reader),
            writer,
            greeting: String::new(),
        };
        client.greeting = client.reply().await.expect("greeting");
        client
    }

    /// Write errors surface as a missing reply instead.
    pub async fn send(&mut self, line: &str) {
        let _ = self
            .writer
            .write_all(format!("{}\r\n", line).as_bytes())
            .await;
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        let _ = self.writer.write_all(bytes).await;
    }

    /// Next reply line without the terminator, `None` at EOF.
    pub async fn reply(&mut self) -> Option<String> {
        let mut line = String::new();
        match within(self.reader.read_line(&mut line)).await {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    pub async fn command(&mut self, line: &str) -> String {
        self.send(line).await;
        self.reply().await.expect("reply")
    }

    /// PASV, then connect to the advertised address.
    pub async fn pasv(&mut self) -> TcpStream {
        let reply = self.command("PASV").await;
        assert!(reply.starts_with("227 "), "unexpected PASV reply: {}", reply);
        within(connect_pasv(&reply)).await.unwrap()
    }

    pub async fn login(&mut self) {
        assert!(self.command("USER tester").await.starts_with("331"));
        assert!(self.command("PASS secret").await.starts_with("230"));
    }

    pub async fn upload(&mut self, name: &str, content: &[u8]) -> String {
        let mut data = self.pasv().await;
        self.send(&format!("STOR {}", name)).await;
        let opening = self.reply().await.expect("STOR reply");
        assert!(opening.starts_with("150"), "unexpected STOR reply: {}", opening);
        data.write_all(content).await.unwrap();
        data.shutdown().await.unwrap();
        drop(data);
        self.reply().await.expect("STOR completion")
    }

    pub async fn download(&mut self, name: &str) -> (String, Vec<u8>) {
        let mut data = self.pasv().await;
        self.send(&format!("RETR {}", name)).await;
        let opening = self.reply().await.expect("RETR reply");
        if !opening.starts_with("150") {
            return (opening, Vec::new());
        }
        let mut content = Vec::new();
        within(data.read_to_end(&mut content)).await.unwrap();
        (self.reply().await.expect("RETR completion"), content)
    }

    pub async fn list(&mut self) -> (String, Vec<String>) {
        let mut data = self.pasv().await;
        self.send("LIST").await;
        let opening = self.reply().await.expect("LIST reply");
        assert!(opening.starts_with("150"), "unexpected LIST reply: {}", opening);
        let mut listing = String::new();
        within(data.read_to_string(&mut listing)).await.unwrap();
        let names = listing
            .split("\r\n")
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        (self.reply().await.expect("LIST completion"), names)
    }
}

pub fn write_file(root: &Path, name: &str, content: &[u8]) {
    std::fs::write(root.join(name), content).unwrap();
}
