//! Test room management.
//!
//! Spawns and manages roomd instances for integration testing.

use std::process::{Child, Command};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;

/// Key byte of the room's own identity in every test room.
pub const ROOM_KEY: u8 = 0;

/// A test room instance.
pub struct TestServer {
    child: Child,
    port: u16,
    /// Removed when the server is dropped.
    _data_dir: TempDir,
}

impl TestServer {
    /// Spawn a room listening on `port` with the given privacy mode.
    pub async fn spawn(port: u16, privacy_mode: &str) -> anyhow::Result<Self> {
        let data_dir = tempfile::tempdir()?;

        let config_path = data_dir.path().join("config.toml");
        let config_content = format!(
            r#"
[server]
name = "test-room"
identity = "{}"
metrics_port = 0

[listen]
address = "127.0.0.1:{}"
preamble_timeout = 1

[database]
path = "{}/test.db"

[room]
privacy_mode = "{}"
"#,
            super::identity(ROOM_KEY),
            port,
            data_dir.path().display(),
            privacy_mode
        );

        std::fs::write(&config_path, config_content)?;

        let child = Command::new(env!("CARGO_BIN_EXE_roomd"))
            .arg(&config_path)
            .spawn()?;

        let server = Self {
            child,
            port,
            _data_dir: data_dir,
        };

        server.wait_until_ready().await?;

        Ok(server)
    }

    /// Wait until the room is accepting connections.
    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..50 {
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port))
                .await
                .is_ok()
            {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("Room failed to start within 5 seconds")
    }

    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    /// Connect and complete the preamble as `identity`.
    pub async fn connect(&self, identity: &str) -> anyhow::Result<super::client::TestClient> {
        let mut client = super::client::TestClient::connect(&self.address()).await?;
        client.send_raw(&format!("PEER {identity}")).await?;
        Ok(client)
    }

    /// Connect as the room's own identity and consume the greeting.
    pub async fn connect_as_room(&self) -> anyhow::Result<super::client::TestClient> {
        let mut client = self.connect(&super::identity(ROOM_KEY)).await?;
        let greeting = client.recv().await?;
        anyhow::ensure!(
            greeting["result"]["handler"] == "master",
            "unexpected greeting: {greeting}"
        );
        Ok(client)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
