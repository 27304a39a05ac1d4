use crate::miners::api::RPCAPIClient;
use crate::miners::api::rpc::errors::RPCError;
use crate::miners::api::rpc::status::RPCCommandStatus;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::net::IpAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

pub const DEFAULT_RPC_PORT: u16 = 4028;
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(3);

/// Pause between writing the request and reading, giving the miner time to answer.
const RESPONSE_DELAY: Duration = Duration::from_millis(50);

/// One-shot JSON-over-TCP client for the cgminer API exposed by Avalon firmware.
///
/// Every command opens its own connection; nothing is kept between calls.
#[derive(Debug, Clone)]
pub struct CGMinerRPC {
    ip: IpAddr,
    port: u16,
    timeout: Duration,
}

impl CGMinerRPC {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            port: DEFAULT_RPC_PORT,
            timeout: DEFAULT_RPC_TIMEOUT,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn build_request(command: &str, parameter: Option<Value>) -> String {
        let cmd = match parameter {
            Some(params) => json!({
                "command": command,
                "parameter": params
            }),
            None => json!({
                "command": command
            }),
        };
        cmd.to_string()
    }

    async fn exchange(&self, request: &str) -> Result<Vec<u8>, RPCError> {
        let mut stream =
            tokio::time::timeout(self.timeout, TcpStream::connect((self.ip, self.port)))
                .await
                .map_err(|_| RPCError::ConnectTimeout)?
                .map_err(RPCError::ConnectionFailed)?;

        stream.write_all(request.as_bytes()).await?;
        tokio::time::sleep(RESPONSE_DELAY).await;

        let mut buffer = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            match tokio::time::timeout(self.timeout, stream.read(&mut chunk)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => buffer.extend_from_slice(&chunk[..n]),
                Ok(Err(e)) => return Err(RPCError::Io(e)),
                // the miner may keep the socket open after answering
                Err(_) => break,
            }
        }

        Ok(buffer)
    }

    pub(crate) fn parse_rpc_result(response: &[u8]) -> Result<Value, RPCError> {
        let response = String::from_utf8_lossy(response);
        let cleaned = response.trim_end_matches('\0').trim();

        if cleaned.is_empty() {
            return Err(RPCError::NoData);
        }

        let val: Value = serde_json::from_str(cleaned)?;
        RPCCommandStatus::from_response(&val).into_result()?;

        Ok(val)
    }
}

#[async_trait]
impl RPCAPIClient for CGMinerRPC {
    async fn send_command(&self, command: &str, parameter: Option<Value>) -> Result<Value> {
        let request = Self::build_request(command, parameter);
        debug!(ip = %self.ip, port = self.port, %request, "sending rpc command");

        let buffer = self.exchange(&request).await?;
        debug!(ip = %self.ip, command, bytes = buffer.len(), "rpc response received");

        Ok(Self::parse_rpc_result(&buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::net::TcpListener;

    async fn serve_once(reply: &'static [u8]) -> (u16, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(reply).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });

        (port, handle)
    }

    fn client(port: u16) -> CGMinerRPC {
        CGMinerRPC::new(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .with_port(port)
            .with_timeout(Duration::from_millis(500))
    }

    #[test]
    fn request_is_compact_json() {
        assert_eq!(
            CGMinerRPC::build_request("version", None),
            r#"{"command":"version"}"#
        );
        assert_eq!(
            CGMinerRPC::build_request("ascset", Some(json!("0,led,1-1"))),
            r#"{"command":"ascset","parameter":"0,led,1-1"}"#
        );
    }

    #[test]
    fn strips_null_padding() {
        let raw = b"{\"STATUS\":[{\"STATUS\":\"S\"}],\"VERSION\":[{\"MODEL\":\"Nano3s\"}]}\0\0\0\n";
        let val = CGMinerRPC::parse_rpc_result(raw).unwrap();
        assert_eq!(val.pointer("/VERSION/0/MODEL"), Some(&json!("Nano3s")));
    }

    #[test]
    fn empty_and_garbage_payloads_fail() {
        assert!(matches!(
            CGMinerRPC::parse_rpc_result(b"\0\0 \n"),
            Err(RPCError::NoData)
        ));
        assert!(matches!(
            CGMinerRPC::parse_rpc_result(b"Socket connect failed: Connection refused\n"),
            Err(RPCError::Decode(_))
        ));
    }

    #[test]
    fn error_status_is_a_failure() {
        let raw = br#"{"STATUS":[{"STATUS":"E","Msg":"Invalid command"}],"id":1}"#;
        assert!(matches!(
            CGMinerRPC::parse_rpc_result(raw),
            Err(RPCError::StatusCheckFailed(msg)) if msg == "Invalid command"
        ));
    }

    #[tokio::test]
    async fn round_trip_over_tcp() {
        let (port, server) =
            serve_once(b"{\"STATUS\":[{\"STATUS\":\"S\"}],\"SUMMARY\":[{\"MHS av\":1.0}]}\0").await;

        let val = client(port).send_command("summary", None).await.unwrap();

        assert_eq!(val.pointer("/SUMMARY/0/MHS av"), Some(&json!(1.0)));
        assert_eq!(server.await.unwrap(), r#"{"command":"summary"}"#);
    }

    #[tokio::test]
    async fn refused_connection_is_an_error() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        assert!(client(port).send_command("version", None).await.is_err());
    }

    #[tokio::test]
    async fn silent_peer_times_out_with_no_data() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(socket);
        });

        let err = client(port).send_command("estats", None).await.unwrap_err();

        assert!(err.to_string().contains("no data"));
        server.abort();
    }
}
