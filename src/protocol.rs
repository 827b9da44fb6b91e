//! Wire format shared by the TCP and HTTP front ends.
//!
//! Requests and replies are JSON documents. Over TCP each document travels in
//! a frame: a 4-byte big-endian length followed by that many bytes.

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::commands::{DbCommand, DbResult};
use crate::service::ServiceError;

/// Reply envelope: `{"ok": true, "result": ...}` or
/// `{"ok": false, "kind": ..., "error": ...}`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum JsonResponse {
    Ok {
        ok: bool,
        result: DbResult,
    },
    Error {
        ok: bool,
        kind: &'static str,
        error: String,
    },
}

impl JsonResponse {
    pub fn error(kind: &'static str, error: impl Into<String>) -> Self {
        JsonResponse::Error {
            ok: false,
            kind,
            error: error.into(),
        }
    }
}

impl From<Result<DbResult, ServiceError>> for JsonResponse {
    fn from(result: Result<DbResult, ServiceError>) -> Self {
        match result {
            Ok(result) => JsonResponse::Ok { ok: true, result },
            Err(e) => JsonResponse::error(e.kind(), e.to_string()),
        }
    }
}

pub fn decode_command(payload: &[u8]) -> Result<DbCommand, ServiceError> {
    serde_json::from_slice(payload).map_err(|e| ServiceError::InvalidRequest(e.to_string()))
}

pub fn encode_response(response: &JsonResponse) -> Vec<u8> {
    serde_json::to_vec(response).unwrap_or_else(|e| {
        let fallback = JsonResponse::error("internal", format!("failed to encode reply: {}", e));
        serde_json::to_vec(&fallback).unwrap_or_default()
    })
}

/// Reads one frame. `Ok(None)` means the peer closed the stream cleanly
/// before a new frame started.
pub async fn read_frame<R>(stream: &mut R, max_len: usize) -> std::io::Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match stream.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > max_len {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("frame of {} bytes exceeds limit of {}", len, max_len),
        ));
    }

    let mut data = vec![0u8; len];
    stream.read_exact(&mut data).await?;

    Ok(Some(data))
}

pub async fn write_frame<W>(stream: &mut W, data: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(data.len())
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "frame too large"))?;
    stream.write_all(&len.to_be_bytes()).await?;
    stream.write_all(data).await?;
    stream.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;

    #[tokio::test]
    async fn frames_survive_a_pipe() {
        let (mut client, mut server) = tokio::io::duplex(64);
        write_frame(&mut client, b"hello").await.unwrap();
        write_frame(&mut client, b"").await.unwrap();
        drop(client);

        assert_eq!(read_frame(&mut server, 16).await.unwrap(), Some(b"hello".to_vec()));
        assert_eq!(read_frame(&mut server, 16).await.unwrap(), Some(Vec::new()));
        assert_eq!(read_frame(&mut server, 16).await.unwrap(), None);
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        write_frame(&mut client, &[0u8; 32]).await.unwrap();

        let err = read_frame(&mut server, 16).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn truncated_frame_is_an_error() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(&10u32.to_be_bytes()).await.unwrap();
        client.write_all(b"abc").await.unwrap();
        drop(client);

        assert!(read_frame(&mut server, 16).await.is_err());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            decode_command(b"not json"),
            Err(ServiceError::InvalidRequest(_))
        ));
        assert!(matches!(
            decode_command(br#"{"type": "listDatabases"}"#),
            Ok(DbCommand::ListDatabases)
        ));
    }

    #[test]
    fn error_envelope_shape() {
        let response = JsonResponse::from(Err(ServiceError::Db(DbError::DuplicateName("x".into()))));
        let json: serde_json::Value = serde_json::from_slice(&encode_response(&response)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ok": false,
                "kind": "duplicate_name",
                "error": "database 'x' already exists"
            })
        );
    }

    #[test]
    fn ok_envelope_shape() {
        let response = JsonResponse::from(Ok(DbResult::Deleted(true)));
        let json: serde_json::Value = serde_json::from_slice(&encode_response(&response)).unwrap();
        assert_eq!(json, serde_json::json!({"ok": true, "result": {"deleted": true}}));
    }
}
