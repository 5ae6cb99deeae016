//! Bounded capture of child process output

use tokio::io::{AsyncRead, AsyncReadExt};

pub(crate) const TRUNCATION_MARKER: &str = "\n[output truncated]";

/// Output of one child stream, capped at the configured limit.
pub(crate) struct CapturedStream {
    bytes: Vec<u8>,
    truncated: bool,
}

impl CapturedStream {
    pub(crate) fn into_text(self) -> String {
        let mut text = String::from_utf8_lossy(&self.bytes).into_owned();
        if self.truncated {
            text.push_str(TRUNCATION_MARKER);
        }
        text
    }
}

/// Read a stream to EOF, keeping at most `limit` bytes.
///
/// Bytes past the limit are still consumed and discarded, so a chatty child
/// never blocks on a full pipe while we hold the read end.
pub(crate) async fn read_capped<R>(mut reader: R, limit: usize) -> std::io::Result<CapturedStream>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        if bytes.len() < limit {
            let take = n.min(limit - bytes.len());
            bytes.extend_from_slice(&chunk[..take]);
            if take < n {
                truncated = true;
            }
        } else {
            truncated = true;
        }
    }

    Ok(CapturedStream { bytes, truncated })
}
