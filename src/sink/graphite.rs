use std::fmt::Write as _;
use std::sync::Mutex;

use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;

use super::{MetricSink, SinkError};
use crate::stats::Metric;

/// Graphite carbon plaintext sink: `<[prefix.]name> <value> <timestamp>\n` per metric.
///
/// Connections are pooled. A push checks out an idle connection (or dials a new one),
/// writes without holding any lock and hands the connection back on success, so a
/// stalled push only holds up its own caller. A failed write drops the connection.
#[derive(Debug)]
pub struct GraphiteSink {
    addr: String,
    prefix: Option<String>,
    idle: Mutex<Vec<BufWriter<TcpStream>>>,
}

/// Idle connections kept around beyond this are closed.
const MAX_IDLE_CONNECTIONS: usize = 8;

impl GraphiteSink {
    /// Connects to the carbon daemon at `host:port`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Connect`] if the initial connection fails.
    pub async fn connect(
        host: &str,
        port: u16,
        prefix: Option<&str>,
    ) -> Result<Self, SinkError> {
        let addr = format!("{host}:{port}");
        let stream = dial(&addr).await?;
        log::info!("Connected to graphite at {addr}");
        Ok(Self {
            addr,
            prefix: prefix.map(str::to_owned),
            idle: Mutex::new(vec![stream]),
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn checkout(&self) -> Option<BufWriter<TcpStream>> {
        self.idle.lock().ok()?.pop()
    }

    fn checkin(&self, stream: BufWriter<TcpStream>) {
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < MAX_IDLE_CONNECTIONS {
                idle.push(stream);
            }
        }
    }

    fn encode(&self, metrics: &[Metric]) -> String {
        let mut buf = String::with_capacity(metrics.len() * 64);
        for metric in metrics {
            // writing into a String cannot fail
            let _ = match &self.prefix {
                Some(prefix) => writeln!(
                    buf,
                    "{}.{} {} {}",
                    prefix,
                    metric.name(),
                    metric.value(),
                    metric.timestamp()
                ),
                None => writeln!(
                    buf,
                    "{} {} {}",
                    metric.name(),
                    metric.value(),
                    metric.timestamp()
                ),
            };
        }
        buf
    }
}

impl MetricSink for GraphiteSink {
    async fn push(&self, metrics: &[Metric]) -> Result<(), SinkError> {
        if metrics.is_empty() {
            return Ok(());
        }
        let payload = self.encode(metrics);

        let mut stream = match self.checkout() {
            Some(stream) => stream,
            None => {
                log::debug!("Opening connection to graphite at {}", self.addr);
                dial(&self.addr).await?
            }
        };

        write_payload(&mut stream, payload.as_bytes())
            .await
            .map_err(|source| SinkError::Write {
                addr: self.addr.clone(),
                count: metrics.len(),
                source,
            })?;
        self.checkin(stream);

        log::trace!("sent {} metrics to {}", metrics.len(), self.addr);
        Ok(())
    }
}

async fn write_payload(stream: &mut BufWriter<TcpStream>, payload: &[u8]) -> std::io::Result<()> {
    stream.write_all(payload).await?;
    stream.flush().await
}

async fn dial(addr: &str) -> Result<BufWriter<TcpStream>, SinkError> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|source| SinkError::Connect {
            addr: addr.to_owned(),
            source,
        })?;
    Ok(BufWriter::new(stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    async fn read_lines(listener: TcpListener, expected: usize) -> Vec<String> {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = String::new();
        while buf.lines().count() < expected {
            let mut chunk = [0u8; 1024];
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed early");
            buf.push_str(std::str::from_utf8(&chunk[..n]).unwrap());
        }
        buf.lines().map(str::to_owned).collect()
    }

    #[tokio::test]
    async fn test_push_with_prefix() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let reader = tokio::spawn(read_lines(listener, 2));

        let sink = GraphiteSink::connect("127.0.0.1", port, Some("prod"))
            .await
            .unwrap();
        sink.push(&[
            Metric::new("abc.memory.cache", "10", 100),
            Metric::new("abc.memory.rss", "20", 100),
        ])
        .await
        .unwrap();

        let lines = reader.await.unwrap();
        assert_eq!(
            lines,
            vec!["prod.abc.memory.cache 10 100", "prod.abc.memory.rss 20 100"]
        );
    }

    #[tokio::test]
    async fn test_push_without_prefix() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let reader = tokio::spawn(read_lines(listener, 1));

        let sink = GraphiteSink::connect("127.0.0.1", port, None).await.unwrap();
        sink.push(&[Metric::new("abc.cpuacct.cpuacct_usage", "42", 7)])
            .await
            .unwrap();

        assert_eq!(reader.await.unwrap(), vec!["abc.cpuacct.cpuacct_usage 42 7"]);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = GraphiteSink::connect("127.0.0.1", port, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::Connect { .. }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stalled_push_does_not_block_others() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        // accept every connection but never read from it
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let sink = Arc::new(GraphiteSink::connect("127.0.0.1", port, None).await.unwrap());
        let flood: Vec<_> = (0..400_000)
            .map(|i| Metric::new(format!("a.memory.m{i}"), "1", 1))
            .collect();
        let stalled = {
            let sink = Arc::clone(&sink);
            tokio::spawn(async move { sink.push(&flood).await })
        };
        tokio::time::sleep(Duration::from_millis(500)).await;

        let res = tokio::time::timeout(
            Duration::from_secs(2),
            sink.push(&[Metric::new("b.memory.cache", "1", 1)]),
        )
        .await;
        assert!(matches!(res, Ok(Ok(()))), "push of b waited on a: {res:?}");
        stalled.abort();
    }

    #[tokio::test]
    async fn test_connection_is_reused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let reader = tokio::spawn(read_lines(listener, 2));

        let sink = GraphiteSink::connect("127.0.0.1", port, None).await.unwrap();
        sink.push(&[Metric::new("a.memory.cache", "1", 1)])
            .await
            .unwrap();
        sink.push(&[Metric::new("a.memory.cache", "2", 2)])
            .await
            .unwrap();

        // both lines arrive on the single accepted connection
        assert_eq!(
            reader.await.unwrap(),
            vec!["a.memory.cache 1 1", "a.memory.cache 2 2"]
        );
    }

    #[tokio::test]
    async fn test_empty_batch_is_not_sent() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let sink = GraphiteSink::connect("127.0.0.1", port, None).await.unwrap();
        assert!(sink.push(&[]).await.is_ok());
        assert_eq!(sink.addr(), format!("127.0.0.1:{port}"));
    }
}
