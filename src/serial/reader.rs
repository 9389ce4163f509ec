//! Per-connection reader task.
//!
//! The reader owns the stream for one connection generation: it frames
//! incoming bytes into lines, dispatches each line, and writes the
//! acknowledgement back. It exits on a transport error, on a stop signal, or
//! when it notices a newer generation has taken over.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, WriteHalf};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Duration;

use super::framer::LineFramer;
use crate::command::{Dispatcher, Response};
use crate::error::{BridgeError, Result};

/// Control messages from the supervisor to a reader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReaderSignal {
    Stop,
}

/// Why a reader task ended.
#[derive(Debug)]
pub enum ReaderExit {
    /// Asked to stop by the supervisor.
    Stopped,
    /// A newer connection generation exists.
    Superseded,
    /// The stream failed or reached end of file.
    Disconnected(BridgeError),
}

/// Shared connection generation counter. Only the reader whose id equals the
/// current value may touch the device.
#[derive(Clone, Debug, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
    /// Start a new generation and return its id.
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, id: u64) -> bool {
        self.current() == id
    }
}

/// Everything a reader needs besides the stream.
#[derive(Clone)]
pub struct ReaderContext {
    pub dispatcher: Dispatcher,
    pub generation: Generation,
    pub buffer_size: usize,
    pub transient_delay: Duration,
}

/// Supervisor side of a running reader.
pub struct ReaderHandle {
    pub id: u64,
    pub join: JoinHandle<ReaderExit>,
    stop: broadcast::Sender<ReaderSignal>,
}

impl ReaderHandle {
    /// Ask the reader to finish after the command it is currently running.
    pub fn signal_stop(&self) {
        let _ = self.stop.send(ReaderSignal::Stop);
    }
}

/// Spawn a reader for generation `id` on `stream`.
pub fn spawn_reader<S>(stream: S, id: u64, ctx: ReaderContext) -> ReaderHandle
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (stop, stop_rx) = broadcast::channel(4);
    let join = tokio::spawn(read_loop(stream, id, ctx, stop_rx));
    ReaderHandle { id, join, stop }
}

/// Read errors that do not mean the device is gone.
fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    )
}

async fn read_loop<S>(
    stream: S,
    id: u64,
    ctx: ReaderContext,
    mut stop: broadcast::Receiver<ReaderSignal>,
) -> ReaderExit
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    info!("Reader {} started", id);
    let (mut rx, mut tx) = tokio::io::split(stream);
    let mut framer = LineFramer::new();
    let mut buffer = vec![0u8; ctx.buffer_size.max(1)];

    loop {
        if !ctx.generation.is_current(id) {
            return ReaderExit::Superseded;
        }

        let read = tokio::select! {
            // Closed or lagged channels also mean the supervisor is done with us.
            _ = stop.recv() => return ReaderExit::Stopped,
            read = rx.read(&mut buffer) => read,
        };

        match read {
            Ok(0) => return ReaderExit::Disconnected(BridgeError::Disconnected),
            Ok(n) => {
                let lines = framer.push(&buffer[..n]);
                debug!("Read {} bytes, {} left unframed", n, framer.pending());
                for line in lines {
                    if !ctx.generation.is_current(id) {
                        return ReaderExit::Superseded;
                    }
                    info!("Received command: {}", line);
                    if let Some(response) = dispatch(&ctx.dispatcher, line).await {
                        // A failed ack leaves the connection to the next read.
                        if let Err(e) = send_response(&mut tx, &response).await {
                            warn!("Error sending serial response: {}", e);
                        }
                    }
                }
            }
            Err(e) if is_transient(&e) => {
                warn!("Unexpected error in serial thread: {}", e);
                tokio::time::sleep(ctx.transient_delay).await;
            }
            Err(e) => return ReaderExit::Disconnected(BridgeError::PortRead(e.to_string())),
        }
    }
}

/// Run one line on the blocking pool; backend calls may spawn processes.
async fn dispatch(dispatcher: &Dispatcher, line: String) -> Option<Response> {
    let dispatcher = dispatcher.clone();
    match tokio::task::spawn_blocking(move || dispatcher.execute(&line)).await {
        Ok(response) => response,
        Err(e) => {
            error!("Command dispatch aborted: {}", e);
            Some(Response::Err(String::from("internal error")))
        }
    }
}

async fn send_response<S>(tx: &mut WriteHalf<S>, response: &Response) -> Result<()>
where
    S: AsyncWrite,
{
    let line = response.to_line();
    tx.write_all(line.as_bytes())
        .await
        .map_err(|e| BridgeError::PortWrite(e.to_string()))?;
    tx.flush()
        .await
        .map_err(|e| BridgeError::PortWrite(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::task::{Context, Poll};

    use tokio::io::{ReadBuf, duplex};

    use super::*;
    use crate::backend::MockMediaBackend;

    /// Stream that yields scripted reads, then end of file. Writes are
    /// captured, or all fail with `BrokenPipe`.
    #[derive(Default)]
    struct ScriptedStream {
        reads: VecDeque<io::Result<Vec<u8>>>,
        written: Arc<Mutex<Vec<u8>>>,
        broken_pipe: bool,
    }

    impl ScriptedStream {
        fn new(reads: Vec<io::Result<&[u8]>>) -> Self {
            Self {
                reads: reads.into_iter().map(|r| r.map(<[u8]>::to_vec)).collect(),
                ..Self::default()
            }
        }
    }

    impl AsyncRead for ScriptedStream {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            match self.reads.pop_front() {
                Some(Ok(bytes)) => {
                    buf.put_slice(&bytes);
                    Poll::Ready(Ok(()))
                }
                Some(Err(e)) => Poll::Ready(Err(e)),
                None => Poll::Ready(Ok(())),
            }
        }
    }

    impl AsyncWrite for ScriptedStream {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            if self.broken_pipe {
                return Poll::Ready(Err(io::Error::from(io::ErrorKind::BrokenPipe)));
            }
            self.written.lock().unwrap().extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn context(mock: MockMediaBackend, generation: &Generation) -> ReaderContext {
        context_with(Dispatcher::new(Arc::new(mock)), generation)
    }

    fn context_with(dispatcher: Dispatcher, generation: &Generation) -> ReaderContext {
        ReaderContext {
            dispatcher,
            generation: generation.clone(),
            buffer_size: 16,
            transient_delay: Duration::from_millis(10),
        }
    }

    async fn read_line<R: AsyncRead + Unpin>(device: &mut R) -> String {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        while device.read_exact(&mut byte).await.is_ok() {
            line.push(byte[0]);
            if byte[0] == b'\n' {
                break;
            }
        }
        String::from_utf8(line).unwrap()
    }

    #[test]
    fn test_generation() {
        let generation = Generation::default();
        assert_eq!(generation.current(), 0);
        let first = generation.advance();
        assert!(generation.is_current(first));
        let second = generation.advance();
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
    }

    #[tokio::test]
    async fn test_reader_answers_and_exits_on_eof() {
        let mut mock = MockMediaBackend::new();
        mock.expect_play_pause().times(1).returning(|| Ok(()));
        let generation = Generation::default();
        let id = generation.advance();

        let (host, mut device) = duplex(64);
        let handle = spawn_reader(host, id, context(mock, &generation));

        device.write_all(b"x\nplay_").await.unwrap();
        device.write_all(b"pause\nshake\n").await.unwrap();
        assert_eq!(read_line(&mut device).await, "OK\n");
        assert_eq!(
            read_line(&mut device).await,
            "IGNORED: Unknown command SHAKE\n"
        );

        drop(device);
        let exit = handle.join.await.unwrap();
        assert!(matches!(
            exit,
            ReaderExit::Disconnected(BridgeError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn test_reader_stops_on_signal() {
        let generation = Generation::default();
        let id = generation.advance();
        let (host, _device) = duplex(64);
        let handle = spawn_reader(host, id, context(MockMediaBackend::new(), &generation));

        handle.signal_stop();
        assert!(matches!(handle.join.await.unwrap(), ReaderExit::Stopped));
    }

    #[tokio::test]
    async fn test_superseded_reader_drops_commands() {
        // No expectations: a dispatched command would panic the mock.
        let generation = Generation::default();
        let id = generation.advance();
        let (host, mut device) = duplex(64);
        let handle = spawn_reader(host, id, context(MockMediaBackend::new(), &generation));

        generation.advance();
        device.write_all(b"NEXT\n").await.unwrap();
        assert!(matches!(handle.join.await.unwrap(), ReaderExit::Superseded));
    }

    #[tokio::test]
    async fn test_transient_read_error_keeps_stream() {
        let mut mock = MockMediaBackend::new();
        mock.expect_next().times(1).returning(|| Ok(()));
        let dispatcher = Dispatcher::new(Arc::new(mock));
        let generation = Generation::default();
        let id = generation.advance();

        let stream = ScriptedStream::new(vec![
            Err(io::Error::from(io::ErrorKind::TimedOut)),
            Err(io::Error::from(io::ErrorKind::Interrupted)),
            Ok(&b"NEXT\n"[..]),
        ]);
        let written = stream.written.clone();
        let ctx = context_with(dispatcher.clone(), &generation);
        let exit = spawn_reader(stream, id, ctx).join.await.unwrap();

        assert!(matches!(
            exit,
            ReaderExit::Disconnected(BridgeError::Disconnected)
        ));
        assert_eq!(written.lock().unwrap().as_slice(), b"OK\n");
        drop(dispatcher);
    }

    #[tokio::test]
    async fn test_hard_read_error_disconnects() {
        let generation = Generation::default();
        let id = generation.advance();
        let stream = ScriptedStream::new(vec![Err(io::Error::from(
            io::ErrorKind::ConnectionReset,
        ))]);

        let handle = spawn_reader(stream, id, context(MockMediaBackend::new(), &generation));
        assert!(matches!(
            handle.join.await.unwrap(),
            ReaderExit::Disconnected(BridgeError::PortRead(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_response_write_is_not_fatal() {
        let mut mock = MockMediaBackend::new();
        mock.expect_next().times(1).returning(|| Ok(()));
        mock.expect_previous().times(1).returning(|| Ok(()));
        let dispatcher = Dispatcher::new(Arc::new(mock));
        let generation = Generation::default();
        let id = generation.advance();

        let mut stream = ScriptedStream::new(vec![Ok(&b"NEXT\n"[..]), Ok(&b"PREV\n"[..])]);
        stream.broken_pipe = true;
        let ctx = context_with(dispatcher.clone(), &generation);
        let exit = spawn_reader(stream, id, ctx).join.await.unwrap();

        // Both commands ran; only end of file ended the reader.
        assert!(matches!(
            exit,
            ReaderExit::Disconnected(BridgeError::Disconnected)
        ));
        drop(dispatcher);
    }

    #[tokio::test]
    async fn test_backend_panic_becomes_error_response() {
        let mut mock = MockMediaBackend::new();
        mock.expect_play_pause()
            .returning(|| panic!("media key injection crashed"));
        let generation = Generation::default();
        let id = generation.advance();

        let (host, mut device) = duplex(64);
        let handle = spawn_reader(host, id, context(mock, &generation));

        device.write_all(b"PLAY_PAUSE\nshake\n").await.unwrap();
        assert_eq!(read_line(&mut device).await, "ERR: internal error\n");
        // The reader survives and answers the next line.
        assert_eq!(
            read_line(&mut device).await,
            "IGNORED: Unknown command SHAKE\n"
        );

        drop(device);
        assert!(matches!(
            handle.join.await.unwrap(),
            ReaderExit::Disconnected(BridgeError::Disconnected)
        ));
    }
}
