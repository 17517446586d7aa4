//! Stream pipeline
//!
//! Two long-lived tasks joined by one bounded queue of byte chunks. The
//! reader copies bytes off the input as fast as the queue allows; the
//! processor slices the accumulation into fixed-size chunks and drives the
//! rotation engine. The queue is the sole synchronization point: the reader
//! suspends when it is full (throttling input to the speed of compression
//! and disk), the processor suspends when it is empty.

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::rotation::{RotationEngine, RotationResult};
use crate::shutdown::ShutdownHandle;

/// Queue depth in chunks; the backpressure knob
const QUEUE_DEPTH: usize = 100;

/// Runs the pipeline to completion: opens the first file, drains the input,
/// flushes the final partial chunk, and closes the engine.
///
/// # Errors
///
/// Fails only on fatal rotation errors (a file that cannot be created);
/// per-chunk I/O errors are logged by the engine and streaming continues.
pub async fn run<R>(
    input: R,
    mut engine: RotationEngine,
    chunk_size: usize,
    shutdown: ShutdownHandle,
) -> RotationResult<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    engine.open_file()?;

    let (tx, rx) = mpsc::channel::<Vec<u8>>(QUEUE_DEPTH);
    let reader = tokio::spawn(read_loop(input, tx, chunk_size, shutdown));

    let result = process_loop(rx, &mut engine, chunk_size).await;
    engine.close();

    // The reader finished before the queue could drain; surface panics only.
    if let Err(e) = reader.await {
        error!(error = %e, "reader task failed");
    }

    result
}

/// Reader task: copies each read into a fresh chunk and enqueues it.
///
/// Terminates on end-of-input, read error, shutdown request, or a closed
/// queue; dropping the sender closes the queue for the processor.
async fn read_loop<R>(
    mut input: R,
    tx: mpsc::Sender<Vec<u8>>,
    read_buffer_size: usize,
    mut shutdown: ShutdownHandle,
) where
    R: AsyncRead + Unpin,
{
    let mut buffer = vec![0u8; read_buffer_size];

    loop {
        tokio::select! {
            result = input.read(&mut buffer) => match result {
                Ok(0) => break,
                Ok(n) => {
                    // The read buffer is reused; the queue gets its own copy.
                    if tx.send(buffer[..n].to_vec()).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!(error = %e, "error reading input");
                    break;
                }
            },
            signal = shutdown.wait() => {
                info!(%signal, "reader stopping for shutdown");
                break;
            }
        }
    }
}

/// Processor task: accumulates dequeued chunks and feeds the engine in
/// exact `chunk_size` slices, then flushes the final shorter remainder.
async fn process_loop(
    mut rx: mpsc::Receiver<Vec<u8>>,
    engine: &mut RotationEngine,
    chunk_size: usize,
) -> RotationResult<()> {
    let mut accumulation: Vec<u8> = Vec::new();

    while let Some(received) = rx.recv().await {
        accumulation.extend_from_slice(&received);

        while accumulation.len() >= chunk_size {
            let rest = accumulation.split_off(chunk_size);
            let chunk = std::mem::replace(&mut accumulation, rest);
            engine.write_chunk(&chunk)?;
        }
    }

    if !accumulation.is_empty() {
        info!(bytes = accumulation.len(), "processing final partial chunk");
        engine.write_chunk(&accumulation)?;
    }

    Ok(())
}
