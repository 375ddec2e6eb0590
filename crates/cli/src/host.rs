// Host mode: JSONL host events in, `ready` + `state` messages out.
//
// Each inbound line is decoded on its own; a line that is not UTF-8 or not
// a known event gets an `error` reply and the session continues. Only real
// I/O failures end it.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};
use unfollowers_core::{LifecycleView, RefreshLifecycle};
use unfollowers_graph_client::GraphFetcher;
use unfollowers_protocol::{parse_event_bytes, ClientMessage, HostEvent, ProtocolError};

/// Inbound events buffered ahead of the lifecycle task.
const EVENT_BUFFER: usize = 32;

/// Serve one host session until `teardown` or end of input.
pub async fn run_host<F, R, W>(
    lifecycle: RefreshLifecycle<F>,
    input: R,
    mut output: W,
) -> io::Result<LifecycleView>
where
    F: GraphFetcher + 'static,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut views = lifecycle.subscribe();
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let task = tokio::spawn(lifecycle.run(rx));

    write_message(&mut output, &ClientMessage::ready()).await?;

    let mut add_frame_sent = false;
    let mut lines = input.split(b'\n');
    loop {
        tokio::select! {
            line = lines.next_segment() => {
                let Some(line) = line? else {
                    debug!("host input closed");
                    break;
                };
                match parse_event_bytes(&line) {
                    Ok(event) => {
                        let teardown = event == HostEvent::Teardown;
                        if tx.send(event).await.is_err() || teardown {
                            break;
                        }
                    }
                    Err(ProtocolError::Empty) => {}
                    Err(err) => {
                        warn!(error = %err, "skipping host line");
                        let message = ClientMessage::Error { message: err.to_string() };
                        write_message(&mut output, &message).await?;
                    }
                }
            }
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                write_view(&mut output, &mut views, &mut add_frame_sent).await?;
            }
        }
    }

    drop(tx);
    let last = task.await.map_err(io::Error::other)?;

    // A view published right before teardown may not have been written yet
    if views.has_changed().unwrap_or(false) {
        write_view(&mut output, &mut views, &mut add_frame_sent).await?;
    }
    output.flush().await?;
    Ok(last)
}

/// Write the latest view, preceded by the one-time `add_frame` request.
async fn write_view<W: AsyncWrite + Unpin>(
    output: &mut W,
    views: &mut watch::Receiver<LifecycleView>,
    add_frame_sent: &mut bool,
) -> io::Result<()> {
    let state = views.borrow_and_update().to_message();
    if state.add_frame_requested && !*add_frame_sent {
        *add_frame_sent = true;
        write_message(output, &ClientMessage::AddFrame).await?;
    }
    write_message(output, &ClientMessage::State(state)).await
}

async fn write_message<W: AsyncWrite + Unpin>(output: &mut W, message: &ClientMessage) -> io::Result<()> {
    let mut line = message.to_line().map_err(io::Error::other)?;
    line.push('\n');
    output.write_all(line.as_bytes()).await?;
    output.flush().await
}
