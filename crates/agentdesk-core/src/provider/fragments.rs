//! Normalization of raw adapter streams.
//!
//! `guard_fragments` turns an [`AdapterStream`] into a plain fragment
//! sequence that always ends in exactly one terminal fragment, and stops
//! polling the adapter once the cancellation token fires. Fragments the
//! adapter already has ready at that point are still delivered. Dropping the
//! inner stream is what releases the backend (subprocess or HTTP body).

use std::pin::Pin;

use futures_util::{FutureExt, Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use agentdesk_types::chat::ResponseFragment;
use agentdesk_types::llm::AdapterError;

use super::adapter::AdapterStream;

/// Fragment stream with adapter errors already folded into `Error` fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = ResponseFragment> + Send>>;

/// Convert an adapter error into its terminal fragment.
pub fn fragment_from_error(error: &AdapterError) -> ResponseFragment {
    match error {
        AdapterError::Aborted => ResponseFragment::aborted(),
        other => ResponseFragment::error(other.kind(), other.to_string()),
    }
}

/// Wrap an adapter stream with cancellation and terminal guarantees.
pub fn guard_fragments(mut inner: AdapterStream, cancel: CancellationToken) -> FragmentStream {
    Box::pin(async_stream::stream! {
        loop {
            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                item = inner.next() => Some(item),
            };
            let Some(next) = polled else {
                // Drain what is ready without waiting on the adapter again.
                let mut completed = false;
                while let Some(Some(Ok(fragment))) = inner.next().now_or_never() {
                    completed = fragment.is_terminal();
                    yield fragment;
                    if completed {
                        break;
                    }
                }
                if !completed {
                    yield ResponseFragment::aborted();
                }
                break;
            };

            match next {
                Some(Ok(fragment)) => {
                    let terminal = fragment.is_terminal();
                    yield fragment;
                    if terminal {
                        break;
                    }
                }
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "adapter stream failed");
                    yield fragment_from_error(&e);
                    break;
                }
                None => {
                    tracing::debug!("adapter stream ended without a terminal fragment");
                    yield ResponseFragment::Done { session_id: None };
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentdesk_types::error::ErrorKind;
    use std::time::Duration;

    fn scripted(items: Vec<Result<ResponseFragment, AdapterError>>) -> AdapterStream {
        Box::pin(futures_util::stream::iter(items))
    }

    #[tokio::test]
    async fn test_passes_through_until_done() {
        let stream = scripted(vec![
            Ok(ResponseFragment::text("a")),
            Ok(ResponseFragment::Done {
                session_id: Some("s1".to_string()),
            }),
            Ok(ResponseFragment::text("after done")),
        ]);
        let out: Vec<_> = guard_fragments(stream, CancellationToken::new())
            .collect()
            .await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], ResponseFragment::text("a"));
        assert!(out[1].is_terminal());
    }

    #[tokio::test]
    async fn test_synthesizes_done_when_missing() {
        let stream = scripted(vec![Ok(ResponseFragment::text("a"))]);
        let out: Vec<_> = guard_fragments(stream, CancellationToken::new())
            .collect()
            .await;
        assert_eq!(out.last(), Some(&ResponseFragment::Done { session_id: None }));
    }

    #[tokio::test]
    async fn test_error_becomes_error_fragment() {
        let stream = scripted(vec![
            Ok(ResponseFragment::text("partial")),
            Err(AdapterError::Stream("connection reset".to_string())),
        ]);
        let out: Vec<_> = guard_fragments(stream, CancellationToken::new())
            .collect()
            .await;
        assert_eq!(out.len(), 2);
        match &out[1] {
            ResponseFragment::Error { kind, message } => {
                assert_eq!(*kind, ErrorKind::Adapter);
                assert!(message.contains("connection reset"));
            }
            other => panic!("expected error fragment, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancel_stops_pending_stream() {
        let cancel = CancellationToken::new();
        let stream: AdapterStream = Box::pin(async_stream::stream! {
            yield Ok(ResponseFragment::text("first"));
            tokio::time::sleep(Duration::from_secs(60)).await;
            yield Ok(ResponseFragment::text("never"));
        });
        let mut guarded = guard_fragments(stream, cancel.clone());
        assert_eq!(guarded.next().await, Some(ResponseFragment::text("first")));
        cancel.cancel();
        assert_eq!(guarded.next().await, Some(ResponseFragment::aborted()));
        assert_eq!(guarded.next().await, None);
    }

    #[tokio::test]
    async fn test_ready_fragments_delivered_before_aborted() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let stream = scripted(vec![
            Ok(ResponseFragment::text("a")),
            Ok(ResponseFragment::text("b")),
        ]);
        let out: Vec<_> = guard_fragments(stream, cancel).collect().await;
        assert_eq!(
            out,
            vec![
                ResponseFragment::text("a"),
                ResponseFragment::text("b"),
                ResponseFragment::aborted(),
            ]
        );
    }

    #[tokio::test]
    async fn test_ready_done_wins_over_abort() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let stream = scripted(vec![
            Ok(ResponseFragment::text("a")),
            Ok(ResponseFragment::Done { session_id: None }),
        ]);
        let out: Vec<_> = guard_fragments(stream, cancel).collect().await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[1], ResponseFragment::Done { session_id: None });
    }

    #[tokio::test]
    async fn test_already_cancelled_pending_stream_yields_only_aborted() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let stream: AdapterStream = Box::pin(async_stream::stream! {
            tokio::time::sleep(Duration::from_secs(60)).await;
            yield Ok(ResponseFragment::text("never"));
        });
        let out: Vec<_> = guard_fragments(stream, cancel).collect().await;
        assert_eq!(out, vec![ResponseFragment::aborted()]);
    }
}
