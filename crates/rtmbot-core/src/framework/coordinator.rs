//! Response coordinator.
//!
//! Turns the replies of one dispatch into writes and a loop decision:
//!
//! | Status | Message written? | Effect |
//! |--------|------------------|--------|
//! | `Continue` | yes | keep going |
//! | `Shutdown` | yes | keep going, stop the loop afterwards |
//! | `ShutdownNow` | no | stop right here, drop everything after |

use tracing::{debug, warn};

use crate::foundation::message::{Reply, Status};
use crate::integration::transport::MessageSink;

/// What the connection loop should do after a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Read the next frame.
    KeepLooping,
    /// A handler asked for `Shutdown`; all messages were written.
    TerminateAfter,
    /// A handler asked for `ShutdownNow`; later messages were discarded.
    TerminateNow,
}

impl Verdict {
    /// Returns `true` unless the verdict is [`Verdict::KeepLooping`].
    pub fn should_terminate(self) -> bool {
        !matches!(self, Self::KeepLooping)
    }
}

/// Writes the messages of `replies` to `sink` in order and decides whether the
/// loop continues.
///
/// A failed write is logged and otherwise ignored; outbound delivery is best
/// effort.
pub async fn apply<S>(replies: Vec<Reply>, sink: &mut S) -> Verdict
where
    S: MessageSink + ?Sized,
{
    let mut terminate_after = false;
    let mut written = 0usize;

    for (index, reply) in replies.into_iter().enumerate() {
        if reply.status == Status::ShutdownNow {
            debug!(reply_index = index, written, "ShutdownNow requested, discarding the rest");
            return Verdict::TerminateNow;
        }
        if reply.status == Status::Shutdown {
            terminate_after = true;
        }
        if let Some(message) = reply.message {
            match sink.send(&message).await {
                Ok(()) => written += 1,
                Err(e) => warn!(
                    message_id = %message.id(),
                    channel = %message.channel(),
                    error = %e,
                    "Failed to send message"
                ),
            }
        }
    }

    if terminate_after {
        debug!(written, "Shutdown requested, terminating after this dispatch");
        Verdict::TerminateAfter
    } else {
        Verdict::KeepLooping
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::error::{TransportError, TransportResult};
    use crate::foundation::message::OutgoingMessage;
    use async_trait::async_trait;

    fn msg(text: &str) -> OutgoingMessage {
        OutgoingMessage::new(text, "C1")
    }

    fn texts(sent: &[OutgoingMessage]) -> Vec<&str> {
        sent.iter().map(OutgoingMessage::text).collect()
    }

    #[tokio::test]
    async fn test_shutdown_now_discards_the_rest() {
        let replies = vec![
            Reply::new(Some(msg("m1")), Status::Continue),
            Reply::new(Some(msg("m2")), Status::ShutdownNow),
            Reply::new(Some(msg("m3")), Status::Continue),
        ];
        let mut sent: Vec<OutgoingMessage> = Vec::new();

        let verdict = apply(replies, &mut sent).await;

        assert_eq!(verdict, Verdict::TerminateNow);
        assert_eq!(texts(&sent), vec!["m1"]);
    }

    #[tokio::test]
    async fn test_shutdown_writes_everything_then_terminates() {
        let replies = vec![
            Reply::new(Some(msg("m1")), Status::Continue),
            Reply::new(Some(msg("m2")), Status::Shutdown),
            Reply::new(Some(msg("m3")), Status::Continue),
        ];
        let mut sent: Vec<OutgoingMessage> = Vec::new();

        let verdict = apply(replies, &mut sent).await;

        assert_eq!(verdict, Verdict::TerminateAfter);
        assert_eq!(texts(&sent), vec!["m1", "m2", "m3"]);
    }

    #[tokio::test]
    async fn test_continue_keeps_looping_and_skips_empty_replies() {
        let replies = vec![Reply::none(), Reply::send(msg("only")), Reply::none()];
        let mut sent: Vec<OutgoingMessage> = Vec::new();

        assert_eq!(apply(replies, &mut sent).await, Verdict::KeepLooping);
        assert_eq!(texts(&sent), vec!["only"]);
    }

    #[test]
    fn test_empty_dispatch_keeps_looping() {
        let mut sent: Vec<OutgoingMessage> = Vec::new();
        let verdict = tokio_test::block_on(apply(Vec::new(), &mut sent));
        assert_eq!(verdict, Verdict::KeepLooping);
        assert!(sent.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_then_shutdown_now() {
        let replies = vec![
            Reply::new(Some(msg("m1")), Status::Shutdown),
            Reply::new(Some(msg("m2")), Status::ShutdownNow),
        ];
        let mut sent: Vec<OutgoingMessage> = Vec::new();

        assert_eq!(apply(replies, &mut sent).await, Verdict::TerminateNow);
        assert_eq!(texts(&sent), vec!["m1"]);
    }

    struct BrokenSink {
        attempts: usize,
    }

    #[async_trait]
    impl MessageSink for BrokenSink {
        async fn send(&mut self, _message: &OutgoingMessage) -> TransportResult<()> {
            self.attempts += 1;
            Err(TransportError::SendFailed("socket gone".into()))
        }
    }

    #[tokio::test]
    async fn test_write_failures_do_not_change_verdict() {
        let replies = vec![Reply::send(msg("a")), Reply::send(msg("b"))];
        let mut sink = BrokenSink { attempts: 0 };

        assert_eq!(apply(replies, &mut sink).await, Verdict::KeepLooping);
        assert_eq!(sink.attempts, 2);
    }

    #[test]
    fn test_should_terminate() {
        assert!(!Verdict::KeepLooping.should_terminate());
        assert!(Verdict::TerminateAfter.should_terminate());
        assert!(Verdict::TerminateNow.should_terminate());
    }
}
