//! Accumulates reply fragments into successive message snapshots.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use futures::stream::FusedStream;

use crate::classify::ClassifiedError;
use crate::error::Error;
use crate::provider::FragmentStream;
use crate::types::Message;

/// A stream adapter that turns a [`FragmentStream`] into [`Message`] snapshots.
///
/// Every fragment yields one snapshot with the fragment's text and citations
/// appended and `is_streaming` still set.  The last snapshot is always
/// terminal: at natural end it carries the accumulated reply; on failure its
/// text is the classified user-facing message and partial output is
/// discarded.  After the terminal snapshot the stream is exhausted.
pub struct AggregatingStream {
    inner: Option<FragmentStream>,
    message: Message,
    failure: Option<ClassifiedError>,
}

impl AggregatingStream {
    /// Aggregates `inner` into `placeholder`.
    pub fn new(inner: FragmentStream, placeholder: Message) -> Self {
        Self {
            inner: Some(inner),
            message: placeholder,
            failure: None,
        }
    }

    /// The most recent snapshot.
    pub fn snapshot(&self) -> &Message {
        &self.message
    }

    /// The classified failure, once the stream has failed.
    pub fn failure(&self) -> Option<&ClassifiedError> {
        self.failure.as_ref()
    }

    /// True once the terminal snapshot has been produced.
    pub fn is_finished(&self) -> bool {
        self.inner.is_none()
    }

    /// Stops consuming fragments and returns the terminal snapshot.
    ///
    /// Text received so far is kept.  Calling this after the stream finished
    /// returns the existing terminal snapshot unchanged.
    pub fn cancel(&mut self) -> Message {
        if self.inner.take().is_some() {
            self.message.is_streaming = false;
        }
        self.message.clone()
    }

    fn finish(&mut self) -> Message {
        self.inner = None;
        self.message.is_streaming = false;
        self.message.clone()
    }

    fn fail(&mut self, err: &Error) -> Message {
        let classified = ClassifiedError::from(err);
        self.inner = None;
        fail_message(&mut self.message, &classified);
        self.failure = Some(classified);
        self.message.clone()
    }
}

/// Turns `message` into a terminal failure report.
pub fn fail_message(message: &mut Message, failure: &ClassifiedError) {
    message.text = failure.user_message.clone();
    message.citations.clear();
    message.is_streaming = false;
    message.error = Some(failure.kind);
}

impl Stream for AggregatingStream {
    type Item = Message;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };
        match inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(fragment))) => {
                this.message.apply(&fragment);
                Poll::Ready(Some(this.message.clone()))
            }
            Poll::Ready(Some(Err(err))) => Poll::Ready(Some(this.fail(&err))),
            Poll::Ready(None) => Poll::Ready(Some(this.finish())),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl FusedStream for AggregatingStream {
    fn is_terminated(&self) -> bool {
        self.inner.is_none()
    }
}
