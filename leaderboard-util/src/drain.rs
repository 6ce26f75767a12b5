use bytes::Buf;
use hyper::body::Body;
use pin_project_lite::pin_project;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

pin_project! {
    /// Collects every data frame of a body into a `Vec<u8>`, refusing to grow past `limit`.
    pub struct DrainBodyFuture<B: Body> {
        #[pin]
        body: B,
        buf: Vec<u8>,
        limit: usize,
    }
}

impl<B> DrainBodyFuture<B>
where
    B: Body,
{
    #[inline]
    #[must_use]
    pub fn new_limited(body: B, content_length: usize, limit: usize) -> Self {
        Self {
            body,
            buf: Vec::with_capacity(content_length.min(limit)),
            limit,
        }
    }
}

impl<B> Future for DrainBodyFuture<B>
where
    B: Body,
    B::Error: Display,
{
    type Output = Result<Vec<u8>, anyhow::Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slf = self.project();
        loop {
            let Some(next_res) = ready!(slf.body.as_mut().poll_frame(cx)) else {
                return Poll::Ready(Ok(std::mem::take(slf.buf)));
            };
            let next_frame = match next_res {
                Ok(frame) => frame,
                Err(e) => {
                    return Poll::Ready(Err(anyhow::anyhow!("Failed to poll next frame: {e}")));
                }
            };
            // Trailers carry nothing we keep.
            let Ok(mut data) = next_frame.into_data() else {
                continue;
            };
            if slf.buf.len() + data.remaining() > *slf.limit {
                return Poll::Ready(Err(anyhow::anyhow!(
                    "Body exceeds limit of {} bytes",
                    slf.limit
                )));
            }
            while data.has_remaining() {
                let chunk = data.chunk();
                let len = chunk.len();
                slf.buf.extend_from_slice(chunk);
                data.advance(len);
            }
            if slf.body.is_end_stream() {
                return Poll::Ready(Ok(std::mem::take(slf.buf)));
            }
        }
    }
}
