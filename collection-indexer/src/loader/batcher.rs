//! Size and age bounded batching of bulk entries.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

/// Groups entries from a channel into bulk batches.
///
/// A batch is flushed once it holds `max_size` entries or once `max_duration`
/// has passed since its first entry arrived, whichever comes first.
pub struct Batcher {
    receiver: mpsc::Receiver<String>,
    max_size: usize,
    max_duration: Duration,
}

impl Batcher {
    pub fn new(receiver: mpsc::Receiver<String>, max_size: usize, max_duration: Duration) -> Self {
        Self {
            receiver,
            max_size: max_size.max(1),
            max_duration,
        }
    }

    /// Wait for the next batch.
    ///
    /// Returns `None` once the channel is closed and drained. A partial batch
    /// pending when the channel closes is still returned.
    pub async fn next_batch(&mut self) -> Option<Vec<String>> {
        let first = self.receiver.recv().await?;
        let deadline = Instant::now() + self.max_duration;

        let mut batch = Vec::with_capacity(self.max_size);
        batch.push(first);

        while batch.len() < self.max_size {
            tokio::select! {
                entry = self.receiver.recv() => match entry {
                    Some(entry) => batch.push(entry),
                    None => break,
                },
                _ = sleep_until(deadline) => break,
            }
        }
        Some(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batcher(max_size: usize, max_ms: u64) -> (mpsc::Sender<String>, Batcher) {
        let (sender, receiver) = mpsc::channel(16);
        (sender, Batcher::new(receiver, max_size, Duration::from_millis(max_ms)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_batch_flushes_immediately() {
        let (sender, mut batcher) = batcher(3, 500);
        for line in ["a", "b", "c", "d"] {
            sender.send(line.to_string()).await.unwrap();
        }
        let started = Instant::now();

        let batch = batcher.next_batch().await.unwrap();

        assert_eq!(batch, vec!["a", "b", "c"]);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lone_entry_flushes_after_max_duration() {
        let (sender, mut batcher) = batcher(3, 500);
        sender.send("a".to_string()).await.unwrap();
        let started = Instant::now();

        let batch = batcher.next_batch().await.unwrap();

        assert_eq!(batch, vec!["a"]);
        assert!(started.elapsed() >= Duration::from_millis(500));
        drop(sender);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_counts_from_first_entry() {
        let (sender, mut batcher) = batcher(10, 500);
        let producer = tokio::spawn(async move {
            sender.send("a".to_string()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(400)).await;
            sender.send("b".to_string()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(400)).await;
            sender.send("c".to_string()).await.unwrap();
        });

        assert_eq!(batcher.next_batch().await.unwrap(), vec!["a", "b"]);
        assert_eq!(batcher.next_batch().await.unwrap(), vec!["c"]);
        assert!(batcher.next_batch().await.is_none());
        producer.await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_channel_flushes_partial_batch() {
        let (sender, mut batcher) = batcher(3, 60_000);
        sender.send("a".to_string()).await.unwrap();
        drop(sender);

        assert_eq!(batcher.next_batch().await.unwrap(), vec!["a"]);
        assert!(batcher.next_batch().await.is_none());
    }
}
