use tokio::sync::watch;

/// Shutdown signal shared by every periodic task. Cloning subscribes another listener.
#[derive(Clone, Debug)]
pub struct CancellationToken {
    receiver: watch::Receiver<bool>,
}

/// Owner side of a [`CancellationToken`].
#[derive(Debug)]
pub struct CancellationSource {
    sender: watch::Sender<bool>,
}

impl CancellationSource {
    pub fn new() -> (Self, CancellationToken) {
        let (tx, rx) = watch::channel(false);
        (Self { sender: tx }, CancellationToken { receiver: rx })
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            receiver: self.sender.subscribe(),
        }
    }
}

impl CancellationToken {
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once cancelled, or when the source is dropped.
    pub async fn cancelled(&mut self) {
        while !*self.receiver.borrow_and_update() {
            if self.receiver.changed().await.is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_wakes_all_tokens() {
        let (source, token) = CancellationSource::new();
        let mut first = token.clone();
        let mut second = source.token();

        let waiter = tokio::spawn(async move {
            first.cancelled().await;
            second.cancelled().await;
        });

        assert!(!token.is_cancelled());
        source.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("cancellation observed")
            .expect("join");
        assert!(token.is_cancelled());
        assert!(source.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropped_source_releases_waiters() {
        let (source, mut token) = CancellationSource::new();
        drop(source);
        tokio::time::timeout(Duration::from_secs(1), token.cancelled())
            .await
            .expect("released");
    }
}
