use tokio::sync::oneshot;

/// A one-shot watch event. Every `*_and_watch` call hands one of these back
/// alongside the data it read; `wait()` resolves the first time the
/// underlying znode changes (or the watch is dropped by the backing
/// implementation, e.g. on session loss), and must be re-armed by calling
/// the `*_and_watch` method again.
pub struct Watch(pub(crate) oneshot::Receiver<()>);

impl Watch {
    pub(crate) fn pair() -> (oneshot::Sender<()>, Watch) {
        let (tx, rx) = oneshot::channel();
        (tx, Watch(rx))
    }

    pub async fn wait(self) {
        let _ = self.0.await;
    }
}
