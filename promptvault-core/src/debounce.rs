//! # Debounce
//!
//! [`Debouncer`] turns a rapidly changing input into an output that only moves once the
//! input has been quiet for a fixed delay. Each `set` restarts the quiet window; values
//! overwritten inside a window are never seen downstream.
//!
//! The timer lives on its own tokio task, so `set` never changes the output
//! synchronously, not even with a zero delay. Dropping the debouncer aborts that task.
//!
//! ```rust
//! use promptvault_core::debounce::Debouncer;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let debouncer = Debouncer::new(String::new(), Duration::from_millis(300));
//! let mut settled = debouncer.subscribe();
//!
//! debouncer.set("r".to_string());
//! debouncer.set("ru".to_string());
//! debouncer.set("rust".to_string());
//!
//! settled.changed().await.unwrap();
//! assert_eq!("rust", settled.borrow().as_str());
//! # }
//! ```

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct Debouncer<T> {
    input: watch::Sender<T>,
    output: watch::Receiver<T>,
    delay: Duration,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Starts the timer task. Must be called from within a tokio runtime.
    pub fn new(initial: T, delay: Duration) -> Self {
        let (input, input_rx) = watch::channel(initial.clone());
        let (output_tx, output) = watch::channel(initial);
        let task = tokio::spawn(run(input_rx, output_tx, delay));

        Self {
            input,
            output,
            delay,
            task,
        }
    }

    /// Replaces the pending input and restarts the quiet window.
    pub fn set(&self, value: T) {
        self.input.send_replace(value);
    }

    /// The latest input, settled or not.
    pub fn pending(&self) -> T {
        self.input.borrow().clone()
    }

    /// The last settled value.
    pub fn current(&self) -> T {
        self.output.borrow().clone()
    }

    /// Receiver that is notified every time a new value settles.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.output.clone()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<T>(mut input: watch::Receiver<T>, output: watch::Sender<T>, delay: Duration)
where
    T: Clone + PartialEq + Send + Sync,
{
    loop {
        if input.changed().await.is_err() {
            return;
        }

        // Keep restarting the window until a full delay passes without input.
        loop {
            tokio::select! {
                _ = tokio::time::sleep(delay) => break,
                changed = input.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }

        let value = input.borrow_and_update().clone();
        output.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}
