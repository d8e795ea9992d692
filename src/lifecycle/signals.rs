//! OS signal handling.
//!
//! # Responsibilities
//! - Subscribe to every signal the process may handle
//! - Name and classify each delivery
//! - Feed the events to the lifecycle controller over a channel
//!
//! # Classification
//! ```text
//! "hangup"                   → Reload    (drain, then start a fresh instance)
//! "interrupt", "terminated"  → Terminate (drain, then exit)
//! anything else              → Ignored   (logged, keep serving)
//! ```
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Classification is by name over a fixed set; no per-platform filtering
//! - Uncatchable (KILL, STOP) and synchronous fault signals (ILL, FPE, SEGV,
//!   BUS, TRAP, SYS) are left with their default disposition

use tokio::sync::mpsc;

/// What a signal asks the process to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalClass {
    /// Drain, then re-exec.
    Reload,
    /// Drain, then exit.
    Terminate,
    /// Log and keep serving.
    Ignored,
}

impl SignalClass {
    pub fn triggers_shutdown(self) -> bool {
        !matches!(self, SignalClass::Ignored)
    }
}

/// Classify a signal by its conventional name.
pub fn classify(name: &str) -> SignalClass {
    match name {
        "hangup" => SignalClass::Reload,
        "interrupt" | "terminated" => SignalClass::Terminate,
        _ => SignalClass::Ignored,
    }
}

/// One delivered signal, consumed by the controller immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalEvent {
    pub raw: i32,
    pub name: &'static str,
    pub class: SignalClass,
}

impl SignalEvent {
    pub fn new(raw: i32, name: &'static str) -> Self {
        Self {
            raw,
            name,
            class: classify(name),
        }
    }
}

impl std::fmt::Display for SignalEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.raw)
    }
}

#[cfg(unix)]
mod unix {
    use nix::sys::signal::Signal;
    use tokio::signal::unix::{signal, SignalKind};
    use tokio::sync::mpsc;

    use super::SignalEvent;

    const UNHANDLED: [Signal; 8] = [
        Signal::SIGKILL,
        Signal::SIGSTOP,
        Signal::SIGILL,
        Signal::SIGFPE,
        Signal::SIGSEGV,
        Signal::SIGBUS,
        Signal::SIGTRAP,
        Signal::SIGSYS,
    ];

    /// Lowercase human-readable description, the name classification works on.
    pub fn describe(signal: Signal) -> &'static str {
        match signal {
            Signal::SIGHUP => "hangup",
            Signal::SIGINT => "interrupt",
            Signal::SIGQUIT => "quit",
            Signal::SIGILL => "illegal instruction",
            Signal::SIGTRAP => "trace/breakpoint trap",
            Signal::SIGABRT => "aborted",
            Signal::SIGBUS => "bus error",
            Signal::SIGFPE => "floating point exception",
            Signal::SIGKILL => "killed",
            Signal::SIGUSR1 => "user defined signal 1",
            Signal::SIGSEGV => "segmentation fault",
            Signal::SIGUSR2 => "user defined signal 2",
            Signal::SIGPIPE => "broken pipe",
            Signal::SIGALRM => "alarm clock",
            Signal::SIGTERM => "terminated",
            Signal::SIGCHLD => "child exited",
            Signal::SIGCONT => "continued",
            Signal::SIGSTOP => "stopped (signal)",
            Signal::SIGTSTP => "stopped",
            Signal::SIGTTIN => "stopped (tty input)",
            Signal::SIGTTOU => "stopped (tty output)",
            Signal::SIGURG => "urgent I/O condition",
            Signal::SIGXCPU => "CPU time limit exceeded",
            Signal::SIGXFSZ => "file size limit exceeded",
            Signal::SIGVTALRM => "virtual timer expired",
            Signal::SIGPROF => "profiling timer expired",
            Signal::SIGWINCH => "window changed",
            Signal::SIGIO => "I/O possible",
            Signal::SIGSYS => "bad system call",
            other => other.as_str(),
        }
    }

    pub fn event(signal: Signal) -> SignalEvent {
        SignalEvent::new(signal as i32, describe(signal))
    }

    pub fn subscribe_all(tx: mpsc::Sender<SignalEvent>) -> std::io::Result<usize> {
        let mut subscribed = 0;

        for sig in Signal::iterator().filter(|s| !UNHANDLED.contains(s)) {
            let mut stream = match signal(SignalKind::from_raw(sig as i32)) {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::debug!(signal = %sig, error = %e, "Signal not subscribable");
                    continue;
                }
            };

            let tx = tx.clone();
            let event = event(sig);
            tokio::spawn(async move {
                while stream.recv().await.is_some() {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
            });
            subscribed += 1;
        }

        if subscribed == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "no signal could be subscribed",
            ));
        }
        Ok(subscribed)
    }
}

#[cfg(unix)]
pub use unix::{describe, event};

/// Subscribe to all handleable signals.
///
/// Returns the receiving end of the event channel. The channel closes only
/// if every forwarding task has stopped.
pub fn subscribe_all() -> std::io::Result<mpsc::Receiver<SignalEvent>> {
    let (tx, rx) = mpsc::channel(16);

    #[cfg(unix)]
    {
        let count = unix::subscribe_all(tx)?;
        tracing::info!(signals = count, "Subscribed to OS signals");
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if tx.send(SignalEvent::new(2, "interrupt")).await.is_err() {
                    break;
                }
            }
        });
        tracing::info!("Subscribed to Ctrl+C");
    }

    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_by_name() {
        assert_eq!(classify("hangup"), SignalClass::Reload);
        assert_eq!(classify("interrupt"), SignalClass::Terminate);
        assert_eq!(classify("terminated"), SignalClass::Terminate);
        assert_eq!(classify("user defined signal 1"), SignalClass::Ignored);
        assert_eq!(classify("window changed"), SignalClass::Ignored);
        assert_eq!(classify("Hangup"), SignalClass::Ignored);
    }

    #[test]
    fn only_reload_and_terminate_shut_down() {
        assert!(SignalClass::Reload.triggers_shutdown());
        assert!(SignalClass::Terminate.triggers_shutdown());
        assert!(!SignalClass::Ignored.triggers_shutdown());
    }

    #[cfg(unix)]
    #[test]
    fn unix_signals_are_named() {
        use nix::sys::signal::Signal;

        assert_eq!(event(Signal::SIGHUP).class, SignalClass::Reload);
        assert_eq!(event(Signal::SIGINT).class, SignalClass::Terminate);
        assert_eq!(event(Signal::SIGTERM).class, SignalClass::Terminate);
        assert_eq!(event(Signal::SIGQUIT).class, SignalClass::Ignored);
        assert_eq!(event(Signal::SIGUSR2).name, "user defined signal 2");
        assert_eq!(event(Signal::SIGTERM).raw, 15);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn delivered_signal_reaches_channel() {
        use nix::sys::signal::{raise, Signal};

        let mut rx = subscribe_all().unwrap();
        raise(Signal::SIGWINCH).unwrap();

        let event = tokio::time::timeout(std::time::Duration::from_secs(2), async {
            loop {
                match rx.recv().await {
                    Some(e) if e.name == "window changed" => return e,
                    Some(_) => continue,
                    None => panic!("signal channel closed"),
                }
            }
        })
        .await
        .expect("SIGWINCH never arrived");

        assert_eq!(event.class, SignalClass::Ignored);
    }
}
