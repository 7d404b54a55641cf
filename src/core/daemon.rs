use crate::core::{Block, BlockAssembler};
use crate::error::{LedgerError, Result};
use crate::storage::LedgerStore;
use log::{error, info};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonState {
    Stopped,
    Running,
}

struct TimerHandle {
    stop_tx: Sender<()>,
    thread: JoinHandle<()>,
}

/// Timer-driven block production.
///
/// The timer thread and the on-demand triggers all go through the same
/// `BlockAssembler`, so at most one assembly is ever in flight. A tick that
/// finds an assembly running is dropped; on-demand calls wait their turn.
pub struct MiningDaemon<S: LedgerStore + 'static> {
    assembler: Arc<BlockAssembler<S>>,
    period: Duration,
    timer: Mutex<Option<TimerHandle>>,
}

impl<S: LedgerStore + 'static> MiningDaemon<S> {
    pub fn new(assembler: Arc<BlockAssembler<S>>, period: Duration) -> MiningDaemon<S> {
        MiningDaemon {
            assembler,
            period,
            timer: Mutex::new(None),
        }
    }

    fn timer(&self) -> Result<MutexGuard<'_, Option<TimerHandle>>> {
        self.timer.lock().map_err(|_| {
            error!("Failed to acquire mining daemon lock");
            LedgerError::StorageFailure("daemon lock poisoned".to_string())
        })
    }

    pub fn state(&self) -> DaemonState {
        match self.timer() {
            Ok(timer) if timer.is_some() => DaemonState::Running,
            _ => DaemonState::Stopped,
        }
    }

    /// Starts the timer; does nothing if it is already running
    pub fn start(&self) -> Result<()> {
        let mut timer = self.timer()?;
        if timer.is_some() {
            return Ok(());
        }

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let assembler = self.assembler.clone();
        let period = self.period;
        let thread = thread::spawn(move || loop {
            match stop_rx.recv_timeout(period) {
                Err(RecvTimeoutError::Timeout) => {
                    // Failures end this cycle only; the next tick tries again
                    if let Err(e) = assembler.try_assemble() {
                        error!("Block assembly failed: {e}");
                    }
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        *timer = Some(TimerHandle { stop_tx, thread });
        info!("Mining daemon started, one block every {}s", period.as_secs());
        Ok(())
    }

    /// Stops the timer; does nothing if it is not running. An assembly already
    /// in progress finishes before this returns.
    pub fn stop(&self) -> Result<()> {
        let handle = match self.timer()?.take() {
            Some(handle) => handle,
            None => return Ok(()),
        };
        let _ = handle.stop_tx.send(());
        if handle.thread.join().is_err() {
            error!("Mining daemon thread panicked");
        }
        info!("Mining daemon stopped");
        Ok(())
    }

    /// Assembles a block right away if anything is pending
    pub fn trigger_if_pending(&self) -> Result<Option<Block>> {
        if self.assembler.get_store().list_pending()?.is_empty() {
            return Ok(None);
        }
        self.assembler.assemble().map(Some)
    }

    /// Assembles a block right away, even with an empty pool
    pub fn mine_now(&self) -> Result<Block> {
        self.assembler.assemble()
    }
}

impl<S: LedgerStore + 'static> Drop for MiningDaemon<S> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("Failed to stop mining daemon: {e}");
        }
    }
}
