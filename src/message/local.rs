use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
};

use crossbeam_channel::{Receiver, Sender};
use log::{debug, error};

use super::comm::Communicator;
use crate::error::{Error, Result};

enum Envelope {
    Data {
        epoch: usize,
        source: usize,
        data: Vec<u8>,
    },
    Abort {
        source: usize,
    },
}

/// A communicator connecting worker threads in one process over crossbeam
/// channels. Each endpoint keeps the epoch it is currently in; messages that
/// arrive early, for an epoch the endpoint has not reached yet, are held back
/// until `increment` brings it there.
///
pub struct LocalCommunicator {
    rank: usize,
    peers: Vec<Sender<Envelope>>,
    inbound: Receiver<Envelope>,
    epoch: Cell<usize>,
    buffer: RefCell<HashMap<usize, VecDeque<Vec<u8>>>>,
}

impl LocalCommunicator {
    /// Create a fully connected group of `size` endpoints. Endpoint `n` has
    /// rank `n`; each is meant to be moved onto its own thread.
    pub fn group(size: usize) -> Vec<Self> {
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..size).map(|_| crossbeam_channel::unbounded()).unzip();

        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbound)| Self {
                rank,
                peers: senders.clone(),
                inbound,
                epoch: Cell::new(0),
                buffer: RefCell::new(HashMap::new()),
            })
            .collect()
    }

    /// The epoch this endpoint is currently in.
    pub fn epoch(&self) -> usize {
        self.epoch.get()
    }
}

impl Communicator for LocalCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.peers.len()
    }

    fn send(&self, rank: usize, message: Vec<u8>) -> Result<()> {
        let peer = self
            .peers
            .get(rank)
            .ok_or_else(|| Error::Transport(format!("no worker with rank {}", rank)))?;
        let envelope = Envelope::Data {
            epoch: self.epoch.get(),
            source: self.rank,
            data: message,
        };
        peer.send(envelope)
            .map_err(|_| Error::Transport(format!("worker {} has hung up", rank)))
    }

    fn recv(&self) -> Result<Vec<u8>> {
        let epoch = self.epoch.get();

        if let Some(data) = self.buffer.borrow_mut().get_mut(&epoch).and_then(VecDeque::pop_front) {
            return Ok(data);
        }
        loop {
            let envelope = self
                .inbound
                .recv()
                .map_err(|_| Error::Transport("all peers have hung up".into()))?;

            match envelope {
                Envelope::Abort { source } => return Err(Error::PeerAborted(source)),
                Envelope::Data { epoch: e, data, .. } if e == epoch => return Ok(data),
                Envelope::Data { epoch: e, source, data } if e > epoch => {
                    debug!("[{}] message from {} for a future epoch ({}), buffering", self.rank, source, e);
                    self.buffer.borrow_mut().entry(e).or_default().push_back(data)
                }
                Envelope::Data { epoch: e, source, .. } => {
                    error!("[{}] message from {} for past epoch {} dropped (now {})", self.rank, source, e, epoch)
                }
            }
        }
    }

    fn increment(&self) {
        let epoch = self.epoch.get();
        self.buffer.borrow_mut().remove(&epoch);
        self.epoch.set(epoch + 1)
    }

    fn abort(&self) {
        for (rank, peer) in self.peers.iter().enumerate() {
            if rank != self.rank {
                let _ = peer.send(Envelope::Abort { source: self.rank });
            }
        }
    }
}

impl Drop for LocalCommunicator {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.abort()
        }
    }
}
