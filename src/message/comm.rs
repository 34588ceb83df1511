use super::util;
use crate::error::Result;

/// Interface for a group of workers that can exchange messages. The
/// underlying transport can in principle be channels between threads, TCP,
/// or a higher level abstraction like MPI.
///
/// Messages are grouped into epochs. Every worker advances its epoch with
/// `increment` at the same points in the program, and a message sent during
/// one epoch is only ever received during the same epoch on the peer, even if
/// the peer is still busy with an earlier one.
///
pub trait Communicator {
    /// Must be implemented to return the rank of this worker within the
    /// communicator.
    fn rank(&self) -> usize;

    /// Must be implemented to return the number of workers in this
    /// communicator.
    fn size(&self) -> usize;

    /// Must be implemented to send a message to a peer, tagged with the
    /// current epoch. This method must return immediately, in other words it
    /// is not allowed to block until a matching receive is posted.
    fn send(&self, rank: usize, message: Vec<u8>) -> Result<()>;

    /// Must be implemented to receive a message sent during the current epoch
    /// by any of the peers. This method is allowed to block until a message
    /// is ready to be received.
    fn recv(&self) -> Result<Vec<u8>>;

    /// Must be implemented to close the current epoch and open the next one.
    fn increment(&self);

    /// Tell the peers this worker is giving up, so that none of them wait
    /// forever on a message it will never send.
    fn abort(&self) {}

    /// Return whether this is the rank-0 worker, which does the reporting.
    fn is_boss(&self) -> bool {
        self.rank() == 0
    }

    /// Implements a binomial tree broadcast from the root node. The message
    /// buffer must be `Some` if this is the root node, and it must be `None`
    /// otherwise.
    ///
    fn broadcast(&self, value: Option<Vec<u8>>) -> Result<Vec<u8>> {
        let r = self.rank();
        let p = self.size();

        let value = match value {
            Some(value) => value,
            None => self.recv()?,
        };
        for level in (0..util::ceil_log2(p)).rev() {
            let one = 1 << level;
            let two = 1 << (level + 1);

            if r % two == 0 && r + one < p {
                self.send(r + one, value.clone())?
            }
        }
        Ok(value)
    }

    /// Implements a binomial tree reduce. All ranks return `None` except for
    /// the root.
    ///
    fn reduce<F>(&self, f: F, mut value: Vec<u8>) -> Result<Option<Vec<u8>>>
    where
        F: Fn(Vec<u8>, Vec<u8>) -> Vec<u8>,
    {
        let r = self.rank();
        let p = self.size();

        for level in 0..util::ceil_log2(p) {
            let one = 1 << level;
            let two = 1 << (level + 1);

            if r % two == 0 {
                if r + one < p {
                    value = f(value, self.recv()?)
                }
            } else {
                self.send(r - one, value)?;
                return Ok(None);
            }
        }
        Ok(Some(value))
    }

    /// Implements an all-reduce (symmetric fold) operation over a commutative
    /// binary operator. The collective occupies an epoch of its own.
    ///
    fn all_reduce<F>(&self, f: F, value: Vec<u8>) -> Result<Vec<u8>>
    where
        F: Fn(Vec<u8>, Vec<u8>) -> Vec<u8>,
    {
        let result = self.broadcast(self.reduce(f, value)?)?;
        self.increment();
        Ok(result)
    }
}

impl<C: Communicator> Communicator for &C {
    fn rank(&self) -> usize {
        (**self).rank()
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn send(&self, rank: usize, message: Vec<u8>) -> Result<()> {
        (**self).send(rank, message)
    }

    fn recv(&self) -> Result<Vec<u8>> {
        (**self).recv()
    }

    fn increment(&self) {
        (**self).increment()
    }

    fn abort(&self) {
        (**self).abort()
    }
}
