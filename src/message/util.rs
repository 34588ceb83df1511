use serde::{de::DeserializeOwned, Serialize};

use super::comm::Communicator;
use crate::error::Result;

/// Compute the log-base-two of the next power of two: 8 -> 3, 9 -> 4.
///
pub fn ceil_log2(x: usize) -> usize {
    let mut n = 0;
    while 1 << n < x {
        n += 1
    }
    n
}

/// All-reduce a serializable value across every worker in the communicator.
/// The values travel as MessagePack, so `f` sees typed values rather than
/// bytes.
///
pub fn all_reduce_value<C, T, F>(comm: &C, value: &T, f: F) -> Result<T>
where
    C: Communicator,
    T: Serialize + DeserializeOwned,
    F: Fn(T, T) -> T,
{
    let combine = |a: Vec<u8>, b: Vec<u8>| {
        let a: Option<T> = rmp_serde::from_slice(&a).ok();
        let b: Option<T> = rmp_serde::from_slice(&b).ok();

        // An undecodable operand leaves an empty buffer, which then fails to
        // decode once the collective completes.
        a.zip(b)
            .and_then(|(a, b)| rmp_serde::to_vec(&f(a, b)).ok())
            .unwrap_or_default()
    };
    let bytes = comm.all_reduce(combine, rmp_serde::to_vec(value)?)?;
    Ok(rmp_serde::from_slice(&bytes)?)
}

#[cfg(test)]
mod test {

    use super::ceil_log2;

    #[test]
    fn ceil_log2_rounds_up() {
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(8), 3);
        assert_eq!(ceil_log2(9), 4);
    }
}
